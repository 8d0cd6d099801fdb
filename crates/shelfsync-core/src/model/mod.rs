//! Library entities and their wire mapping
//!
//! Remote rows use snake_case Portuguese column names (`livro_id`,
//! `data_emprestimo`, ...). The Rust entities carry English field names and
//! the mapping lives entirely in serde attributes, so every read goes through
//! [`from_record`] and every write through [`to_record`].

pub mod book;
pub mod loan;
pub mod member;

pub use book::{Availability, Book, BookPatch, NewBook};
pub use loan::{Loan, LoanStatus};
pub use member::{Member, MemberPatch, NewMember};

pub(crate) use loan::{LoanInsert, LoanReturn};

use crate::error::{Error, Result};
use crate::traits::{Record, Table};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a remote row
///
/// Backends hand out either integer keys (serial columns) or text keys
/// (uuid columns). The original JSON representation is preserved so ids
/// round-trip to the store unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    /// Integer key
    Int(i64),
    /// Text key (uuid or similar)
    Text(String),
}

impl RecordId {
    /// Read the `id` column of a record
    pub fn of(record: &Record) -> Option<Self> {
        record
            .get("id")
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(id) => write!(f, "{}", id),
            RecordId::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        RecordId::Int(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        RecordId::Text(id.to_string())
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        RecordId::Text(id)
    }
}

/// Map an entity (or patch) to its remote field layout
pub(crate) fn to_record<T: Serialize>(table: Table, value: &T) -> Result<Record> {
    match serde_json::to_value(value)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(Error::mapping(
            table.name(),
            format!("expected a JSON object, got {}", other),
        )),
    }
}

/// Map a remote record to its entity shape
pub(crate) fn from_record<T: DeserializeOwned>(table: Table, record: Record) -> Result<T> {
    serde_json::from_value(serde_json::Value::Object(record))
        .map_err(|e| Error::mapping(table.name(), e.to_string()))
}

/// Map a whole record set, skipping rows that do not fit the entity shape
///
/// Returns the decoded entities and the number of rows skipped.
pub(crate) fn from_records<T: DeserializeOwned>(
    table: Table,
    records: Vec<Record>,
) -> (Vec<T>, usize) {
    let total = records.len();
    let entities: Vec<T> = records
        .into_iter()
        .filter_map(|record| match from_record(table, record) {
            Ok(entity) => Some(entity),
            Err(e) => {
                tracing::warn!("Skipping undecodable row: {}", e);
                None
            }
        })
        .collect();
    let skipped = total - entities.len();
    (entities, skipped)
}

/// Read a nullable column, mapping `null` to the type's default
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_id_keeps_json_shape() {
        let int: RecordId = serde_json::from_value(json!(7)).unwrap();
        let text: RecordId = serde_json::from_value(json!("4f1c")).unwrap();

        assert_eq!(int, RecordId::Int(7));
        assert_eq!(text, RecordId::Text("4f1c".to_string()));
        assert_eq!(serde_json::to_value(&int).unwrap(), json!(7));
        assert_eq!(int.to_string(), "7");
    }

    #[test]
    fn record_id_of_reads_the_id_column() {
        let record = json!({ "id": 12, "titulo": "Dom Casmurro" });
        let record = record.as_object().unwrap();
        assert_eq!(RecordId::of(record), Some(RecordId::Int(12)));

        let no_id = serde_json::Map::new();
        assert_eq!(RecordId::of(&no_id), None);
    }

    #[test]
    fn undecodable_rows_are_skipped_and_counted() {
        let rows = vec![
            json!({ "id": 1, "titulo": "A", "autor": "B", "quantidade": 1, "disponivel": 1 }),
            json!({ "titulo": "no id column" }),
            json!({ "id": 3, "titulo": "C", "quantidade": "three" }),
        ]
        .into_iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect();

        let (books, skipped): (Vec<Book>, usize) = from_records(Table::Books, rows);
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, RecordId::Int(1));
        assert_eq!(skipped, 2);
    }

    #[test]
    fn null_columns_decode_as_defaults() {
        let row = json!({
            "id": 4,
            "titulo": null,
            "autor": "Machado de Assis",
            "quantidade": null,
            "disponivel": null
        });
        let book: Book = from_record(Table::Books, row.as_object().cloned().unwrap()).unwrap();

        assert_eq!(book.title, "");
        assert_eq!(book.quantity, 0);
        assert_eq!(book.available, 0);
    }
}
