// # Record Store Trait
//
// Defines the interface to the remote persistence backend.
//
// ## Purpose
//
// The record store holds the authoritative rows for the three library
// tables. The synchronizer mirrors them in memory and writes every
// mutation through this trait before touching the mirror.
//
// ## Implementations
//
// - In-memory: `MemoryRecordStore` (tests, demos)
// - JSON file: `FileRecordStore` (single-librarian offline use)
// - PostgREST/Supabase: `shelfsync-postgrest` crate
//
// ## Usage
//
// ```rust,ignore
// use shelfsync_core::traits::{Order, RecordStore, Table};
//
// let rows = store.list(Table::Books, &Order::asc("titulo")).await?;
// ```

use async_trait::async_trait;
use serde_json::Value;

use crate::config::StoreConfig;
use crate::model::RecordId;

/// A remote row: column name to JSON value
pub type Record = serde_json::Map<String, Value>;

/// The remote tables mirrored by the synchronizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Books,
    Members,
    Loans,
}

impl Table {
    /// Every table, in load order
    pub const ALL: [Table; 3] = [Table::Books, Table::Members, Table::Loans];

    /// Remote table name
    pub fn name(&self) -> &'static str {
        match self {
            Table::Books => "livros",
            Table::Members => "membros",
            Table::Loans => "emprestimos",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Sort order for a `list` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Remote column to sort by
    pub column: String,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }
}

/// Equality precondition for a conditional update
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Remote column name
    pub column: String,
    /// Value the column must currently hold
    pub equals: Value,
}

impl Condition {
    pub fn column_equals(column: impl Into<String>, equals: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            equals: equals.into(),
        }
    }

    /// Whether `record` satisfies this condition
    pub fn holds_for(&self, record: &Record) -> bool {
        record.get(&self.column) == Some(&self.equals)
    }
}

/// Trait for record store implementations
///
/// Every call is a single request/response round-trip. Implementations must
/// be thread-safe and usable across async tasks.
///
/// # Responsibilities
///
/// ## Allowed
/// - ✅ Perform I/O against their backend
/// - ✅ Assign ids to inserted rows
/// - ✅ Report failures as `Err`
///
/// ## Not Allowed
/// - ❌ Retry failed calls (there is no retry policy)
/// - ❌ Keep business rules (owned by `LibrarySynchronizer`)
/// - ❌ Cache rows beyond what persistence needs (the mirror is owned by `LibrarySynchronizer`)
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// List every row of a table
    ///
    /// # Parameters
    ///
    /// - `table`: The table to read
    /// - `order`: Column and direction to sort by
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Record>)`: All rows, sorted
    /// - `Err(Error)`: Backend error
    async fn list(&self, table: Table, order: &Order) -> Result<Vec<Record>, crate::Error>;

    /// Insert a single row
    ///
    /// # Returns
    ///
    /// - `Ok(Record)`: The inserted row as stored, including its id
    /// - `Err(Error)`: Backend error
    async fn insert(&self, table: Table, fields: Record) -> Result<Record, crate::Error>;

    /// Update the given columns of one row, leaving the others untouched
    ///
    /// # Returns
    ///
    /// - `Ok(Record)`: The full row after the update
    /// - `Err(Error)`: Backend error, or `NotFound` if no row has this id
    async fn update(
        &self,
        table: Table,
        id: &RecordId,
        fields: Record,
    ) -> Result<Record, crate::Error>;

    /// Delete one row
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Deleted
    /// - `Err(Error)`: Backend error
    async fn delete(&self, table: Table, id: &RecordId) -> Result<(), crate::Error>;

    /// Update one row only if every condition holds at the store
    ///
    /// The check and the write must be atomic with respect to other writers
    /// of the same store.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Record))`: Conditions held, row updated
    /// - `Ok(None)`: A condition failed or the row is gone; nothing written
    /// - `Err(Error)`: Backend error, or `Unsupported` for stores without
    ///   conditional writes
    async fn update_if(
        &self,
        table: Table,
        id: &RecordId,
        conditions: &[Condition],
        fields: Record,
    ) -> Result<Option<Record>, crate::Error> {
        let _ = (table, id, conditions, fields);
        Err(crate::Error::unsupported(self.store_name(), "update_if"))
    }

    /// Short name of the backend (for logging)
    fn store_name(&self) -> &'static str;
}

/// Helper trait for constructing record stores from configuration
#[async_trait]
pub trait RecordStoreFactory: Send + Sync {
    /// Create a RecordStore instance from configuration
    ///
    /// # Returns
    ///
    /// A shared RecordStore trait object
    async fn create(
        &self,
        config: &StoreConfig,
    ) -> Result<std::sync::Arc<dyn RecordStore>, crate::Error>;
}
