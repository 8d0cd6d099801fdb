// # Memory Record Store
//
// In-memory implementation of RecordStore.
//
// ## Purpose
//
// Provides a simple, fast record store that doesn't persist across restarts.
// Useful for testing, demos, and as the reference for backend semantics:
// sequential integer ids, sparse updates, atomic conditional updates.
//
// ## Failure Injection
//
// Individual tables can be switched to failing mode, in which every call
// against them returns a store error. Tests use this to exercise the
// synchronizer's silent-degradation paths.

use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use serde_json::Value;

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::model::RecordId;
use crate::traits::{Condition, Order, Record, RecordStore, RecordStoreFactory, Table};

/// In-memory record store implementation
///
/// All tables live in one map protected by a RwLock. Clones share the same
/// tables, so a test can keep a handle while the synchronizer owns another.
///
/// # Example
///
/// ```rust,no_run
/// use shelfsync_core::store::MemoryRecordStore;
/// use shelfsync_core::traits::{Order, RecordStore, Table};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryRecordStore::new();
///
///     let mut row = serde_json::Map::new();
///     row.insert("titulo".into(), "Dom Casmurro".into());
///     let inserted = store.insert(Table::Books, row).await?;
///     assert_eq!(inserted["id"], 1);
///
///     let rows = store.list(Table::Books, &Order::asc("titulo")).await?;
///     assert_eq!(rows.len(), 1);
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    inner: Arc<RwLock<MemoryTables>>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryTables {
    pub(crate) rows: HashMap<Table, Vec<Record>>,
    pub(crate) next_id: i64,
    failing: HashSet<Table>,
}

impl MemoryRecordStore {
    /// Create a new empty memory record store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert rows directly, bypassing failure injection
    ///
    /// Rows without an `id` get the next sequential id.
    pub async fn seed(&self, table: Table, rows: impl IntoIterator<Item = Record>) {
        let mut guard = self.inner.write().await;
        for row in rows {
            guard.insert_row(table, row);
        }
    }

    /// Snapshot of a table in insertion order
    pub async fn rows(&self, table: Table) -> Vec<Record> {
        let guard = self.inner.read().await;
        guard.rows.get(&table).cloned().unwrap_or_default()
    }

    /// Get a single row by id
    pub async fn row(&self, table: Table, id: &RecordId) -> Option<Record> {
        let guard = self.inner.read().await;
        guard.find(table, id).cloned()
    }

    /// Number of rows in a table
    pub async fn len(&self, table: Table) -> usize {
        let guard = self.inner.read().await;
        guard.rows.get(&table).map_or(0, Vec::len)
    }

    /// Make every call against `table` fail (or stop failing)
    pub async fn set_failing(&self, table: Table, failing: bool) {
        let mut guard = self.inner.write().await;
        if failing {
            guard.failing.insert(table);
        } else {
            guard.failing.remove(&table);
        }
    }

    /// Remove every row from every table
    pub async fn clear(&self) {
        let mut guard = self.inner.write().await;
        guard.rows.clear();
    }
}

impl MemoryTables {
    pub(crate) fn from_rows(rows: HashMap<Table, Vec<Record>>) -> Self {
        let next_id = rows
            .values()
            .flatten()
            .filter_map(|row| row.get("id").and_then(Value::as_i64))
            .max()
            .unwrap_or(0);

        Self {
            rows,
            next_id,
            failing: HashSet::new(),
        }
    }

    fn check(&self, table: Table) -> Result<()> {
        if self.failing.contains(&table) {
            return Err(Error::store(format!("table {} is unavailable", table)));
        }
        Ok(())
    }

    fn find(&self, table: Table, id: &RecordId) -> Option<&Record> {
        self.rows
            .get(&table)?
            .iter()
            .find(|row| RecordId::of(row).as_ref() == Some(id))
    }

    fn find_mut(&mut self, table: Table, id: &RecordId) -> Option<&mut Record> {
        self.rows
            .get_mut(&table)?
            .iter_mut()
            .find(|row| RecordId::of(row).as_ref() == Some(id))
    }

    pub(crate) fn insert_row(&mut self, table: Table, mut row: Record) -> Record {
        match row.get("id").and_then(Value::as_i64) {
            Some(id) => self.next_id = self.next_id.max(id),
            None if !row.contains_key("id") => {
                self.next_id += 1;
                row.insert("id".to_string(), Value::from(self.next_id));
            }
            None => {}
        }
        self.rows.entry(table).or_default().push(row.clone());
        row
    }

    pub(crate) fn list(&self, table: Table, order: &Order) -> Result<Vec<Record>> {
        self.check(table)?;
        let mut rows = self.rows.get(&table).cloned().unwrap_or_default();
        rows.sort_by(|a, b| {
            let ordering = compare_values(a.get(&order.column), b.get(&order.column));
            if order.ascending { ordering } else { ordering.reverse() }
        });
        Ok(rows)
    }

    pub(crate) fn insert(&mut self, table: Table, fields: Record) -> Result<Record> {
        self.check(table)?;
        Ok(self.insert_row(table, fields))
    }

    pub(crate) fn update(&mut self, table: Table, id: &RecordId, fields: Record) -> Result<Record> {
        self.check(table)?;
        let row = self
            .find_mut(table, id)
            .ok_or_else(|| Error::not_found(format!("{}/{}", table, id)))?;
        row.extend(fields);
        Ok(row.clone())
    }

    pub(crate) fn update_if(
        &mut self,
        table: Table,
        id: &RecordId,
        conditions: &[Condition],
        fields: Record,
    ) -> Result<Option<Record>> {
        self.check(table)?;
        let Some(row) = self.find_mut(table, id) else {
            return Ok(None);
        };
        if !conditions.iter().all(|c| c.holds_for(row)) {
            return Ok(None);
        }
        row.extend(fields);
        Ok(Some(row.clone()))
    }

    pub(crate) fn delete(&mut self, table: Table, id: &RecordId) -> Result<()> {
        self.check(table)?;
        if let Some(rows) = self.rows.get_mut(&table) {
            rows.retain(|row| RecordId::of(row).as_ref() != Some(id));
        }
        Ok(())
    }
}

/// Order JSON column values the way a SQL backend would for our columns:
/// numbers numerically, strings lexically (ISO dates sort correctly as
/// strings), nulls and missing values last.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn list(&self, table: Table, order: &Order) -> Result<Vec<Record>> {
        let guard = self.inner.read().await;
        guard.list(table, order)
    }

    async fn insert(&self, table: Table, fields: Record) -> Result<Record> {
        let mut guard = self.inner.write().await;
        guard.insert(table, fields)
    }

    async fn update(&self, table: Table, id: &RecordId, fields: Record) -> Result<Record> {
        let mut guard = self.inner.write().await;
        guard.update(table, id, fields)
    }

    async fn delete(&self, table: Table, id: &RecordId) -> Result<()> {
        let mut guard = self.inner.write().await;
        guard.delete(table, id)
    }

    async fn update_if(
        &self,
        table: Table,
        id: &RecordId,
        conditions: &[Condition],
        fields: Record,
    ) -> Result<Option<Record>> {
        let mut guard = self.inner.write().await;
        guard.update_if(table, id, conditions, fields)
    }

    fn store_name(&self) -> &'static str {
        "memory"
    }
}

/// Factory for creating memory record stores
pub struct MemoryRecordStoreFactory;

#[async_trait]
impl RecordStoreFactory for MemoryRecordStoreFactory {
    async fn create(&self, config: &StoreConfig) -> Result<Arc<dyn RecordStore>> {
        match config {
            StoreConfig::Memory => Ok(Arc::new(MemoryRecordStore::new())),
            _ => Err(Error::config("Invalid config for memory record store")),
        }
    }
}
