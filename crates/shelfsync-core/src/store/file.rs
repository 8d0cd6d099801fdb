// # File Record Store
//
// JSON-file implementation of RecordStore with crash recovery.
//
// ## Purpose
//
// Lets a single librarian run shelfsync without a database server: the
// three tables live in one JSON document that is rewritten after every
// mutation. Query semantics are shared with the memory store.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Corruption detection: Validates JSON on load
// - Automatic backup: Keeps .backup of last known good file
// - Recovery: Falls back to backup if corruption detected
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "tables": {
//     "livros": [{ "id": 1, "titulo": "Dom Casmurro", ... }],
//     "membros": [],
//     "emprestimos": []
//   }
// }
// ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use super::memory::MemoryTables;
use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::model::RecordId;
use crate::traits::{Condition, Order, Record, RecordStore, RecordStoreFactory, Table};

/// Store file format version
const STORE_FILE_VERSION: &str = "1.0";

/// File-backed record store with crash recovery
///
/// # Example
///
/// ```rust,no_run
/// use shelfsync_core::store::FileRecordStore;
/// use shelfsync_core::traits::{Order, RecordStore, Table};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileRecordStore::new("/var/lib/shelfsync/library.json").await?;
///     let books = store.list(Table::Books, &Order::asc("titulo")).await?;
///     println!("{} books", books.len());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileRecordStore {
    path: PathBuf,
    tables: Arc<RwLock<MemoryTables>>,
}

/// Serializable store file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct StoreFileFormat {
    version: String,
    tables: HashMap<String, Vec<Record>>,
}

impl StoreFileFormat {
    fn into_rows(self) -> HashMap<Table, Vec<Record>> {
        let mut tables = self.tables;
        Table::ALL
            .into_iter()
            .map(|table| (table, tables.remove(table.name()).unwrap_or_default()))
            .collect()
    }

    fn from_rows(rows: &HashMap<Table, Vec<Record>>) -> Self {
        Self {
            version: STORE_FILE_VERSION.to_string(),
            tables: Table::ALL
                .into_iter()
                .map(|table| {
                    (
                        table.name().to_string(),
                        rows.get(&table).cloned().unwrap_or_default(),
                    )
                })
                .collect(),
        }
    }
}

impl FileRecordStore {
    /// Create or load a file record store
    ///
    /// This will:
    /// 1. Create parent directories if needed
    /// 2. Try to load the existing store file
    /// 3. If corruption is detected, try to load from backup
    /// 4. If both fail, start with empty tables
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create store directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let rows = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            tables: Arc::new(RwLock::new(MemoryTables::from_rows(rows))),
        })
    }

    /// Load tables from file with automatic recovery
    async fn load_with_recovery(path: &Path) -> Result<HashMap<Table, Vec<Record>>> {
        match Self::load(path).await {
            Ok(rows) => {
                tracing::debug!(
                    "Loaded store file {}: {} rows",
                    path.display(),
                    rows.values().map(Vec::len).sum::<usize>()
                );
                Ok(rows)
            }
            Err(Error::Json(e)) => {
                tracing::warn!(
                    "Store file appears corrupted: {}. Attempting recovery from backup.",
                    e
                );

                let backup_path = Self::backup_path(path);
                if !backup_path.exists() {
                    tracing::warn!("No backup file found. Starting with empty tables.");
                    return Ok(HashMap::new());
                }

                match Self::load(&backup_path).await {
                    Ok(rows) => {
                        tracing::info!("Recovered store from backup {}", backup_path.display());
                        if let Err(restore_err) = fs::copy(&backup_path, path).await {
                            tracing::error!(
                                "Failed to restore store file from backup: {}",
                                restore_err
                            );
                        }
                        Ok(rows)
                    }
                    Err(backup_err) => {
                        tracing::error!(
                            "Backup also unreadable: {}. Starting with empty tables.",
                            backup_err
                        );
                        Ok(HashMap::new())
                    }
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Load tables from file
    async fn load(path: &Path) -> Result<HashMap<Table, Vec<Record>>> {
        if !path.exists() {
            tracing::debug!("Store file does not exist: {}", path.display());
            return Ok(HashMap::new());
        }

        let content = fs::read_to_string(path).await?;
        let file: StoreFileFormat = serde_json::from_str(&content)?;

        if file.version != STORE_FILE_VERSION {
            tracing::warn!(
                "Store file version mismatch: expected {}, got {}. Attempting to load anyway.",
                STORE_FILE_VERSION,
                file.version
            );
        }

        Ok(file.into_rows())
    }

    /// Write the given tables to file atomically
    async fn persist(&self, tables: &MemoryTables) -> Result<()> {
        let json = serde_json::to_string_pretty(&StoreFileFormat::from_rows(&tables.rows))?;

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            file.write_all(json.as_bytes()).await?;
            file.flush().await?;
        }

        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Store written to file: {}", self.path.display());
        Ok(())
    }

    /// Apply a mutation to a copy of the tables and keep it only once it is on disk
    ///
    /// Nothing is written when `changed` says the mutation was a no-op.
    async fn commit<T>(
        &self,
        mutate: impl FnOnce(&mut MemoryTables) -> Result<T>,
        changed: impl FnOnce(&T) -> bool,
    ) -> Result<T> {
        let mut guard = self.tables.write().await;
        let mut staged = guard.clone();
        let value = mutate(&mut staged)?;
        if changed(&value) {
            self.persist(&staged).await?;
            *guard = staged;
        }
        Ok(value)
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }

    /// Path of the store file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn list(&self, table: Table, order: &Order) -> Result<Vec<Record>> {
        let guard = self.tables.read().await;
        guard.list(table, order)
    }

    async fn insert(&self, table: Table, fields: Record) -> Result<Record> {
        self.commit(|tables| tables.insert(table, fields), |_| true).await
    }

    async fn update(&self, table: Table, id: &RecordId, fields: Record) -> Result<Record> {
        self.commit(|tables| tables.update(table, id, fields), |_| true).await
    }

    async fn delete(&self, table: Table, id: &RecordId) -> Result<()> {
        self.commit(|tables| tables.delete(table, id), |_| true).await
    }

    async fn update_if(
        &self,
        table: Table,
        id: &RecordId,
        conditions: &[Condition],
        fields: Record,
    ) -> Result<Option<Record>> {
        self.commit(
            |tables| tables.update_if(table, id, conditions, fields),
            Option::is_some,
        )
        .await
    }

    fn store_name(&self) -> &'static str {
        "file"
    }
}

/// Factory for creating file record stores
pub struct FileRecordStoreFactory;

#[async_trait]
impl RecordStoreFactory for FileRecordStoreFactory {
    async fn create(&self, config: &StoreConfig) -> Result<Arc<dyn RecordStore>> {
        match config {
            StoreConfig::File { path } => Ok(Arc::new(FileRecordStore::new(path).await?)),
            _ => Err(Error::config("Invalid config for file record store")),
        }
    }
}
