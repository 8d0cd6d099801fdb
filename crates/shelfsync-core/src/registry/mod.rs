//! Plugin-based record store registry
//!
//! The registry allows record store backends to be registered dynamically at
//! runtime, so the binary builds its store from configuration without a
//! hardcoded if-else chain.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shelfsync_core::registry::StoreRegistry;
//! use shelfsync_core::config::StoreConfig;
//!
//! let registry = StoreRegistry::with_builtin();
//! shelfsync_postgrest::register(&registry);
//!
//! let store = registry.create_store(&StoreConfig::Memory).await?;
//! ```

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::store::{FileRecordStoreFactory, MemoryRecordStoreFactory};
use crate::traits::{RecordStore, RecordStoreFactory};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Registry of record store factories keyed by store type name
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct StoreRegistry {
    stores: RwLock<HashMap<String, Arc<dyn RecordStoreFactory>>>,
}

impl StoreRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the stores shipped in this crate (`memory`, `file`)
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        registry.register_store("memory", Box::new(MemoryRecordStoreFactory));
        registry.register_store("file", Box::new(FileRecordStoreFactory));
        registry
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<dyn RecordStoreFactory>>> {
        self.stores.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<dyn RecordStoreFactory>>> {
        self.stores.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a record store factory
    ///
    /// # Parameters
    ///
    /// - `name`: Store type name (e.g., "memory", "postgrest")
    /// - `factory`: Factory object for creating store instances
    pub fn register_store(&self, name: impl Into<String>, factory: Box<dyn RecordStoreFactory>) {
        self.write().insert(name.into(), Arc::from(factory));
    }

    /// Create a record store from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Arc<dyn RecordStore>)`: Created store instance
    /// - `Err(Error)`: If the store type is not registered or creation fails
    pub async fn create_store(&self, config: &StoreConfig) -> Result<Arc<dyn RecordStore>> {
        let store_type = config.type_name();

        // Release the lock before calling async create
        let factory = self
            .read()
            .get(store_type)
            .cloned()
            .ok_or_else(|| Error::config(format!("Unknown store type: {}", store_type)))?;

        factory.create(config).await
    }

    /// List all registered store types
    pub fn list_stores(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Check if a store type is registered
    pub fn has_store(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }
}
