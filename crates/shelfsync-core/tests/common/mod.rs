//! Test doubles and common utilities for synchronizer contract tests
//!
//! The doubles wrap a real MemoryRecordStore so the tables behave like a
//! backend would, while the tests observe how many round-trips were made.

#![allow(dead_code)]

use chrono::NaiveDate;
use serde_json::{Value, json};
use shelfsync_core::error::Result;
use shelfsync_core::traits::{Condition, Order, Record, RecordStore, Table};
use shelfsync_core::{
    FixedClock, LibrarySynchronizer, MemoryRecordStore, RecordId, SyncConfig, SyncEvent,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;

/// A RecordStore that counts every call before delegating to a memory store
#[derive(Clone)]
pub struct CountingStore {
    inner: MemoryRecordStore,
    list_calls: Arc<AtomicUsize>,
    insert_calls: Arc<AtomicUsize>,
    update_calls: Arc<AtomicUsize>,
    update_if_calls: Arc<AtomicUsize>,
    delete_calls: Arc<AtomicUsize>,
}

impl CountingStore {
    pub fn new(inner: MemoryRecordStore) -> Self {
        Self {
            inner,
            list_calls: Arc::new(AtomicUsize::new(0)),
            insert_calls: Arc::new(AtomicUsize::new(0)),
            update_calls: Arc::new(AtomicUsize::new(0)),
            update_if_calls: Arc::new(AtomicUsize::new(0)),
            delete_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The wrapped tables
    pub fn tables(&self) -> &MemoryRecordStore {
        &self.inner
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn update_if_calls(&self) -> usize {
        self.update_if_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Every write of any kind
    pub fn write_calls(&self) -> usize {
        self.insert_calls() + self.update_calls() + self.update_if_calls() + self.delete_calls()
    }
}

#[async_trait::async_trait]
impl RecordStore for CountingStore {
    async fn list(&self, table: Table, order: &Order) -> Result<Vec<Record>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list(table, order).await
    }

    async fn insert(&self, table: Table, fields: Record) -> Result<Record> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(table, fields).await
    }

    async fn update(&self, table: Table, id: &RecordId, fields: Record) -> Result<Record> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.update(table, id, fields).await
    }

    async fn delete(&self, table: Table, id: &RecordId) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(table, id).await
    }

    async fn update_if(
        &self,
        table: Table,
        id: &RecordId,
        conditions: &[Condition],
        fields: Record,
    ) -> Result<Option<Record>> {
        self.update_if_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.update_if(table, id, conditions, fields).await
    }

    fn store_name(&self) -> &'static str {
        "counting"
    }
}

/// A RecordStore without conditional updates, like a plain REST table API
pub struct UnconditionalStore {
    inner: MemoryRecordStore,
}

impl UnconditionalStore {
    pub fn new(inner: MemoryRecordStore) -> Self {
        Self { inner }
    }
}

#[async_trait::async_trait]
impl RecordStore for UnconditionalStore {
    async fn list(&self, table: Table, order: &Order) -> Result<Vec<Record>> {
        self.inner.list(table, order).await
    }

    async fn insert(&self, table: Table, fields: Record) -> Result<Record> {
        self.inner.insert(table, fields).await
    }

    async fn update(&self, table: Table, id: &RecordId, fields: Record) -> Result<Record> {
        self.inner.update(table, id, fields).await
    }

    async fn delete(&self, table: Table, id: &RecordId) -> Result<()> {
        self.inner.delete(table, id).await
    }

    fn store_name(&self) -> &'static str {
        "unconditional"
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// The date most contract tests run on
pub fn new_year() -> NaiveDate {
    date(2024, 1, 1)
}

pub fn fixed_clock(today: NaiveDate) -> Arc<FixedClock> {
    Arc::new(FixedClock::new(today))
}

/// Configuration with the guard off and a small event channel
pub fn test_config() -> SyncConfig {
    let mut config = SyncConfig::new();
    config.event_channel_capacity = 64;
    config
}

pub fn guarded_config() -> SyncConfig {
    test_config().with_availability_guard(true)
}

pub fn record(value: Value) -> Record {
    value.as_object().cloned().expect("test records are JSON objects")
}

pub fn book_row(id: i64, title: &str, quantity: i64, available: i64) -> Record {
    record(json!({
        "id": id,
        "titulo": title,
        "autor": "Machado de Assis",
        "isbn": null,
        "categoria": "Romance",
        "ano": 1899,
        "quantidade": quantity,
        "disponivel": available,
    }))
}

pub fn member_row(id: i64, name: &str, active: bool) -> Record {
    record(json!({
        "id": id,
        "nome": name,
        "matricula": format!("M-{:03}", id),
        "telefone": null,
        "cpf": null,
        "data_registro": "2023-06-01",
        "ativo": active,
    }))
}

pub fn loan_row(id: i64, book_id: i64, member_id: i64, loan_date: &str, due: &str, status: &str) -> Record {
    let returned = if status == "devolvido" { json!(due) } else { Value::Null };
    record(json!({
        "id": id,
        "livro_id": book_id,
        "membro_id": member_id,
        "data_emprestimo": loan_date,
        "data_devolucao_prevista": due,
        "data_devolucao_real": returned,
        "status": status,
    }))
}

/// A store holding one book (id 1) with the given counters and one active member (id 100)
pub async fn store_with_book(quantity: i64, available: i64) -> MemoryRecordStore {
    let store = MemoryRecordStore::new();
    store
        .seed(Table::Books, vec![book_row(1, "Dom Casmurro", quantity, available)])
        .await;
    store
        .seed(Table::Members, vec![member_row(100, "Ana Souza", true)])
        .await;
    store
}

/// Build and initialize a synchronizer over `store`
pub async fn ready_synchronizer(
    store: Arc<dyn RecordStore>,
    clock: Arc<FixedClock>,
    config: SyncConfig,
) -> (LibrarySynchronizer, mpsc::Receiver<SyncEvent>) {
    let (sync, events) =
        LibrarySynchronizer::new(store, clock, config).expect("synchronizer construction succeeds");
    sync.initialize().await;
    (sync, events)
}

/// Collect every event currently queued
pub fn drain(events: &mut mpsc::Receiver<SyncEvent>) -> Vec<SyncEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

/// Read a book's free-copy counter straight from the store
pub async fn stored_available(store: &MemoryRecordStore, book_id: i64) -> Option<i64> {
    store
        .row(Table::Books, &RecordId::Int(book_id))
        .await
        .and_then(|row| row.get("disponivel").and_then(Value::as_i64))
}
