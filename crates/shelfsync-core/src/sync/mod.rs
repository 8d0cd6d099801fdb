//! Library state synchronizer
//!
//! The LibrarySynchronizer is responsible for:
//! - Loading the three library tables from a RecordStore into a mirror
//! - Applying mutations remotely first, then to the mirror
//! - Keeping book availability counters in step with loans
//! - Reporting every outcome as a SyncEvent
//!
//! ## Architecture
//!
//! ```text
//!   caller ── add_book / issue_loan / ... ──┐
//!                                           ▼
//!                              ┌──────────────────────┐
//!                              │ LibrarySynchronizer  │
//!                              └──────────────────────┘
//!                                           │
//!         ┌─────────────────────────────────┼──────────────────────────┐
//!         │                                 │                          │
//!         ▼                                 ▼                          ▼
//! ┌──────────────┐                 ┌──────────────┐            ┌─────────────┐
//! │ RecordStore  │                 │    Mirror    │            │   Events    │
//! │ (remote)     │                 │ (local copy) │            │  (notify)   │
//! └──────────────┘                 └──────────────┘            └─────────────┘
//! ```
//!
//! ## Mutation Flow
//!
//! 1. Validate the input (rejections never reach the store)
//! 2. Send the write to the RecordStore
//! 3. On success, apply the returned record to the mirror
//! 4. Emit an event
//!
//! Failures are swallowed: the mirror is left as it was, the error is logged
//! and emitted as [`SyncEvent::MutationFailed`], and the operation returns
//! `None`.

mod events;
mod mirror;
mod stats;

pub use events::{Operation, SyncEvent};
pub use mirror::Mirror;
pub use stats::LibraryStats;

use crate::config::{OverduePolicy, SyncConfig, MAX_LOAN_TERM_DAYS};
use crate::error::{Error, Result};
use crate::model::{
    from_record, from_records, to_record, Book, BookPatch, Loan, LoanInsert, LoanReturn, Member,
    MemberPatch, NewBook, NewMember, RecordId,
};
use crate::traits::{Clock, Condition, Order, RecordStore, Table};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Column holding a book's free-copy counter
const AVAILABLE_COLUMN: &str = "disponivel";

/// Client-side mirror of the library tables, kept in step with a RecordStore
///
/// ## Lifecycle
///
/// 1. Create with [`LibrarySynchronizer::new()`]
/// 2. Load the mirror with [`LibrarySynchronizer::initialize()`]
/// 3. Mutate through the operation methods, read through the accessors
/// 4. Call [`LibrarySynchronizer::refresh()`] to reload from the store
///
/// ## Threading
///
/// The mirror sits behind a `std::sync::RwLock` that is only held for local
/// reads and writes, never across a store round-trip. Operations may be
/// called concurrently but are not serialized against each other: two
/// concurrent issues on the same book both read the same counter.
pub struct LibrarySynchronizer {
    /// Remote tables
    store: Arc<dyn RecordStore>,

    /// Source of "today"
    clock: Arc<dyn Clock>,

    /// Default loan term in days
    loan_term_days: u32,

    /// How overdue loans are counted in stats
    overdue_policy: OverduePolicy,

    /// Conditional decrement before issuing a loan
    availability_guard: bool,

    /// Local copy of the tables
    mirror: RwLock<Mirror>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<SyncEvent>,
}

impl LibrarySynchronizer {
    /// Create a new synchronizer with an empty, not-ready mirror
    ///
    /// # Parameters
    ///
    /// - `store`: Record store holding the remote tables
    /// - `clock`: Source of the current calendar date
    /// - `config`: Synchronizer configuration
    ///
    /// # Returns
    ///
    /// A tuple of (synchronizer, event_receiver) where event_receiver yields
    /// synchronizer events
    pub fn new(
        store: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
        config: SyncConfig,
    ) -> Result<(Self, mpsc::Receiver<SyncEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let synchronizer = Self {
            store,
            clock,
            loan_term_days: config.loan_term_days,
            overdue_policy: config.overdue_policy,
            availability_guard: config.availability_guard,
            mirror: RwLock::new(Mirror::default()),
            event_tx: tx,
        };

        Ok((synchronizer, rx))
    }

    // ---------------------------------------------------------------------
    // Loading
    // ---------------------------------------------------------------------

    /// Load all three tables from the store
    ///
    /// The lists run concurrently. A table that fails to load (or whose
    /// records cannot be decoded) comes up empty; the others are unaffected
    /// and the mirror is marked ready regardless.
    pub async fn initialize(&self) {
        self.write().ready = false;

        let (books, members, loans) = tokio::join!(
            self.load::<Book>(Table::Books, Order::asc("titulo")),
            self.load::<Member>(Table::Members, Order::asc("nome")),
            self.load::<Loan>(Table::Loans, Order::desc("data_emprestimo")),
        );

        let (book_count, member_count, loan_count) = (books.len(), members.len(), loans.len());
        {
            let mut mirror = self.write();
            mirror.books = books;
            mirror.members = members;
            mirror.loans = loans;
            mirror.ready = true;
        }

        info!(
            "Mirror loaded from {}: {} books, {} members, {} loans",
            self.store.store_name(),
            book_count,
            member_count,
            loan_count
        );
        self.emit_event(SyncEvent::Initialized {
            books: book_count,
            members: member_count,
            loans: loan_count,
        });
    }

    /// Reload the mirror from the store
    ///
    /// This is the only recovery path after a degraded load or a partial
    /// mutation failure.
    pub async fn refresh(&self) {
        debug!("Refreshing mirror");
        self.initialize().await;
    }

    async fn load<T: DeserializeOwned>(&self, table: Table, order: Order) -> Vec<T> {
        match self.store.list(table, &order).await {
            Ok(records) => {
                debug!("Listed {} rows from {}", records.len(), table);
                let (entities, skipped) = from_records(table, records);
                if skipped > 0 {
                    warn!("Left {} undecodable rows of {} out of the mirror", skipped, table);
                    self.emit_event(SyncEvent::RowsSkipped { table, skipped });
                }
                entities
            }
            Err(e) => {
                warn!("Failed to load {}, continuing with an empty list: {}", table, e);
                self.emit_event(SyncEvent::LoadDegraded {
                    table,
                    error: e.to_string(),
                });
                Vec::new()
            }
        }
    }

    // ---------------------------------------------------------------------
    // Read accessors
    // ---------------------------------------------------------------------

    /// Whether the initial load has completed
    pub fn is_ready(&self) -> bool {
        self.read().ready
    }

    /// Snapshot of the books
    pub fn books(&self) -> Vec<Book> {
        self.read().books.clone()
    }

    /// Snapshot of the members
    pub fn members(&self) -> Vec<Member> {
        self.read().members.clone()
    }

    /// Snapshot of the loans, most recent first
    pub fn loans(&self) -> Vec<Loan> {
        self.read().loans.clone()
    }

    /// Detached copy of the whole mirror, for the read-side queries
    pub fn snapshot(&self) -> Mirror {
        self.read().clone()
    }

    pub fn find_book(&self, id: &RecordId) -> Option<Book> {
        self.read().book(id).cloned()
    }

    pub fn find_member(&self, id: &RecordId) -> Option<Member> {
        self.read().member(id).cloned()
    }

    pub fn find_loan(&self, id: &RecordId) -> Option<Loan> {
        self.read().loan(id).cloned()
    }

    /// Aggregate the mirror as of today, following the configured overdue policy
    pub fn compute_stats(&self) -> LibraryStats {
        let today = self.clock.today();
        self.read().stats(today, self.overdue_policy)
    }

    /// Current date according to the injected clock
    pub fn today(&self) -> chrono::NaiveDate {
        self.clock.today()
    }

    // ---------------------------------------------------------------------
    // Books
    // ---------------------------------------------------------------------

    /// Catalogue a new book with every copy free
    pub async fn add_book(&self, book: NewBook) -> Option<Book> {
        let result = self.try_add_book(book).await;
        self.settle(Operation::AddBook, result)
    }

    async fn try_add_book(&self, book: NewBook) -> Result<Book> {
        book.validate()?;

        let fields = to_record(Table::Books, &book.into_insert())?;
        let record = self.store.insert(Table::Books, fields).await?;
        let book: Book = from_record(Table::Books, record)?;

        self.write().books.push(book.clone());

        info!("Added book {} '{}'", book.id, book.title);
        self.emit_event(SyncEvent::BookAdded {
            book_id: book.id.clone(),
        });
        Ok(book)
    }

    /// Apply a sparse update to a book
    ///
    /// Only the fields set in `patch` are sent. An empty patch makes no
    /// remote call and returns the mirrored book as is.
    pub async fn edit_book(&self, id: &RecordId, patch: BookPatch) -> Option<Book> {
        let result = self.try_edit_book(id, patch).await;
        self.settle(Operation::EditBook, result).flatten()
    }

    async fn try_edit_book(&self, id: &RecordId, patch: BookPatch) -> Result<Option<Book>> {
        patch.validate()?;
        if patch.is_empty() {
            debug!("Empty patch for book {}, nothing to send", id);
            return Ok(self.find_book(id));
        }

        let fields = to_record(Table::Books, &patch)?;
        let record = self.store.update(Table::Books, id, fields).await?;
        let book: Book = from_record(Table::Books, record)?;

        self.write().replace_book(book.clone());

        info!("Updated book {}", id);
        self.emit_event(SyncEvent::BookUpdated {
            book_id: id.clone(),
        });
        Ok(Some(book))
    }

    /// Delete a book
    ///
    /// Loans referencing the book are kept and their book id is left dangling.
    pub async fn delete_book(&self, id: &RecordId) -> bool {
        let result = self.try_delete_book(id).await;
        self.settle(Operation::DeleteBook, result).is_some()
    }

    async fn try_delete_book(&self, id: &RecordId) -> Result<()> {
        self.store.delete(Table::Books, id).await?;
        self.write().remove_book(id);

        info!("Deleted book {}", id);
        self.emit_event(SyncEvent::BookDeleted {
            book_id: id.clone(),
        });
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Members
    // ---------------------------------------------------------------------

    /// Register a new member, stamped with today's date and marked active
    pub async fn add_member(&self, member: NewMember) -> Option<Member> {
        let result = self.try_add_member(member).await;
        self.settle(Operation::AddMember, result)
    }

    async fn try_add_member(&self, member: NewMember) -> Result<Member> {
        member.validate()?;

        let fields = to_record(Table::Members, &member.into_insert(self.clock.today()))?;
        let record = self.store.insert(Table::Members, fields).await?;
        let member: Member = from_record(Table::Members, record)?;

        self.write().members.push(member.clone());

        info!("Added member {} '{}'", member.id, member.name);
        self.emit_event(SyncEvent::MemberAdded {
            member_id: member.id.clone(),
        });
        Ok(member)
    }

    /// Apply a sparse update to a member
    pub async fn edit_member(&self, id: &RecordId, patch: MemberPatch) -> Option<Member> {
        let result = self.try_edit_member(id, patch).await;
        self.settle(Operation::EditMember, result).flatten()
    }

    async fn try_edit_member(&self, id: &RecordId, patch: MemberPatch) -> Result<Option<Member>> {
        patch.validate()?;
        if patch.is_empty() {
            debug!("Empty patch for member {}, nothing to send", id);
            return Ok(self.find_member(id));
        }

        let fields = to_record(Table::Members, &patch)?;
        let record = self.store.update(Table::Members, id, fields).await?;
        let member: Member = from_record(Table::Members, record)?;

        self.write().replace_member(member.clone());

        info!("Updated member {}", id);
        self.emit_event(SyncEvent::MemberUpdated {
            member_id: id.clone(),
        });
        Ok(Some(member))
    }

    /// Delete a member; their loans keep a dangling member id
    pub async fn delete_member(&self, id: &RecordId) -> bool {
        let result = self.try_delete_member(id).await;
        self.settle(Operation::DeleteMember, result).is_some()
    }

    async fn try_delete_member(&self, id: &RecordId) -> Result<()> {
        self.store.delete(Table::Members, id).await?;
        self.write().remove_member(id);

        info!("Deleted member {}", id);
        self.emit_event(SyncEvent::MemberDeleted {
            member_id: id.clone(),
        });
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Loans
    // ---------------------------------------------------------------------

    /// Lend a copy of a book to a member
    ///
    /// `term_days` defaults to the configured loan term. The loan is dated
    /// today and due `term_days` later.
    ///
    /// Without the availability guard the loan is inserted first and the
    /// book's counter is decremented afterwards from the mirrored value; a
    /// failed decrement does not undo the loan. With the guard, the counter
    /// is decremented conditionally first and the loan is refused when the
    /// store's counter no longer matches the mirror.
    pub async fn issue_loan(
        &self,
        book_id: &RecordId,
        member_id: &RecordId,
        term_days: Option<u32>,
    ) -> Option<Loan> {
        let result = self.try_issue_loan(book_id, member_id, term_days).await;
        self.settle(Operation::IssueLoan, result)
    }

    async fn try_issue_loan(
        &self,
        book_id: &RecordId,
        member_id: &RecordId,
        term_days: Option<u32>,
    ) -> Result<Loan> {
        let term_days = term_days.unwrap_or(self.loan_term_days);
        if term_days > MAX_LOAN_TERM_DAYS {
            return Err(Error::invalid_input(format!(
                "loan term must be at most {} days, got {}",
                MAX_LOAN_TERM_DAYS, term_days
            )));
        }

        let today = self.clock.today();
        let insert = LoanInsert::open(book_id.clone(), member_id.clone(), today, term_days);

        if self.availability_guard {
            self.issue_guarded(insert).await
        } else {
            self.issue_unguarded(insert).await
        }
    }

    async fn issue_unguarded(&self, insert: LoanInsert) -> Result<Loan> {
        let loan = self.insert_loan(&insert).await?;

        match self.find_book(&loan.book_id) {
            Some(book) => {
                if let Err(e) = self.write_available(&book.id, book.available - 1).await {
                    self.report(Operation::AdjustAvailability, &e);
                } else {
                    self.mirror_available(&book.id, -1);
                }
            }
            None => {
                warn!(
                    "Loan {} references book {} missing from the mirror, availability not adjusted",
                    loan.id, loan.book_id
                );
                self.emit_event(SyncEvent::AvailabilityDrift {
                    book_id: loan.book_id.clone(),
                });
            }
        }

        Ok(loan)
    }

    async fn issue_guarded(&self, insert: LoanInsert) -> Result<Loan> {
        let book_id = insert.book_id.clone();
        let book = self
            .find_book(&book_id)
            .ok_or_else(|| Error::not_found(format!("book {} is not in the mirror", book_id)))?;

        if !book.has_free_copy() {
            return Err(self.refuse(&book_id, "no free copy in the mirror"));
        }

        let expected = book.available;
        let taken = self
            .store
            .update_if(
                Table::Books,
                &book_id,
                &[Condition::column_equals(AVAILABLE_COLUMN, expected)],
                available_fields(expected - 1),
            )
            .await?;
        if taken.is_none() {
            return Err(self.refuse(&book_id, "free-copy counter changed in the store"));
        }
        self.mirror_available(&book_id, -1);

        match self.insert_loan(&insert).await {
            Ok(loan) => Ok(loan),
            Err(e) => {
                self.release_copy(&book_id, expected - 1).await;
                Err(e)
            }
        }
    }

    /// Undo a guarded decrement whose loan could not be inserted
    async fn release_copy(&self, book_id: &RecordId, taken_value: i64) {
        let restored = self
            .store
            .update_if(
                Table::Books,
                book_id,
                &[Condition::column_equals(AVAILABLE_COLUMN, taken_value)],
                available_fields(taken_value + 1),
            )
            .await;

        match restored {
            Ok(Some(_)) => {
                debug!("Released reserved copy of book {}", book_id);
                self.mirror_available(book_id, 1);
            }
            Ok(None) => {
                warn!(
                    "Could not release reserved copy of book {}: counter changed meanwhile",
                    book_id
                );
            }
            Err(e) => self.report(Operation::AdjustAvailability, &e),
        }
    }

    fn refuse(&self, book_id: &RecordId, reason: &str) -> Error {
        self.emit_event(SyncEvent::AvailabilityConflict {
            book_id: book_id.clone(),
        });
        Error::conflict(format!("loan of book {} refused: {}", book_id, reason))
    }

    async fn insert_loan(&self, insert: &LoanInsert) -> Result<Loan> {
        let fields = to_record(Table::Loans, insert)?;
        let record = self.store.insert(Table::Loans, fields).await?;
        let loan: Loan = from_record(Table::Loans, record)?;

        self.write().loans.insert(0, loan.clone());

        info!(
            "Issued loan {}: book {} to member {}, due {}",
            loan.id, loan.book_id, loan.member_id, loan.due_date
        );
        self.emit_event(SyncEvent::LoanIssued {
            loan_id: loan.id.clone(),
            book_id: loan.book_id.clone(),
            member_id: loan.member_id.clone(),
            due_date: loan.due_date,
        });
        Ok(loan)
    }

    /// Mark a loan returned today and free its copy
    ///
    /// Returns `None` without touching the store when the loan is unknown or
    /// already returned.
    pub async fn return_loan(&self, loan_id: &RecordId) -> Option<Loan> {
        let result = self.try_return_loan(loan_id).await;
        self.settle(Operation::ReturnLoan, result).flatten()
    }

    async fn try_return_loan(&self, loan_id: &RecordId) -> Result<Option<Loan>> {
        let Some(loan) = self.find_loan(loan_id) else {
            debug!("Loan {} not in the mirror, nothing to return", loan_id);
            return Ok(None);
        };
        if !loan.is_open() {
            debug!("Loan {} already returned", loan_id);
            return Ok(None);
        }

        let update = LoanReturn::on(self.clock.today());
        let fields = to_record(Table::Loans, &update)?;
        self.store.update(Table::Loans, loan_id, fields).await?;

        let returned = {
            let mut mirror = self.write();
            mirror.loan_mut(loan_id).map(|slot| {
                slot.returned_on = Some(update.returned_on);
                slot.status = update.status;
                slot.clone()
            })
        }
        .unwrap_or_else(|| Loan {
            returned_on: Some(update.returned_on),
            status: update.status,
            ..loan.clone()
        });

        info!("Returned loan {} (book {})", loan_id, loan.book_id);
        self.emit_event(SyncEvent::LoanReturned {
            loan_id: loan_id.clone(),
            book_id: loan.book_id.clone(),
        });

        match self.find_book(&loan.book_id) {
            Some(book) => {
                if let Err(e) = self.write_available(&book.id, book.available + 1).await {
                    self.report(Operation::AdjustAvailability, &e);
                } else {
                    self.mirror_available(&book.id, 1);
                }
            }
            None => {
                warn!(
                    "Returned loan {} references book {} missing from the mirror",
                    loan_id, loan.book_id
                );
                self.emit_event(SyncEvent::AvailabilityDrift {
                    book_id: loan.book_id.clone(),
                });
            }
        }

        Ok(Some(returned))
    }

    // ---------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------

    async fn write_available(&self, book_id: &RecordId, available: i64) -> Result<()> {
        self.store
            .update(Table::Books, book_id, available_fields(available))
            .await?;
        Ok(())
    }

    fn mirror_available(&self, book_id: &RecordId, delta: i64) {
        let available = self.write().adjust_available(book_id, delta);
        if let Some(available) = available {
            debug!("Book {} now has {} free copies", book_id, available);
            self.emit_event(SyncEvent::AvailabilityChanged {
                book_id: book_id.clone(),
                available,
            });
        }
    }

    /// Apply the swallow policy to an operation result
    fn settle<T>(&self, operation: Operation, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.report(operation, &e);
                None
            }
        }
    }

    fn report(&self, operation: Operation, error: &Error) {
        if error.is_rejection() {
            warn!("{} rejected: {}", operation, error);
        } else {
            error!("{} failed: {}", operation, error);
        }
        self.emit_event(SyncEvent::MutationFailed {
            operation,
            error: error.to_string(),
        });
    }

    fn read(&self) -> RwLockReadGuard<'_, Mirror> {
        self.mirror.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Mirror> {
        self.mirror.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Emit a synchronizer event
    fn emit_event(&self, event: SyncEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // Nobody is listening
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}

fn available_fields(available: i64) -> crate::traits::Record {
    let mut fields = crate::traits::Record::new();
    fields.insert(AVAILABLE_COLUMN.to_string(), json!(available));
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRecordStore;
    use crate::traits::FixedClock;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn synchronizer(
        store: &MemoryRecordStore,
        config: SyncConfig,
    ) -> (LibrarySynchronizer, mpsc::Receiver<SyncEvent>) {
        let clock = Arc::new(FixedClock::new(date(2024, 1, 1)));
        LibrarySynchronizer::new(Arc::new(store.clone()), clock, config).unwrap()
    }

    #[test]
    fn test_sync_event_clone() {
        let event = SyncEvent::LoanIssued {
            loan_id: RecordId::Int(1),
            book_id: RecordId::Int(2),
            member_id: RecordId::Int(3),
            due_date: date(2024, 1, 15),
        };

        assert_eq!(event.clone(), event);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let store = Arc::new(MemoryRecordStore::new());
        let clock = Arc::new(FixedClock::new(date(2024, 1, 1)));
        let config = SyncConfig::new().with_loan_term_days(0);

        assert!(LibrarySynchronizer::new(store, clock, config).is_err());
    }

    #[tokio::test]
    async fn test_not_ready_until_initialized() {
        let store = MemoryRecordStore::new();
        let (sync, mut events) = synchronizer(&store, SyncConfig::new());

        assert!(!sync.is_ready());
        sync.initialize().await;
        assert!(sync.is_ready());

        assert_eq!(
            events.recv().await,
            Some(SyncEvent::Initialized {
                books: 0,
                members: 0,
                loans: 0
            })
        );
    }

    #[tokio::test]
    async fn test_rejected_book_never_reaches_store() {
        let store = MemoryRecordStore::new();
        let (sync, mut events) = synchronizer(&store, SyncConfig::new());
        sync.initialize().await;
        let _ = events.recv().await;

        assert!(sync.add_book(NewBook::new("  ", "Machado", 1)).await.is_none());
        assert!(sync.add_book(NewBook::new("Helena", "Machado", 0)).await.is_none());
        assert_eq!(store.len(Table::Books).await, 0);

        assert!(matches!(
            events.recv().await,
            Some(SyncEvent::MutationFailed {
                operation: Operation::AddBook,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_issue_uses_configured_term() {
        let store = MemoryRecordStore::new();
        let config = SyncConfig::new().with_loan_term_days(7);
        let (sync, _events) = synchronizer(&store, config);
        sync.initialize().await;

        let book = sync.add_book(NewBook::new("Iracema", "Alencar", 1)).await.unwrap();
        let member = sync.add_member(NewMember::new("Ana")).await.unwrap();

        let loan = sync.issue_loan(&book.id, &member.id, None).await.unwrap();
        assert_eq!(loan.due_date, date(2024, 1, 8));

        let too_long = sync
            .issue_loan(&book.id, &member.id, Some(MAX_LOAN_TERM_DAYS + 1))
            .await;
        assert!(too_long.is_none());
    }

    #[tokio::test]
    async fn test_empty_patch_sends_nothing() {
        let store = MemoryRecordStore::new();
        let (sync, _events) = synchronizer(&store, SyncConfig::new());
        sync.initialize().await;

        let book = sync.add_book(NewBook::new("Iracema", "Alencar", 1)).await.unwrap();
        store.set_failing(Table::Books, true).await;

        // A real update would fail now; the empty patch never gets there.
        let unchanged = sync.edit_book(&book.id, BookPatch::default()).await;
        assert_eq!(unchanged, Some(book));
    }
}
