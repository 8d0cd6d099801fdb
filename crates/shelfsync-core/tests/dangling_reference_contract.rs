//! Architectural Contract Test: Dangling References
//!
//! Loans reference books and members by id only. Deleting either never
//! cascades.
//!
//! Constraints verified:
//! - Deleting a book or member keeps its loans
//! - Lookups through a dangling id return None
//! - Loan search never matches through a dangling reference
//! - Loans against a book missing from the mirror are still recorded
//!
//! If this test fails, deletions may silently erase loan history.

mod common;

use common::*;
use shelfsync_core::traits::Table;
use shelfsync_core::{LoanStatus, RecordId, SyncEvent};
use std::sync::Arc;

const BOOK: i64 = 1;
const MEMBER: i64 = 100;

#[tokio::test]
async fn deleting_a_book_keeps_its_loans() {
    let store = store_with_book(2, 2).await;
    let (sync, mut events) =
        ready_synchronizer(Arc::new(store.clone()), fixed_clock(new_year()), test_config()).await;
    let (book, member) = (RecordId::Int(BOOK), RecordId::Int(MEMBER));

    let loan = sync.issue_loan(&book, &member, None).await.unwrap();
    drain(&mut events);

    assert!(sync.delete_book(&book).await);

    assert!(sync.find_book(&book).is_none());
    assert_eq!(sync.find_loan(&loan.id), Some(loan.clone()));
    assert_eq!(store.len(Table::Loans).await, 1);
    assert!(drain(&mut events).contains(&SyncEvent::BookDeleted { book_id: book.clone() }));

    let snapshot = sync.snapshot();
    assert!(snapshot.book(&loan.book_id).is_none());
    assert!(snapshot.search_loans("casmurro", None, new_year()).is_empty());
    assert_eq!(snapshot.search_loans("ana", None, new_year()).len(), 1);
}

#[tokio::test]
async fn deleting_a_member_keeps_their_loans() {
    let store = store_with_book(2, 2).await;
    let (sync, _events) =
        ready_synchronizer(Arc::new(store), fixed_clock(new_year()), test_config()).await;
    let (book, member) = (RecordId::Int(BOOK), RecordId::Int(MEMBER));

    let loan = sync.issue_loan(&book, &member, None).await.unwrap();
    assert!(sync.delete_member(&member).await);

    assert!(sync.find_member(&member).is_none());
    assert_eq!(sync.snapshot().open_loans_for_member(&member), 1);
    assert!(sync.snapshot().search_loans("ana", None, new_year()).is_empty());
    assert_eq!(sync.find_loan(&loan.id).map(|l| l.member_id), Some(member));
}

#[tokio::test]
async fn returning_a_loan_of_a_deleted_book_still_returns_it() {
    let store = CountingStore::new(store_with_book(2, 2).await);
    let (sync, mut events) =
        ready_synchronizer(Arc::new(store.clone()), fixed_clock(new_year()), test_config()).await;
    let (book, member) = (RecordId::Int(BOOK), RecordId::Int(MEMBER));

    let loan = sync.issue_loan(&book, &member, None).await.unwrap();
    assert!(sync.delete_book(&book).await);
    drain(&mut events);
    let updates = store.update_calls();

    let returned = sync.return_loan(&loan.id).await.expect("return succeeds");

    assert_eq!(returned.status, LoanStatus::Returned);
    assert_eq!(store.update_calls(), updates + 1, "Only the loan row is written");
    assert!(drain(&mut events).contains(&SyncEvent::AvailabilityDrift { book_id: book }));
}

#[tokio::test]
async fn loan_for_unmirrored_book_is_recorded_without_decrement() {
    let store = CountingStore::new(store_with_book(2, 2).await);
    let (sync, mut events) =
        ready_synchronizer(Arc::new(store.clone()), fixed_clock(new_year()), test_config()).await;
    drain(&mut events);

    let ghost = RecordId::Int(999);
    let loan = sync
        .issue_loan(&ghost, &RecordId::Int(MEMBER), None)
        .await
        .expect("loan is still recorded");

    assert_eq!(loan.book_id, ghost);
    assert_eq!(store.insert_calls(), 1);
    assert_eq!(store.update_calls(), 0, "No counter to decrement");
    assert_eq!(stored_available(store.tables(), BOOK).await, Some(2));
    assert!(drain(&mut events).contains(&SyncEvent::AvailabilityDrift { book_id: ghost }));
}
