//! In-memory copy of the three library tables

use crate::model::{Book, Loan, Member, RecordId};

/// The synchronizer's view of the remote tables
///
/// Books and members keep the order they were loaded in (title / name)
/// followed by later additions in insertion order. Loans are kept
/// most-recent-first.
///
/// A `Mirror` handed out by [`LibrarySynchronizer::snapshot`] is a detached
/// copy; the read-side queries in [`crate::query`] run against it.
///
/// [`LibrarySynchronizer::snapshot`]: crate::sync::LibrarySynchronizer::snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mirror {
    pub books: Vec<Book>,
    pub members: Vec<Member>,
    pub loans: Vec<Loan>,
    /// False until the initial load completes
    pub ready: bool,
}

impl Mirror {
    /// Look up a book by id
    pub fn book(&self, id: &RecordId) -> Option<&Book> {
        self.books.iter().find(|b| &b.id == id)
    }

    /// Look up a member by id
    pub fn member(&self, id: &RecordId) -> Option<&Member> {
        self.members.iter().find(|m| &m.id == id)
    }

    /// Look up a loan by id
    pub fn loan(&self, id: &RecordId) -> Option<&Loan> {
        self.loans.iter().find(|l| &l.id == id)
    }

    pub(crate) fn replace_book(&mut self, book: Book) {
        if let Some(slot) = self.books.iter_mut().find(|b| b.id == book.id) {
            *slot = book;
        }
    }

    pub(crate) fn replace_member(&mut self, member: Member) {
        if let Some(slot) = self.members.iter_mut().find(|m| m.id == member.id) {
            *slot = member;
        }
    }

    pub(crate) fn remove_book(&mut self, id: &RecordId) {
        self.books.retain(|b| &b.id != id);
    }

    pub(crate) fn remove_member(&mut self, id: &RecordId) {
        self.members.retain(|m| &m.id != id);
    }

    /// Apply a delta to a book's free-copy counter, uncapped in both directions
    pub(crate) fn adjust_available(&mut self, id: &RecordId, delta: i64) -> Option<i64> {
        let book = self.books.iter_mut().find(|b| &b.id == id)?;
        book.available += delta;
        Some(book.available)
    }

    pub(crate) fn loan_mut(&mut self, id: &RecordId) -> Option<&mut Loan> {
        self.loans.iter_mut().find(|l| &l.id == id)
    }
}
