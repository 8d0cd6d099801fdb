//! Aggregate statistics over the mirror

use chrono::NaiveDate;

use super::Mirror;
use crate::config::OverduePolicy;
use crate::model::LoanStatus;

/// Dashboard totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LibraryStats {
    /// Number of book titles
    pub total_titles: usize,
    /// Sum of copies owned over every title
    pub total_copies: i64,
    /// Titles with at least one free copy
    pub titles_available: usize,
    /// Members with the active flag set
    pub active_members: usize,
    /// Loans not yet returned
    pub open_loans: usize,
    pub overdue_loans: usize,
    pub returned_loans: usize,
}

impl Mirror {
    /// Aggregate the mirror as of `today`
    ///
    /// Under [`OverduePolicy::Derived`] a loan is overdue when it is open
    /// and its due date has passed. Under [`OverduePolicy::Stored`] only
    /// the persisted `atrasado` status counts, whatever the dates say.
    pub fn stats(&self, today: NaiveDate, policy: OverduePolicy) -> LibraryStats {
        let overdue_loans = match policy {
            OverduePolicy::Derived => self.loans.iter().filter(|l| l.is_overdue(today)).count(),
            OverduePolicy::Stored => self
                .loans
                .iter()
                .filter(|l| l.status == LoanStatus::Overdue)
                .count(),
        };

        LibraryStats {
            total_titles: self.books.len(),
            total_copies: self.books.iter().map(|b| b.quantity).sum(),
            titles_available: self.books.iter().filter(|b| b.has_free_copy()).count(),
            active_members: self.members.iter().filter(|m| m.active).count(),
            open_loans: self.loans.iter().filter(|l| l.is_open()).count(),
            overdue_loans,
            returned_loans: self.loans.iter().filter(|l| !l.is_open()).count(),
        }
    }
}
