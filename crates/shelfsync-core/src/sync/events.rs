//! Events emitted by the synchronizer

use chrono::NaiveDate;

use crate::model::RecordId;
use crate::traits::Table;

/// Mutation operations, as named in events and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    AddBook,
    EditBook,
    DeleteBook,
    AddMember,
    EditMember,
    DeleteMember,
    IssueLoan,
    ReturnLoan,
    /// The follow-up write to a book's free-copy counter
    AdjustAvailability,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operation::AddBook => "add_book",
            Operation::EditBook => "edit_book",
            Operation::DeleteBook => "delete_book",
            Operation::AddMember => "add_member",
            Operation::EditMember => "edit_member",
            Operation::DeleteMember => "delete_member",
            Operation::IssueLoan => "issue_loan",
            Operation::ReturnLoan => "return_loan",
            Operation::AdjustAvailability => "adjust_availability",
        };
        f.write_str(name)
    }
}

/// Events emitted by the LibrarySynchronizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Initial load (or refresh) finished
    Initialized {
        books: usize,
        members: usize,
        loans: usize,
    },

    /// A table could not be listed and was loaded as empty
    LoadDegraded {
        table: Table,
        error: String,
    },

    /// Some listed rows did not fit the entity shape and were left out
    RowsSkipped {
        table: Table,
        skipped: usize,
    },

    BookAdded {
        book_id: RecordId,
    },

    BookUpdated {
        book_id: RecordId,
    },

    BookDeleted {
        book_id: RecordId,
    },

    MemberAdded {
        member_id: RecordId,
    },

    MemberUpdated {
        member_id: RecordId,
    },

    MemberDeleted {
        member_id: RecordId,
    },

    LoanIssued {
        loan_id: RecordId,
        book_id: RecordId,
        member_id: RecordId,
        due_date: NaiveDate,
    },

    LoanReturned {
        loan_id: RecordId,
        book_id: RecordId,
    },

    /// A book's free-copy counter was written
    AvailabilityChanged {
        book_id: RecordId,
        available: i64,
    },

    /// The loaned book is not in the mirror; its counter was left alone
    AvailabilityDrift {
        book_id: RecordId,
    },

    /// The availability guard refused a loan
    AvailabilityConflict {
        book_id: RecordId,
    },

    /// A mutation (or one of its steps) failed and was swallowed
    MutationFailed {
        operation: Operation,
        error: String,
    },
}
