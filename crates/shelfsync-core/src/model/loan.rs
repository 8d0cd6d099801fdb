// # Loan
//
// A checkout of one book by one member. Loans are never edited except to
// transition to returned, and never deleted.
//
// Book and member are referenced by id only. Either may have been deleted
// since; readers resolve the reference and cope with `None`.

use super::RecordId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Persisted loan status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanStatus {
    #[serde(rename = "ativo")]
    Active,
    /// Stored by some legacy rows; the synchronizer never writes it
    #[serde(rename = "atrasado")]
    Overdue,
    #[serde(rename = "devolvido")]
    Returned,
}

impl LoanStatus {
    /// Remote representation
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Active => "ativo",
            LoanStatus::Overdue => "atrasado",
            LoanStatus::Returned => "devolvido",
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A loan as held in the mirror
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    /// Remote row id
    pub id: RecordId,

    #[serde(rename = "livro_id")]
    pub book_id: RecordId,

    #[serde(rename = "membro_id")]
    pub member_id: RecordId,

    #[serde(rename = "data_emprestimo")]
    pub loan_date: NaiveDate,

    #[serde(rename = "data_devolucao_prevista")]
    pub due_date: NaiveDate,

    /// Present iff the loan is returned
    #[serde(rename = "data_devolucao_real", default)]
    pub returned_on: Option<NaiveDate>,

    pub status: LoanStatus,
}

impl Loan {
    /// Not yet returned (stored status active or overdue)
    pub fn is_open(&self) -> bool {
        self.status != LoanStatus::Returned
    }

    /// Open and past its due date on `today`
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_open() && self.due_date < today
    }

    /// Status as shown to a librarian on `today`, derived from the dates
    pub fn display_status(&self, today: NaiveDate) -> LoanStatus {
        if !self.is_open() {
            LoanStatus::Returned
        } else if self.due_date < today {
            LoanStatus::Overdue
        } else {
            LoanStatus::Active
        }
    }

    /// Days past the due date on `today`, zero when not overdue
    pub fn days_overdue(&self, today: NaiveDate) -> i64 {
        if self.is_overdue(today) {
            (today - self.due_date).num_days()
        } else {
            0
        }
    }
}

/// Remote insert layout for a new loan
#[derive(Debug, Serialize)]
pub(crate) struct LoanInsert {
    #[serde(rename = "livro_id")]
    pub book_id: RecordId,
    #[serde(rename = "membro_id")]
    pub member_id: RecordId,
    #[serde(rename = "data_emprestimo")]
    pub loan_date: NaiveDate,
    #[serde(rename = "data_devolucao_prevista")]
    pub due_date: NaiveDate,
    #[serde(rename = "data_devolucao_real")]
    pub returned_on: Option<NaiveDate>,
    pub status: LoanStatus,
}

impl LoanInsert {
    /// A fresh active loan running `term_days` from `today`
    pub fn open(book_id: RecordId, member_id: RecordId, today: NaiveDate, term_days: u32) -> Self {
        Self {
            book_id,
            member_id,
            loan_date: today,
            due_date: today + chrono::Duration::days(i64::from(term_days)),
            returned_on: None,
            status: LoanStatus::Active,
        }
    }
}

/// Remote update layout for returning a loan
#[derive(Debug, Serialize)]
pub(crate) struct LoanReturn {
    #[serde(rename = "data_devolucao_real")]
    pub returned_on: NaiveDate,
    pub status: LoanStatus,
}

impl LoanReturn {
    pub fn on(today: NaiveDate) -> Self {
        Self {
            returned_on: today,
            status: LoanStatus::Returned,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{from_record, to_record};
    use crate::traits::Table;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn loan(due: NaiveDate, status: LoanStatus) -> Loan {
        Loan {
            id: RecordId::Int(1),
            book_id: RecordId::Int(10),
            member_id: RecordId::Int(20),
            loan_date: date(2024, 1, 1),
            due_date: due,
            returned_on: (status == LoanStatus::Returned).then(|| date(2024, 1, 5)),
            status,
        }
    }

    #[test]
    fn due_date_is_loan_date_plus_term() {
        let insert = LoanInsert::open(RecordId::Int(1), RecordId::Int(2), date(2024, 1, 1), 14);
        assert_eq!(insert.due_date, date(2024, 1, 15));

        let record = to_record(Table::Loans, &insert).unwrap();
        assert_eq!(record["livro_id"], json!(1));
        assert_eq!(record["data_emprestimo"], json!("2024-01-01"));
        assert_eq!(record["data_devolucao_prevista"], json!("2024-01-15"));
        assert_eq!(record["data_devolucao_real"], json!(null));
        assert_eq!(record["status"], json!("ativo"));
    }

    #[test]
    fn remote_row_maps_to_loan() {
        let row = json!({
            "id": 5,
            "livro_id": 1,
            "membro_id": 2,
            "data_emprestimo": "2024-01-01",
            "data_devolucao_prevista": "2024-01-15",
            "data_devolucao_real": "2024-01-10",
            "status": "devolvido"
        });
        let loan: Loan = from_record(Table::Loans, row.as_object().cloned().unwrap()).unwrap();

        assert_eq!(loan.status, LoanStatus::Returned);
        assert_eq!(loan.returned_on, Some(date(2024, 1, 10)));
        assert!(!loan.is_open());
    }

    #[test]
    fn unknown_status_does_not_decode() {
        let row = json!({
            "id": 5, "livro_id": 1, "membro_id": 2,
            "data_emprestimo": "2024-01-01", "data_devolucao_prevista": "2024-01-15",
            "status": "perdido"
        });
        let decoded: crate::Result<Loan> =
            from_record(Table::Loans, row.as_object().cloned().unwrap());
        assert!(decoded.is_err());
    }

    #[test]
    fn display_status_is_derived_from_dates() {
        let today = date(2024, 1, 20);

        assert_eq!(
            loan(date(2024, 1, 15), LoanStatus::Active).display_status(today),
            LoanStatus::Overdue
        );
        assert_eq!(
            loan(date(2024, 1, 20), LoanStatus::Active).display_status(today),
            LoanStatus::Active
        );
        assert_eq!(
            loan(date(2024, 1, 25), LoanStatus::Overdue).display_status(today),
            LoanStatus::Active
        );
        assert_eq!(
            loan(date(2024, 1, 15), LoanStatus::Returned).display_status(today),
            LoanStatus::Returned
        );
    }

    #[test]
    fn days_overdue_counts_from_due_date() {
        let today = date(2024, 1, 20);
        assert_eq!(loan(date(2024, 1, 15), LoanStatus::Active).days_overdue(today), 5);
        assert_eq!(loan(date(2024, 1, 25), LoanStatus::Active).days_overdue(today), 0);
        assert_eq!(loan(date(2024, 1, 15), LoanStatus::Returned).days_overdue(today), 0);
    }
}
