//! Read-side queries over a mirror snapshot
//!
//! Everything here is pure: the functions borrow a [`Mirror`] (usually from
//! [`LibrarySynchronizer::snapshot`]) and never touch the store.
//!
//! [`LibrarySynchronizer::snapshot`]: crate::sync::LibrarySynchronizer::snapshot

use chrono::NaiveDate;

use crate::model::{Book, Loan, LoanStatus, Member, RecordId};
use crate::sync::Mirror;

/// Filter on the member active flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl ActiveFilter {
    fn admits(self, member: &Member) -> bool {
        match self {
            ActiveFilter::All => true,
            ActiveFilter::Active => member.active,
            ActiveFilter::Inactive => !member.active,
        }
    }
}

/// Case-insensitive containment; a blank needle matches everything
fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl Mirror {
    /// Books that can be offered for a new loan
    pub fn book_candidates(&self) -> Vec<&Book> {
        self.books.iter().filter(|b| b.has_free_copy()).collect()
    }

    /// Members that can borrow
    pub fn member_candidates(&self) -> Vec<&Member> {
        self.members.iter().filter(|m| m.active).collect()
    }

    /// Search books by title, author or ISBN, optionally within a category
    ///
    /// Title and author match case-insensitively; the ISBN matches as a
    /// plain substring. A blank term matches every book.
    pub fn search_books(&self, term: &str, category: Option<&str>) -> Vec<&Book> {
        let term = term.trim();
        self.books
            .iter()
            .filter(|book| {
                term.is_empty()
                    || contains_folded(&book.title, term)
                    || contains_folded(&book.author, term)
                    || book.isbn.as_deref().is_some_and(|isbn| isbn.contains(term))
            })
            .filter(|book| category.is_none_or(|c| book.category.as_deref() == Some(c)))
            .collect()
    }

    /// Search members by name, membership number or national id
    pub fn search_members(&self, term: &str, filter: ActiveFilter) -> Vec<&Member> {
        let term = term.trim();
        self.members
            .iter()
            .filter(|member| {
                term.is_empty()
                    || contains_folded(&member.name, term)
                    || member
                        .membership_number
                        .as_deref()
                        .is_some_and(|number| contains_folded(number, term))
                    || member
                        .national_id
                        .as_deref()
                        .is_some_and(|id| id.contains(term))
            })
            .filter(|member| filter.admits(member))
            .collect()
    }

    /// Search loans by the title of their book or the name of their member
    ///
    /// References that no longer resolve never match a non-blank term. The
    /// status filter applies to the displayed status as of `today`. Results
    /// come most recent loan date first.
    pub fn search_loans(
        &self,
        term: &str,
        status: Option<LoanStatus>,
        today: NaiveDate,
    ) -> Vec<&Loan> {
        let term = term.trim();
        let mut loans: Vec<&Loan> = self
            .loans
            .iter()
            .filter(|loan| {
                term.is_empty()
                    || self
                        .book(&loan.book_id)
                        .is_some_and(|b| contains_folded(&b.title, term))
                    || self
                        .member(&loan.member_id)
                        .is_some_and(|m| contains_folded(&m.name, term))
            })
            .filter(|loan| status.is_none_or(|s| loan.display_status(today) == s))
            .collect();

        loans.sort_by(|a, b| b.loan_date.cmp(&a.loan_date));
        loans
    }

    /// Loans of a member that are not yet returned
    pub fn open_loans_for_member(&self, member_id: &RecordId) -> usize {
        self.loans
            .iter()
            .filter(|l| &l.member_id == member_id && l.is_open())
            .count()
    }

    /// Every loan a member ever took
    pub fn total_loans_for_member(&self, member_id: &RecordId) -> usize {
        self.loans
            .iter()
            .filter(|l| &l.member_id == member_id)
            .count()
    }

    /// Books with the most copies out, highest first
    ///
    /// Ties come out in reverse mirror order (a stable ascending sort, reversed).
    pub fn most_borrowed(&self, limit: usize) -> Vec<&Book> {
        let mut books: Vec<&Book> = self.books.iter().collect();
        books.sort_by_key(|book| book.copies_out());
        books.reverse();
        books.truncate(limit);
        books
    }

    /// The first open loans in mirror order (most recent first after a load)
    pub fn recent_open_loans(&self, limit: usize) -> Vec<&Loan> {
        self.loans.iter().filter(|l| l.is_open()).take(limit).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn book(id: i64, title: &str, author: &str, isbn: Option<&str>, category: &str) -> Book {
        Book {
            id: RecordId::Int(id),
            title: title.to_string(),
            author: author.to_string(),
            isbn: isbn.map(str::to_string),
            category: Some(category.to_string()),
            year: None,
            quantity: 3,
            available: 3,
        }
    }

    fn member(id: i64, name: &str, number: &str, cpf: &str, active: bool) -> Member {
        Member {
            id: RecordId::Int(id),
            name: name.to_string(),
            membership_number: Some(number.to_string()),
            phone: None,
            national_id: Some(cpf.to_string()),
            registered_on: Some(date(2023, 5, 1)),
            active,
        }
    }

    fn loan(id: i64, book: i64, member: i64, loan_date: NaiveDate, status: LoanStatus) -> Loan {
        Loan {
            id: RecordId::Int(id),
            book_id: RecordId::Int(book),
            member_id: RecordId::Int(member),
            loan_date,
            due_date: loan_date + chrono::Duration::days(14),
            returned_on: (status == LoanStatus::Returned).then_some(loan_date),
            status,
        }
    }

    fn library() -> Mirror {
        let mut books = vec![
            book(1, "Dom Casmurro", "Machado de Assis", Some("978-85-01"), "Romance"),
            book(2, "O Cortiço", "Aluísio Azevedo", None, "Romance"),
            book(3, "Os Sertões", "Euclides da Cunha", Some("978-85-77"), "Ensaio"),
        ];
        books[0].available = 1;
        books[1].available = 0;

        Mirror {
            books,
            members: vec![
                member(1, "Ana Souza", "M-001", "123.456.789-00", true),
                member(2, "Bruno Lima", "M-002", "987.654.321-00", false),
                member(3, "Carla Dias", "X-310", "111.222.333-44", true),
            ],
            loans: vec![
                loan(1, 1, 1, date(2024, 1, 2), LoanStatus::Active),
                loan(2, 2, 3, date(2024, 1, 20), LoanStatus::Active),
                loan(3, 1, 1, date(2023, 12, 1), LoanStatus::Returned),
                // book 99 was deleted
                loan(4, 99, 2, date(2024, 1, 10), LoanStatus::Active),
            ],
            ready: true,
        }
    }

    fn ids<T>(items: &[&T], id: impl Fn(&T) -> &RecordId) -> Vec<i64> {
        items
            .iter()
            .map(|item| match id(*item) {
                RecordId::Int(n) => *n,
                RecordId::Text(_) => -1,
            })
            .collect()
    }

    #[test]
    fn candidates_exclude_unavailable_and_inactive() {
        let mirror = library();

        assert_eq!(ids(&mirror.book_candidates(), |b| &b.id), vec![1, 3]);
        assert_eq!(ids(&mirror.member_candidates(), |m| &m.id), vec![1, 3]);
    }

    #[test]
    fn book_search_matches_title_author_and_isbn() {
        let mirror = library();

        assert_eq!(ids(&mirror.search_books("casmurro", None), |b| &b.id), vec![1]);
        assert_eq!(ids(&mirror.search_books("AZEVEDO", None), |b| &b.id), vec![2]);
        assert_eq!(ids(&mirror.search_books("85-77", None), |b| &b.id), vec![3]);
        assert_eq!(
            ids(&mirror.search_books("", Some("Romance")), |b| &b.id),
            vec![1, 2]
        );
        assert!(mirror.search_books("casmurro", Some("Ensaio")).is_empty());
    }

    #[test]
    fn member_search_respects_active_filter() {
        let mirror = library();

        assert_eq!(
            ids(&mirror.search_members("m-00", ActiveFilter::All), |m| &m.id),
            vec![1, 2]
        );
        assert_eq!(
            ids(&mirror.search_members("m-00", ActiveFilter::Inactive), |m| &m.id),
            vec![2]
        );
        assert_eq!(
            ids(&mirror.search_members("111.222", ActiveFilter::Active), |m| &m.id),
            vec![3]
        );
    }

    #[test]
    fn loan_search_sorts_and_skips_dangling_references() {
        let mirror = library();
        let today = date(2024, 1, 25);

        let all = mirror.search_loans("", None, today);
        assert_eq!(ids(&all, |l| &l.id), vec![2, 4, 1, 3]);

        // Loan 4 points at a deleted book; its member is Bruno.
        let by_title = mirror.search_loans("cortiço", None, today);
        assert_eq!(ids(&by_title, |l| &l.id), vec![2]);
        let by_member = mirror.search_loans("bruno", None, today);
        assert_eq!(ids(&by_member, |l| &l.id), vec![4]);
    }

    #[test]
    fn loan_search_filters_on_displayed_status() {
        let mirror = library();
        let today = date(2024, 1, 25);

        let overdue = mirror.search_loans("", Some(LoanStatus::Overdue), today);
        assert_eq!(ids(&overdue, |l| &l.id), vec![4, 1]);

        let returned = mirror.search_loans("ana", Some(LoanStatus::Returned), today);
        assert_eq!(ids(&returned, |l| &l.id), vec![3]);
    }

    #[test]
    fn member_loan_counts() {
        let mirror = library();
        let ana = RecordId::Int(1);

        assert_eq!(mirror.open_loans_for_member(&ana), 1);
        assert_eq!(mirror.total_loans_for_member(&ana), 2);
        assert_eq!(mirror.total_loans_for_member(&RecordId::Int(42)), 0);
    }

    #[test]
    fn dashboard_lists() {
        let mirror = library();

        assert_eq!(ids(&mirror.most_borrowed(2), |b| &b.id), vec![2, 1]);
        assert_eq!(ids(&mirror.recent_open_loans(2), |l| &l.id), vec![1, 2]);
    }

    #[test]
    fn most_borrowed_ties_run_against_mirror_order() {
        let mut mirror = library();
        for book in &mut mirror.books {
            book.available = book.quantity - 1;
        }
        mirror.books[2].available = mirror.books[2].quantity;

        assert_eq!(ids(&mirror.most_borrowed(3), |b| &b.id), vec![2, 1, 3]);
    }
}
