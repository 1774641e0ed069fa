//! Property-based tests for LendingService.
//!
//! A small in-memory library is driven by random borrow/return sequences and
//! checked against the lending invariants after every step:
//! - `0 <= available <= total` for every book
//! - at most one active borrow per (student, book)
//! - no student above the borrow limit
//! - `available == total - active borrows` per book

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use proptest::prelude::*;

use super::error::LendingError;
use super::service::LendingService;
use super::types::{BorrowRecord, CopyCount, LendingPolicy};
use libris_shared::types::{BookId, BorrowRecordId, UserId};

const STUDENTS: usize = 4;
const BOOKS: usize = 3;

#[derive(Debug, Clone)]
enum Op {
    Borrow { student: usize, book: usize },
    Return { student: usize, book: usize, as_staff: bool },
    NextDay,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..STUDENTS, 0..BOOKS).prop_map(|(student, book)| Op::Borrow { student, book }),
        3 => (0..STUDENTS, 0..BOOKS, any::<bool>())
            .prop_map(|(student, book, as_staff)| Op::Return { student, book, as_staff }),
        1 => Just(Op::NextDay),
    ]
}

struct Library {
    service: LendingService,
    students: Vec<UserId>,
    books: Vec<BookId>,
    copies: Vec<CopyCount>,
    records: Vec<BorrowRecord>,
    today: NaiveDate,
}

impl Library {
    fn new(policy: LendingPolicy, totals: &[u32]) -> Self {
        Self {
            service: LendingService::new(policy),
            students: (0..STUDENTS).map(|_| UserId::new()).collect(),
            books: totals.iter().map(|_| BookId::new()).collect(),
            copies: totals
                .iter()
                .map(|&t| CopyCount::new(t, t).unwrap())
                .collect(),
            records: Vec::new(),
            today: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        }
    }

    fn active_index(&self, student: usize, book: usize) -> Option<usize> {
        self.records.iter().position(|r| {
            r.is_active() && r.student_id() == self.students[student] && r.book_id() == self.books[book]
        })
    }

    fn active_count(&self, student: usize) -> u64 {
        self.records
            .iter()
            .filter(|r| r.is_active() && r.student_id() == self.students[student])
            .count() as u64
    }

    fn borrow(&mut self, student: usize, book: usize) -> Result<(), LendingError> {
        let (record, copies) = self.service.open_loan(
            BorrowRecordId::new(),
            self.students[student],
            self.books[book],
            self.copies[book],
            self.active_index(student, book).is_some(),
            self.active_count(student),
            self.today,
            None,
        )?;
        self.copies[book] = copies;
        self.records.push(record);
        Ok(())
    }

    fn return_book(&mut self, student: usize, book: usize, as_staff: bool) -> Result<(), LendingError> {
        let Some(index) = self.active_index(student, book) else {
            return Err(LendingError::NotBorrowedOrNotOwner);
        };
        let requester = (!as_staff).then(|| self.students[student]);
        let today = self.today;
        let copies = self.service.close_loan(
            &mut self.records[index],
            self.copies[book],
            requester,
            today,
        )?;
        self.copies[book] = copies;
        Ok(())
    }

    fn apply(&mut self, op: &Op) {
        match *op {
            Op::Borrow { student, book } => {
                let _ = self.borrow(student, book);
            }
            Op::Return { student, book, as_staff } => {
                let _ = self.return_book(student, book, as_staff);
            }
            Op::NextDay => {
                self.today = self.today.checked_add_days(Days::new(1)).unwrap();
            }
        }
    }

    fn assert_invariants(&self) {
        let limit = u64::from(self.service.policy().max_borrow_limit);
        for (b, copies) in self.copies.iter().enumerate() {
            assert!(copies.available() <= copies.total());
            let active = self
                .records
                .iter()
                .filter(|r| r.is_active() && r.book_id() == self.books[b])
                .count();
            assert_eq!(copies.on_loan() as usize, active);
        }

        let mut pairs: HashMap<(UserId, BookId), usize> = HashMap::new();
        for r in self.records.iter().filter(|r| r.is_active()) {
            *pairs.entry((r.student_id(), r.book_id())).or_default() += 1;
        }
        assert!(pairs.values().all(|&n| n <= 1));

        for s in 0..STUDENTS {
            assert!(self.active_count(s) <= limit);
        }
    }
}

fn totals_strategy() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(0u32..4, BOOKS)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Random operation sequences never break the ledger invariants.
    #[test]
    fn prop_invariants_hold_under_random_operations(
        totals in totals_strategy(),
        limit in 1u32..4,
        ops in prop::collection::vec(op_strategy(), 0..60),
    ) {
        let policy = LendingPolicy { max_borrow_limit: limit, loan_period_days: 14 };
        let mut library = Library::new(policy, &totals);
        for op in &ops {
            library.apply(op);
            library.assert_invariants();
        }
    }

    /// N borrows followed by N returns restore the shelf.
    #[test]
    fn prop_borrow_return_symmetry(total in 1u32..10, n_seed in 0u32..10) {
        let n = n_seed.min(total) as usize;
        let service = LendingService::default();
        let book = BookId::new();
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let original = CopyCount::new(total, total).unwrap();

        let mut copies = original;
        let mut records = Vec::new();
        for _ in 0..n {
            let before = copies.available();
            let (record, after) = service
                .open_loan(BorrowRecordId::new(), UserId::new(), book, copies, false, 0, today, None)
                .unwrap();
            prop_assert_eq!(after.available(), before - 1);
            copies = after;
            records.push(record);
        }
        for record in &mut records {
            let before = copies.available();
            copies = service.close_loan(record, copies, None, today).unwrap();
            prop_assert_eq!(copies.available(), before + 1);
        }
        prop_assert_eq!(copies, original);
    }

    /// Overdue exactly when active and past due; never once returned.
    #[test]
    fn prop_overdue_semantics(period in 0u32..30, offset in -40i64..80, late in 0u64..60) {
        let service = LendingService::new(LendingPolicy { max_borrow_limit: 5, loan_period_days: period });
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let (mut record, copies) = service
            .open_loan(BorrowRecordId::new(), UserId::new(), BookId::new(),
                CopyCount::new(1, 1).unwrap(), false, 0, start, None)
            .unwrap();
        let today = start + chrono::Duration::days(offset);

        prop_assert_eq!(record.is_overdue(today), today > record.due_date());
        let remaining = record.days_remaining(today).unwrap();
        prop_assert_eq!(remaining, i64::from(period) - offset);
        prop_assert_eq!(record.is_overdue(today), remaining < 0);

        let returned_on = record.due_date().checked_add_days(Days::new(late)).unwrap();
        service.close_loan(&mut record, copies, None, returned_on).unwrap();
        prop_assert!(!record.is_overdue(today));
        prop_assert!(!record.is_overdue(returned_on + chrono::Duration::days(365)));
        prop_assert_eq!(record.days_remaining(today), None);
    }

    /// Review eligibility: false before a return, true after, false after a review.
    #[test]
    fn prop_review_eligibility_lifecycle(borrows in 1usize..4) {
        let service = LendingService::default();
        let student = UserId::new();
        let book = BookId::new();
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let mut copies = CopyCount::new(1, 1).unwrap();
        let mut has_returned = false;
        let mut reviewed = false;

        for _ in 0..borrows {
            let (mut record, out) = service
                .open_loan(BorrowRecordId::new(), student, book, copies, false, 0, today, None)
                .unwrap();
            prop_assert_eq!(service.can_review(has_returned, reviewed), has_returned && !reviewed);
            copies = service.close_loan(&mut record, out, Some(student), today).unwrap();
            has_returned = true;
            prop_assert_eq!(service.can_review(has_returned, reviewed), !reviewed);
            if !reviewed {
                service.check_review(has_returned, reviewed).unwrap();
                reviewed = true;
            }
            prop_assert_eq!(
                service.check_review(has_returned, reviewed),
                Err(LendingError::AlreadyReviewed)
            );
        }
    }
}

#[test]
fn single_copy_scenario() {
    let policy = LendingPolicy::default();
    let mut library = Library::new(policy, &[1, 0, 0]);

    library.borrow(0, 0).unwrap();
    assert_eq!(library.copies[0].available(), 0);
    let due = library.records[0].due_date();
    assert_eq!((due - library.today).num_days(), 14);

    assert_eq!(library.borrow(1, 0), Err(LendingError::NoCopiesAvailable));

    library.return_book(0, 0, false).unwrap();
    assert_eq!(library.copies[0].available(), 1);
    assert!(!library.records[0].is_active());

    library.borrow(1, 0).unwrap();
    assert_eq!(library.copies[0].available(), 0);
    library.assert_invariants();
}

#[test]
fn sixth_borrow_exceeds_default_limit() {
    let service = LendingService::default();
    let result = service.check_borrow(CopyCount::new(3, 3).unwrap(), false, 5);
    assert_eq!(result, Err(LendingError::BorrowLimitExceeded { limit: 5 }));
}
