//! Lending service: borrow, return and review eligibility rules.
//!
//! The service holds no state besides its policy. Persistence layers read the
//! facts it needs (copy counts, active borrows, review history), ask it for a
//! decision, then apply the resulting mutation atomically.

use chrono::{Days, NaiveDate};
use libris_shared::types::{BookId, BorrowRecordId, UserId};

use super::error::LendingError;
use super::types::{BorrowRecord, CopyCount, LendingPolicy};

/// Lending ledger rules, parameterized by a [`LendingPolicy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LendingService {
    policy: LendingPolicy,
}

impl LendingService {
    /// Creates a service with the given policy.
    #[must_use]
    pub const fn new(policy: LendingPolicy) -> Self {
        Self { policy }
    }

    /// The policy in force.
    #[must_use]
    pub const fn policy(&self) -> LendingPolicy {
        self.policy
    }

    /// Checks whether a student may borrow a book.
    ///
    /// Preconditions are evaluated in order and the first failure wins:
    /// 1. a copy is on the shelf
    /// 2. the student does not already hold this book
    /// 3. the student is below the borrow limit
    ///
    /// # Errors
    ///
    /// `NoCopiesAvailable`, `AlreadyBorrowed` or `BorrowLimitExceeded`.
    pub fn check_borrow(
        &self,
        copies: CopyCount,
        already_borrowed: bool,
        active_count: u64,
    ) -> Result<(), LendingError> {
        if !copies.is_available() {
            return Err(LendingError::NoCopiesAvailable);
        }
        if already_borrowed {
            return Err(LendingError::AlreadyBorrowed);
        }
        if active_count >= u64::from(self.policy.max_borrow_limit) {
            return Err(LendingError::BorrowLimitExceeded {
                limit: self.policy.max_borrow_limit,
            });
        }
        Ok(())
    }

    /// Due date for a loan starting `today`.
    #[must_use]
    pub fn due_date(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_add_days(Days::new(u64::from(self.policy.loan_period_days)))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Picks the due date for a loan, honoring an explicit override.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDueDate` if the override precedes `borrow_date`.
    pub fn resolve_due_date(
        &self,
        borrow_date: NaiveDate,
        explicit: Option<NaiveDate>,
    ) -> Result<NaiveDate, LendingError> {
        match explicit {
            Some(due_date) if due_date < borrow_date => Err(LendingError::InvalidDueDate {
                borrow_date,
                due_date,
            }),
            Some(due_date) => Ok(due_date),
            None => Ok(self.due_date(borrow_date)),
        }
    }

    /// Validates a borrow and produces the new record with the updated copy
    /// count. The caller persists both together.
    ///
    /// `due_date` overrides the policy's loan period when given.
    ///
    /// # Errors
    ///
    /// Any error from [`Self::check_borrow`], then `InvalidDueDate` for an
    /// override earlier than `today`.
    #[allow(clippy::too_many_arguments)]
    pub fn open_loan(
        &self,
        id: BorrowRecordId,
        student_id: UserId,
        book_id: BookId,
        copies: CopyCount,
        already_borrowed: bool,
        active_count: u64,
        today: NaiveDate,
        due_date: Option<NaiveDate>,
    ) -> Result<(BorrowRecord, CopyCount), LendingError> {
        self.check_borrow(copies, already_borrowed, active_count)?;
        let due_date = self.resolve_due_date(today, due_date)?;
        let copies = copies.checkout()?;
        let record = BorrowRecord::open(id, student_id, book_id, today, due_date)?;
        Ok((record, copies))
    }

    /// Checks whether `record` may be returned.
    ///
    /// `requester` is the student asking; `None` is the staff path, which
    /// skips the ownership check.
    ///
    /// # Errors
    ///
    /// Returns `NotBorrowedOrNotOwner` if the record is not active, or the
    /// requester does not own it.
    pub fn check_return(
        &self,
        record: &BorrowRecord,
        requester: Option<UserId>,
    ) -> Result<(), LendingError> {
        if !record.is_active() {
            return Err(LendingError::NotBorrowedOrNotOwner);
        }
        match requester {
            Some(student) if student != record.student_id() => {
                Err(LendingError::NotBorrowedOrNotOwner)
            }
            _ => Ok(()),
        }
    }

    /// Validates a return, closes the record and produces the updated copy
    /// count. The caller persists both together.
    ///
    /// # Errors
    ///
    /// `NotBorrowedOrNotOwner`, or `CopyCountInvariant` if the book already
    /// has every copy on the shelf.
    pub fn close_loan(
        &self,
        record: &mut BorrowRecord,
        copies: CopyCount,
        requester: Option<UserId>,
        today: NaiveDate,
    ) -> Result<CopyCount, LendingError> {
        self.check_return(record, requester)?;
        let copies = copies.checkin()?;
        record.mark_returned(today)?;
        Ok(copies)
    }

    /// Checks whether a student may review a book.
    ///
    /// # Errors
    ///
    /// `NoReturnedBorrowFound` if the student never returned a borrow of the
    /// book, otherwise `AlreadyReviewed` if they reviewed it.
    pub fn check_review(
        &self,
        has_returned: bool,
        already_reviewed: bool,
    ) -> Result<(), LendingError> {
        if !has_returned {
            return Err(LendingError::NoReturnedBorrowFound);
        }
        if already_reviewed {
            return Err(LendingError::AlreadyReviewed);
        }
        Ok(())
    }

    /// Boolean form of [`Self::check_review`].
    #[must_use]
    pub fn can_review(&self, has_returned: bool, already_reviewed: bool) -> bool {
        self.check_review(has_returned, already_reviewed).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()
    }

    fn service() -> LendingService {
        LendingService::default()
    }

    fn copies(total: u32, available: u32) -> CopyCount {
        CopyCount::new(total, available).unwrap()
    }

    #[rstest]
    #[case(copies(3, 0), true, 5, LendingError::NoCopiesAvailable)]
    #[case(copies(3, 1), true, 5, LendingError::AlreadyBorrowed)]
    #[case(copies(3, 1), false, 5, LendingError::BorrowLimitExceeded { limit: 5 })]
    fn test_borrow_preconditions_in_order(
        #[case] c: CopyCount,
        #[case] already: bool,
        #[case] active: u64,
        #[case] expected: LendingError,
    ) {
        assert_eq!(service().check_borrow(c, already, active), Err(expected));
    }

    #[test]
    fn test_borrow_below_limit_succeeds() {
        assert!(service().check_borrow(copies(1, 1), false, 4).is_ok());
    }

    #[test]
    fn test_limit_is_configurable() {
        let strict = LendingService::new(LendingPolicy {
            max_borrow_limit: 1,
            loan_period_days: 14,
        });
        assert!(strict.check_borrow(copies(2, 2), false, 0).is_ok());
        assert_eq!(
            strict.check_borrow(copies(2, 2), false, 1),
            Err(LendingError::BorrowLimitExceeded { limit: 1 })
        );
    }

    #[test]
    fn test_due_date_is_loan_period_later() {
        assert_eq!(
            service().due_date(today()),
            NaiveDate::from_ymd_opt(2026, 5, 15).unwrap()
        );
    }

    #[test]
    fn test_explicit_due_date() {
        let s = service();
        let earlier = NaiveDate::from_ymd_opt(2026, 4, 30).unwrap();
        let later = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        assert_eq!(s.resolve_due_date(today(), Some(later)), Ok(later));
        assert_eq!(s.resolve_due_date(today(), Some(today())), Ok(today()));
        assert_eq!(s.resolve_due_date(today(), None), Ok(s.due_date(today())));
        assert!(matches!(
            s.resolve_due_date(today(), Some(earlier)),
            Err(LendingError::InvalidDueDate { .. })
        ));
    }

    #[test]
    fn test_open_and_close_loan() {
        let s = service();
        let student = UserId::new();
        let (mut record, after_borrow) = s
            .open_loan(
                BorrowRecordId::new(),
                student,
                BookId::new(),
                copies(1, 1),
                false,
                0,
                today(),
                None,
            )
            .unwrap();
        assert_eq!(after_borrow.available(), 0);
        assert_eq!(record.borrow_date(), today());
        assert_eq!(record.due_date(), s.due_date(today()));

        let after_return = s
            .close_loan(&mut record, after_borrow, Some(student), today())
            .unwrap();
        assert_eq!(after_return.available(), 1);
        assert!(!record.is_active());

        assert_eq!(
            s.close_loan(&mut record, after_return, Some(student), today()),
            Err(LendingError::NotBorrowedOrNotOwner)
        );
    }

    #[test]
    fn test_open_loan_with_explicit_due_date() {
        let s = service();
        let due = NaiveDate::from_ymd_opt(2026, 5, 8).unwrap();
        let (record, _) = s
            .open_loan(
                BorrowRecordId::new(),
                UserId::new(),
                BookId::new(),
                copies(2, 2),
                false,
                0,
                today(),
                Some(due),
            )
            .unwrap();
        assert_eq!(record.due_date(), due);

        let earlier = NaiveDate::from_ymd_opt(2026, 4, 20).unwrap();
        assert!(matches!(
            s.open_loan(
                BorrowRecordId::new(),
                UserId::new(),
                BookId::new(),
                copies(2, 2),
                false,
                0,
                today(),
                Some(earlier),
            ),
            Err(LendingError::InvalidDueDate { .. })
        ));
        // Shelf refusals come first.
        assert_eq!(
            s.open_loan(
                BorrowRecordId::new(),
                UserId::new(),
                BookId::new(),
                copies(2, 0),
                false,
                0,
                today(),
                Some(earlier),
            )
            .map(|_| ()),
            Err(LendingError::NoCopiesAvailable)
        );
    }

    #[test]
    fn test_return_by_other_student_is_rejected_but_staff_may_return() {
        let s = service();
        let (record, _) = s
            .open_loan(
                BorrowRecordId::new(),
                UserId::new(),
                BookId::new(),
                copies(1, 1),
                false,
                0,
                today(),
                None,
            )
            .unwrap();
        assert_eq!(
            s.check_return(&record, Some(UserId::new())),
            Err(LendingError::NotBorrowedOrNotOwner)
        );
        assert!(s.check_return(&record, None).is_ok());
    }

    #[rstest]
    #[case(false, false, Err(LendingError::NoReturnedBorrowFound))]
    #[case(false, true, Err(LendingError::NoReturnedBorrowFound))]
    #[case(true, true, Err(LendingError::AlreadyReviewed))]
    #[case(true, false, Ok(()))]
    fn test_review_gate(
        #[case] has_returned: bool,
        #[case] already_reviewed: bool,
        #[case] expected: Result<(), LendingError>,
    ) {
        assert_eq!(service().check_review(has_returned, already_reviewed), expected);
        assert_eq!(
            service().can_review(has_returned, already_reviewed),
            expected.is_ok()
        );
    }
}
