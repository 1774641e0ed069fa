//! Lending domain types: policy, copy counts and borrow records.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use libris_shared::LendingConfig;
use libris_shared::types::{BookId, BorrowRecordId, UserId};
use serde::{Deserialize, Serialize};

use super::error::LendingError;

/// Default maximum number of simultaneous active borrows per student.
pub const DEFAULT_MAX_BORROW_LIMIT: u32 = 5;

/// Default loan period in days.
pub const DEFAULT_LOAN_PERIOD_DAYS: u32 = 14;

/// Borrow record status.
///
/// `Borrowed -> Returned` is the only transition; `Returned` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorrowStatus {
    /// The book is out with the student.
    Borrowed,
    /// The book came back.
    Returned,
}

impl BorrowStatus {
    /// Storage and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Borrowed => "borrowed",
            Self::Returned => "returned",
        }
    }
}

impl fmt::Display for BorrowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BorrowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "borrowed" => Ok(Self::Borrowed),
            "returned" => Ok(Self::Returned),
            other => Err(format!("unknown borrow status: {other}")),
        }
    }
}

/// Lending rules that vary per deployment (and per test).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LendingPolicy {
    /// Maximum simultaneous active borrows per student.
    pub max_borrow_limit: u32,
    /// Days from borrow date to due date.
    pub loan_period_days: u32,
}

impl Default for LendingPolicy {
    fn default() -> Self {
        Self {
            max_borrow_limit: DEFAULT_MAX_BORROW_LIMIT,
            loan_period_days: DEFAULT_LOAN_PERIOD_DAYS,
        }
    }
}

impl From<LendingConfig> for LendingPolicy {
    fn from(config: LendingConfig) -> Self {
        Self {
            max_borrow_limit: config.max_borrow_limit,
            loan_period_days: config.loan_period_days,
        }
    }
}

/// A book's `(total, available)` copy pair.
///
/// Always satisfies `0 <= available <= total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyCount {
    total: u32,
    available: u32,
}

impl CopyCount {
    /// Creates a copy count.
    ///
    /// # Errors
    ///
    /// Returns `CopyCountInvariant` if `available > total`.
    pub fn new(total: u32, available: u32) -> Result<Self, LendingError> {
        if available > total {
            return Err(LendingError::CopyCountInvariant {
                total: i64::from(total),
                available: i64::from(available),
            });
        }
        Ok(Self { total, available })
    }

    /// Creates a copy count from signed column values.
    ///
    /// # Errors
    ///
    /// Returns `CopyCountInvariant` if either value is negative or
    /// `available > total`.
    pub fn from_db(total: i32, available: i32) -> Result<Self, LendingError> {
        let invariant = || LendingError::CopyCountInvariant {
            total: i64::from(total),
            available: i64::from(available),
        };
        let total = u32::try_from(total).map_err(|_| invariant())?;
        let available = u32::try_from(available).map_err(|_| invariant())?;
        Self::new(total, available)
    }

    /// Total copies owned.
    #[must_use]
    pub const fn total(self) -> u32 {
        self.total
    }

    /// Copies on the shelf.
    #[must_use]
    pub const fn available(self) -> u32 {
        self.available
    }

    /// Whether at least one copy can be lent.
    #[must_use]
    pub const fn is_available(self) -> bool {
        self.available > 0
    }

    /// Copies currently out on loan.
    #[must_use]
    pub const fn on_loan(self) -> u32 {
        self.total - self.available
    }

    /// Takes one copy off the shelf.
    ///
    /// # Errors
    ///
    /// Returns `NoCopiesAvailable` when the shelf is empty.
    pub fn checkout(self) -> Result<Self, LendingError> {
        if self.available == 0 {
            return Err(LendingError::NoCopiesAvailable);
        }
        Ok(Self {
            total: self.total,
            available: self.available - 1,
        })
    }

    /// Puts one copy back on the shelf.
    ///
    /// # Errors
    ///
    /// Returns `CopyCountInvariant` if every copy is already on the shelf.
    pub fn checkin(self) -> Result<Self, LendingError> {
        if self.available >= self.total {
            return Err(LendingError::CopyCountInvariant {
                total: i64::from(self.total),
                available: i64::from(self.available) + 1,
            });
        }
        Ok(Self {
            total: self.total,
            available: self.available + 1,
        })
    }
}

/// One lending transaction.
///
/// `status == Returned` holds exactly when `return_date` is set, and
/// `due_date >= borrow_date`. Both are enforced by the constructors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BorrowRecord {
    id: BorrowRecordId,
    student_id: UserId,
    book_id: BookId,
    borrow_date: NaiveDate,
    due_date: NaiveDate,
    return_date: Option<NaiveDate>,
    status: BorrowStatus,
}

impl BorrowRecord {
    /// Opens a new active borrow.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDueDate` if `due_date < borrow_date`.
    pub fn open(
        id: BorrowRecordId,
        student_id: UserId,
        book_id: BookId,
        borrow_date: NaiveDate,
        due_date: NaiveDate,
    ) -> Result<Self, LendingError> {
        if due_date < borrow_date {
            return Err(LendingError::InvalidDueDate {
                borrow_date,
                due_date,
            });
        }
        Ok(Self {
            id,
            student_id,
            book_id,
            borrow_date,
            due_date,
            return_date: None,
            status: BorrowStatus::Borrowed,
        })
    }

    /// Rebuilds a record loaded from storage.
    ///
    /// # Errors
    ///
    /// Returns `InconsistentRecord` if the status disagrees with the return
    /// date or the due date precedes the borrow date.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: BorrowRecordId,
        student_id: UserId,
        book_id: BookId,
        borrow_date: NaiveDate,
        due_date: NaiveDate,
        return_date: Option<NaiveDate>,
        status: BorrowStatus,
    ) -> Result<Self, LendingError> {
        let consistent = match status {
            BorrowStatus::Borrowed => return_date.is_none(),
            BorrowStatus::Returned => return_date.is_some(),
        };
        if !consistent || due_date < borrow_date {
            return Err(LendingError::InconsistentRecord(id));
        }
        Ok(Self {
            id,
            student_id,
            book_id,
            borrow_date,
            due_date,
            return_date,
            status,
        })
    }

    /// Record id.
    #[must_use]
    pub const fn id(&self) -> BorrowRecordId {
        self.id
    }

    /// Borrowing student.
    #[must_use]
    pub const fn student_id(&self) -> UserId {
        self.student_id
    }

    /// Borrowed book.
    #[must_use]
    pub const fn book_id(&self) -> BookId {
        self.book_id
    }

    /// Date the book went out.
    #[must_use]
    pub const fn borrow_date(&self) -> NaiveDate {
        self.borrow_date
    }

    /// Date the book is due back.
    #[must_use]
    pub const fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    /// Date the book came back, if it did.
    #[must_use]
    pub const fn return_date(&self) -> Option<NaiveDate> {
        self.return_date
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> BorrowStatus {
        self.status
    }

    /// Whether the record is an active borrow.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == BorrowStatus::Borrowed
    }

    /// Active and past its due date. Never true once returned.
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_active() && today > self.due_date
    }

    /// Days until due; negative when overdue, `None` once returned.
    #[must_use]
    pub fn days_remaining(&self, today: NaiveDate) -> Option<i64> {
        self.is_active()
            .then(|| (self.due_date - today).num_days())
    }

    /// Closes the loan.
    ///
    /// # Errors
    ///
    /// Returns `NotBorrowedOrNotOwner` if the record is already returned.
    pub fn mark_returned(&mut self, today: NaiveDate) -> Result<(), LendingError> {
        if !self.is_active() {
            return Err(LendingError::NotBorrowedOrNotOwner);
        }
        self.status = BorrowStatus::Returned;
        self.return_date = Some(today);
        Ok(())
    }
}
