//! Lending error types.
//!
//! Most variants are expected, recoverable refusals that the caller shows to
//! the user. The last two guard internal invariants and indicate a fault.

use chrono::NaiveDate;
use libris_shared::types::BorrowRecordId;
use thiserror::Error;

/// Errors produced by the lending ledger and the review gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LendingError {
    // ========== Borrow preconditions (checked in this order) ==========
    /// No copy of the book is on the shelf.
    #[error("No copies of this book are currently available")]
    NoCopiesAvailable,

    /// The student already holds an active borrow of this book.
    #[error("This book is already borrowed by the student")]
    AlreadyBorrowed,

    /// The student holds the maximum number of active borrows.
    #[error("Borrow limit of {limit} active books reached")]
    BorrowLimitExceeded {
        /// The configured limit.
        limit: u32,
    },

    // ========== Return ==========
    /// The record is not an active borrow, or belongs to someone else.
    #[error("Borrow record is not active or does not belong to the requester")]
    NotBorrowedOrNotOwner,

    // ========== Review gate ==========
    /// The student has already reviewed this book.
    #[error("The book has already been reviewed by the student")]
    AlreadyReviewed,

    /// The student never returned a borrow of this book.
    #[error("No returned borrow of this book was found for the student")]
    NoReturnedBorrowFound,

    /// Rating outside `1..=5`.
    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(i32),

    // ========== Invariant guards ==========
    /// An explicitly supplied due date precedes the borrow date.
    #[error("Due date {due_date} is before borrow date {borrow_date}")]
    InvalidDueDate {
        /// Borrow date.
        borrow_date: NaiveDate,
        /// Rejected due date.
        due_date: NaiveDate,
    },

    /// A copy count would leave `0 <= available <= total`.
    #[error("Copy count invariant violated: {available} available of {total}")]
    CopyCountInvariant {
        /// Total copies.
        total: i64,
        /// Available copies.
        available: i64,
    },

    /// A stored record has a status that disagrees with its return date.
    #[error("Borrow record {0} is inconsistent")]
    InconsistentRecord(BorrowRecordId),
}

impl LendingError {
    /// Stable machine-readable code for API responses.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NoCopiesAvailable => "no_copies_available",
            Self::AlreadyBorrowed => "already_borrowed",
            Self::BorrowLimitExceeded { .. } => "borrow_limit_exceeded",
            Self::NotBorrowedOrNotOwner => "not_borrowed_or_not_owner",
            Self::AlreadyReviewed => "already_reviewed",
            Self::NoReturnedBorrowFound => "no_returned_borrow_found",
            Self::InvalidRating(_) => "invalid_rating",
            Self::InvalidDueDate { .. } => "invalid_due_date",
            Self::CopyCountInvariant { .. } | Self::InconsistentRecord(_) => "internal_error",
        }
    }

    /// Actionable message for the person who made the request.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NoCopiesAvailable => {
                "Sorry, no copies of this book are currently available.".to_string()
            }
            Self::AlreadyBorrowed => "You already have this book borrowed.".to_string(),
            Self::BorrowLimitExceeded { limit } => format!(
                "You have reached the maximum limit of {limit} borrowed books. \
                 Please return a book before borrowing another."
            ),
            Self::NotBorrowedOrNotOwner => {
                "This borrow record is not an active borrow of yours.".to_string()
            }
            Self::AlreadyReviewed => "You have already reviewed this book.".to_string(),
            Self::NoReturnedBorrowFound => {
                "You can only review books you have borrowed and returned.".to_string()
            }
            Self::InvalidRating(_) => "Rating must be a whole number from 1 to 5.".to_string(),
            Self::InvalidDueDate { .. } => "The due date cannot be before the borrow date.".to_string(),
            Self::CopyCountInvariant { .. } | Self::InconsistentRecord(_) => {
                "An error occurred".to_string()
            }
        }
    }

    /// True for refusals the user can act on; false for invariant faults.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        !matches!(
            self,
            Self::CopyCountInvariant { .. } | Self::InconsistentRecord(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct_for_user_facing_errors() {
        let errors = [
            LendingError::NoCopiesAvailable,
            LendingError::AlreadyBorrowed,
            LendingError::BorrowLimitExceeded { limit: 5 },
            LendingError::NotBorrowedOrNotOwner,
            LendingError::AlreadyReviewed,
            LendingError::NoReturnedBorrowFound,
            LendingError::InvalidRating(9),
        ];
        let mut codes: Vec<_> = errors.iter().map(LendingError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
        assert!(errors.iter().all(LendingError::is_user_facing));
    }

    #[test]
    fn test_limit_message_mentions_limit() {
        let message = LendingError::BorrowLimitExceeded { limit: 3 }.user_message();
        assert!(message.contains("maximum limit of 3"));
        assert!(message.contains("return a book"));
    }

    #[test]
    fn test_invariant_faults_are_opaque() {
        let error = LendingError::CopyCountInvariant {
            total: 1,
            available: 2,
        };
        assert!(!error.is_user_facing());
        assert_eq!(error.code(), "internal_error");
        assert_eq!(error.user_message(), "An error occurred");
    }
}
