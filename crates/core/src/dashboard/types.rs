//! Dashboard data types.

use chrono::NaiveDate;
use libris_shared::types::{BookId, BorrowRecordId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::lending::BorrowStatus;

/// Entries in each "top" list on the staff dashboard.
pub const TOP_LIST_SIZE: u64 = 5;

/// Entries in the recent borrowings feed.
pub const RECENT_BORROWINGS: u64 = 10;

/// Newest books shown on the home page.
pub const HOME_NEWEST_BOOKS: u64 = 6;

/// Top-rated books shown on the home page.
pub const HOME_TOP_RATED_BOOKS: u64 = 3;

/// Staff dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    /// Catalog and user totals.
    pub totals: LibraryTotals,
    /// Active borrows.
    pub active_borrowings: u64,
    /// Active borrows past their due date.
    pub overdue_borrowings: u64,
    /// Most borrowed books.
    pub top_books: Vec<BookBorrowCount>,
    /// Students with the most borrows.
    pub top_students: Vec<StudentBorrowCount>,
    /// Latest borrows, newest first.
    pub recent_borrowings: Vec<RecentBorrowing>,
}

/// Headline counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryTotals {
    /// Books in the catalog.
    pub books: u64,
    /// Authors.
    pub authors: u64,
    /// Categories.
    pub categories: u64,
    /// Non-staff users.
    pub students: u64,
}

/// A book and how often it was borrowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookBorrowCount {
    /// Book.
    pub book_id: BookId,
    /// Title.
    pub title: String,
    /// Borrows, all time.
    pub borrow_count: u64,
}

/// A student and how often they borrowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentBorrowCount {
    /// Student.
    pub student_id: UserId,
    /// Username.
    pub username: String,
    /// Borrows, all time.
    pub borrow_count: u64,
}

/// One line of the recent borrowings feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentBorrowing {
    /// Record.
    pub id: BorrowRecordId,
    /// Borrowing student's username.
    pub username: String,
    /// Book title.
    pub book_title: String,
    /// Borrow date.
    pub borrow_date: NaiveDate,
    /// Due date.
    pub due_date: NaiveDate,
    /// Status.
    pub status: BorrowStatus,
    /// Active and past due.
    pub is_overdue: bool,
}

/// A compact book entry for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookCard {
    /// Book.
    pub id: BookId,
    /// Title.
    pub title: String,
    /// Author name, if any.
    pub author_name: Option<String>,
    /// Category name, if any.
    pub category_name: Option<String>,
    /// Mean rating at 2 dp, `None` when unreviewed.
    pub average_rating: Option<Decimal>,
    /// At least one copy on the shelf.
    pub is_available: bool,
}

/// Public home page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomePage {
    /// Newest additions.
    pub newest_books: Vec<BookCard>,
    /// Best rated books.
    pub top_rated_books: Vec<BookCard>,
    /// Books in the catalog.
    pub total_books: u64,
    /// Authors.
    pub total_authors: u64,
    /// Non-staff users.
    pub total_students: u64,
}

/// A student's borrowing statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileStats {
    /// Active borrows.
    pub currently_borrowed: u64,
    /// Borrows, all time.
    pub total_borrowed: u64,
    /// Returned borrows.
    pub returned: u64,
}

impl ProfileStats {
    /// Builds stats from the active and all-time counts.
    #[must_use]
    pub const fn from_counts(currently_borrowed: u64, total_borrowed: u64) -> Self {
        Self {
            currently_borrowed,
            total_borrowed,
            returned: total_borrowed.saturating_sub(currently_borrowed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_stats_from_counts() {
        let stats = ProfileStats::from_counts(2, 7);
        assert_eq!(stats.returned, 5);
        assert_eq!(ProfileStats::from_counts(0, 0), ProfileStats::default());
    }
}
