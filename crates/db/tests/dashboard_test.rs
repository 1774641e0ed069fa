//! Integration tests for the staff dashboard and home page.

mod common;

use chrono::Duration;
use libris_core::lending::BorrowStatus;
use libris_core::review::ReviewInput;
use libris_db::DashboardRepository;

use common::{Library, today};

#[tokio::test]
async fn test_empty_library_summary() {
    let lib = Library::new().await;
    let dashboard = DashboardRepository::new(lib.db.clone());

    let summary = dashboard.summary(today()).await.unwrap();

    assert_eq!(summary.totals.books, 0);
    assert_eq!(summary.active_borrowings, 0);
    assert!(summary.top_books.is_empty());
    assert!(summary.top_students.is_empty());
    assert!(summary.recent_borrowings.is_empty());
}

#[tokio::test]
async fn test_summary_counts_and_rankings() {
    let lib = Library::new().await;
    let dashboard = DashboardRepository::new(lib.db.clone());
    lib.staff("librarian").await;
    let alice = lib.student("alice").await;
    let bob = lib.student("bob").await;
    lib.author("Someone").await;
    lib.category("Fiction").await;
    let popular = lib.book("Popular", 3).await;
    let quiet = lib.book("Quiet", 3).await;

    let early = today() - Duration::days(20);
    let overdue = lib.borrows.borrow_book(alice, popular, early).await.unwrap();
    lib.borrows.borrow_book(bob, popular, today()).await.unwrap();
    let returned = lib.borrows.borrow_book(alice, quiet, today()).await.unwrap();
    lib.borrows
        .return_book(returned.record.id(), Some(alice), today())
        .await
        .unwrap();

    let summary = dashboard.summary(today()).await.unwrap();

    assert_eq!(summary.totals.books, 2);
    assert_eq!(summary.totals.authors, 1);
    assert_eq!(summary.totals.categories, 1);
    assert_eq!(summary.totals.students, 2);
    assert_eq!(summary.active_borrowings, 2);
    assert_eq!(summary.overdue_borrowings, 1);

    assert_eq!(summary.top_books[0].title, "Popular");
    assert_eq!(summary.top_books[0].borrow_count, 2);
    assert_eq!(summary.top_students[0].username, "alice");
    assert_eq!(summary.top_students[0].borrow_count, 2);

    assert_eq!(summary.recent_borrowings.len(), 3);
    let oldest = summary
        .recent_borrowings
        .iter()
        .find(|r| r.id == overdue.record.id())
        .expect("Overdue borrow should be listed");
    assert!(oldest.is_overdue);
    assert_eq!(oldest.status, BorrowStatus::Borrowed);
    assert_eq!(summary.recent_borrowings[2].id, overdue.record.id());
}

#[tokio::test]
async fn test_home_page() {
    let lib = Library::new().await;
    let dashboard = DashboardRepository::new(lib.db.clone());
    let alice = lib.student("alice").await;
    for i in 0..7 {
        lib.book(&format!("Book {i}"), 1).await;
    }
    let reviewed = lib.book("Reviewed", 1).await;
    let borrowed = lib.borrows.borrow_book(alice, reviewed, today()).await.unwrap();
    lib.borrows
        .return_book(borrowed.record.id(), Some(alice), today())
        .await
        .unwrap();
    lib.reviews
        .submit(alice, reviewed, ReviewInput::new(4, None).unwrap())
        .await
        .unwrap();

    let home = dashboard.home().await.unwrap();

    assert_eq!(home.total_books, 8);
    assert_eq!(home.total_students, 1);
    assert_eq!(home.newest_books.len(), 6);
    assert_eq!(home.newest_books[0].title, "Reviewed");
    assert_eq!(home.top_rated_books.len(), 1);
    assert_eq!(home.top_rated_books[0].title, "Reviewed");
}
