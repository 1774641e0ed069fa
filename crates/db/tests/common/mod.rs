//! Shared fixtures for repository integration tests.
//!
//! Every test gets its own migrated in-memory SQLite database, so tests
//! never see each other's rows and need no external server.

#![allow(dead_code)]

use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;

use libris_core::auth::validate_registration;
use libris_core::catalog::{AuthorInput, BookInput, CategoryInput};
use libris_core::lending::{LendingPolicy, LendingService};
use libris_db::migration::Migrator;
use libris_db::{
    AuthorRepository, BookRepository, BorrowRepository, CategoryRepository, ReviewRepository,
    UserRepository,
};
use libris_shared::types::{AuthorId, BookId, CategoryId, UserId};

/// A fresh, migrated database.
pub async fn setup_db() -> DatabaseConnection {
    let db = libris_db::connect_with_pool("sqlite::memory:", 1, 1)
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

/// A fixed "today" for tests.
pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn today() -> NaiveDate {
    day(2026, 3, 2)
}

/// Repositories sharing one database and lending policy.
pub struct Library {
    pub db: DatabaseConnection,
    pub users: UserRepository,
    pub authors: AuthorRepository,
    pub categories: CategoryRepository,
    pub books: BookRepository,
    pub borrows: BorrowRepository,
    pub reviews: ReviewRepository,
}

impl Library {
    pub async fn new() -> Self {
        Self::with_policy(LendingPolicy::default()).await
    }

    pub async fn with_policy(policy: LendingPolicy) -> Self {
        let db = setup_db().await;
        let lending = LendingService::new(policy);
        Self {
            users: UserRepository::new(db.clone()),
            authors: AuthorRepository::new(db.clone()),
            categories: CategoryRepository::new(db.clone()),
            books: BookRepository::new(db.clone()),
            borrows: BorrowRepository::new(db.clone(), lending),
            reviews: ReviewRepository::new(db.clone(), lending),
            db,
        }
    }

    /// Registers a student; the stored hash is a placeholder.
    pub async fn student(&self, username: &str) -> UserId {
        self.account(username, false).await
    }

    pub async fn staff(&self, username: &str) -> UserId {
        self.account(username, true).await
    }

    async fn account(&self, username: &str, is_staff: bool) -> UserId {
        let account = validate_registration(
            username,
            &format!("{username}@example.com"),
            "Test",
            "User",
            None,
            "password123",
            "password123",
        )
        .expect("valid registration");
        let created = self
            .users
            .register(account, "$argon2id$test_hash".to_string(), is_staff, today())
            .await
            .expect("Failed to register");
        UserId::from_uuid(created.user.id)
    }

    pub async fn author(&self, name: &str) -> AuthorId {
        let author = self
            .authors
            .create(AuthorInput::new(name, None).expect("valid author"))
            .await
            .expect("Failed to create author");
        AuthorId::from_uuid(author.id)
    }

    pub async fn category(&self, name: &str) -> CategoryId {
        let category = self
            .categories
            .create(CategoryInput::new(name, None).expect("valid category"))
            .await
            .expect("Failed to create category");
        CategoryId::from_uuid(category.id)
    }

    /// A book with `copies` copies, all on the shelf.
    pub async fn book(&self, title: &str, copies: i32) -> BookId {
        self.book_by(title, copies, None, None).await
    }

    pub async fn book_by(
        &self,
        title: &str,
        copies: i32,
        author: Option<AuthorId>,
        category: Option<CategoryId>,
    ) -> BookId {
        let input = BookInput::new(
            title, author, category, None, None, None, None, copies, copies, None,
        )
        .expect("valid book");
        let book = self
            .books
            .create(input)
            .await
            .expect("Failed to create book");
        BookId::from_uuid(book.id)
    }

    pub async fn available(&self, book: BookId) -> i32 {
        self.books
            .find_by_id(book)
            .await
            .expect("Failed to load book")
            .expect("Book should exist")
            .available_copies
    }
}
