//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository abstractions for data access
//! - Database migrations
//! - The lending ledger's atomic borrow and return persistence

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{
    AuthorRepository, BookRepository, BorrowRepository, CategoryRepository, DashboardRepository,
    ReviewRepository, UserRepository,
};

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Establishes a pooled connection with explicit pool bounds.
///
/// An in-memory SQLite URL always gets a single connection, since every
/// connection to `sqlite::memory:` would otherwise open its own database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_with_pool(
    database_url: &str,
    max_connections: u32,
    min_connections: u32,
) -> Result<DatabaseConnection, DbErr> {
    let in_memory = database_url.starts_with("sqlite::memory:");
    let mut options = ConnectOptions::new(database_url);
    options
        .max_connections(if in_memory { 1 } else { max_connections })
        .min_connections(if in_memory { 1 } else { min_connections })
        .connect_timeout(Duration::from_secs(8))
        .sqlx_logging(false);
    Database::connect(options).await
}
