//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod book;
pub mod borrow;
pub mod catalog;
pub mod dashboard;
pub mod review;
pub mod user;

pub use book::{BookDetail, BookQuery, BookRepository};
pub use borrow::{
    BorrowDetails, BorrowError, BorrowOutcome, BorrowRepository, BulkReturnResult,
    ReturnOutcome, ReviewEligibility,
};
pub use catalog::{
    AuthorDetail, AuthorRepository, AuthorSummary, CatalogRepoError, CategoryRepository,
    CategorySummary,
};
pub use dashboard::DashboardRepository;
pub use review::{ReviewDetails, ReviewError, ReviewRepository};
pub use user::{UserError, UserRepository, UserWithProfile};
