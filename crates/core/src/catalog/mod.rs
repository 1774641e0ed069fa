//! Catalog rules for books, authors and categories.
//!
//! This module provides:
//! - Input validation for catalog writes
//! - Book listing sort orders
//! - Error types for catalog operations

pub mod error;
pub mod types;

pub use error::CatalogError;
pub use types::{AuthorInput, BookInput, BookSort, CategoryInput, DEFAULT_LANGUAGE, check_copies};
