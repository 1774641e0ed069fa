//! Catalog error types.

use thiserror::Error;

/// Catalog validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// A required text field is blank.
    #[error("{0} is required")]
    Required(&'static str),

    /// A text field exceeds its maximum length.
    #[error("{field} must be at most {max} characters")]
    TooLong {
        /// Field name.
        field: &'static str,
        /// Maximum length in characters.
        max: usize,
    },

    /// A count field is negative.
    #[error("{0} cannot be negative")]
    Negative(&'static str),

    /// More copies available than owned.
    #[error("Available copies ({available}) cannot exceed total copies ({total})")]
    AvailableExceedsTotal {
        /// Total copies.
        total: i32,
        /// Available copies.
        available: i32,
    },

    /// Unknown sort key.
    #[error("Unknown sort order: {0}")]
    UnknownSort(String),
}
