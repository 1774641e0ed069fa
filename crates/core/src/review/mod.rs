//! Review rules.
//!
//! - Rating bounds
//! - Average rating arithmetic (decimal, never floating point)

pub mod rating;

pub use rating::{MAX_RATING, MIN_RATING, Rating, ReviewInput, average_rating};
