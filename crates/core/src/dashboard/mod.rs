//! Staff dashboard, public home page and profile statistics.

pub mod types;

pub use types::*;
