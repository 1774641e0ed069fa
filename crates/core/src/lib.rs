//! Core business logic for Libris.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `lending` - Borrow/return ledger rules, overdue checks, review eligibility
//! - `review` - Ratings and average rating arithmetic
//! - `catalog` - Book, author and category validation
//! - `auth` - Password hashing and account validation
//! - `dashboard` - Dashboard, home page and profile statistics types

pub mod auth;
pub mod catalog;
pub mod dashboard;
pub mod lending;
pub mod review;
