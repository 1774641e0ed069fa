//! Accounts: password hashing and registration rules.
//!
//! This module provides:
//! - Password hashing with Argon2id
//! - Password verification
//! - Registration and profile update validation

mod password;
mod registration;

pub use password::{PasswordError, hash_password, verify_password};
pub use registration::{
    MIN_PASSWORD_LENGTH, NewAccount, ProfileChanges, RegistrationError, validate_profile_update,
    validate_registration,
};
