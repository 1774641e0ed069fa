//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// How a refused request should be reported to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    /// The request clashes with the current state (409).
    Conflict,
    /// The request is well-formed but a rule forbids it (422).
    Unprocessable,
    /// The target does not exist for this caller (404).
    NotFound,
}

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Access denied.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Conflict (e.g., duplicate entry).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// An expected, user-facing refusal carrying its own machine code.
    ///
    /// Lending and review rules end up here: they are reported to the user
    /// as actionable messages rather than treated as faults.
    #[error("{message}")]
    Refused {
        /// HTTP class of the refusal.
        kind: Refusal,
        /// Stable machine-readable code, e.g. `no_copies_available`.
        code: &'static str,
        /// Actionable message for the user.
        message: String,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Builds a refusal.
    pub fn refused(kind: Refusal, code: &'static str, message: impl Into<String>) -> Self {
        Self::Refused {
            kind,
            code,
            message: message.into(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) | Self::Refused { kind: Refusal::NotFound, .. } => 404,
            Self::Validation(_) => 400,
            Self::Conflict(_) | Self::Refused { kind: Refusal::Conflict, .. } => 409,
            Self::Refused { kind: Refusal::Unprocessable, .. } => 422,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation_error",
            Self::Conflict(_) => "conflict",
            Self::Refused { code, .. } => code,
            Self::Database(_) | Self::Internal(_) => "internal_error",
        }
    }

    /// Returns the message safe to show to a client.
    ///
    /// Store and internal failures are opaque; everything else is shown as-is.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) => "An error occurred".to_string(),
            Self::Refused { message, .. } => message.clone(),
            Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::NotFound(m)
            | Self::Validation(m)
            | Self::Conflict(m) => m.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::Unauthorized(String::new()), 401, "unauthorized")]
    #[case(AppError::Forbidden(String::new()), 403, "forbidden")]
    #[case(AppError::NotFound(String::new()), 404, "not_found")]
    #[case(AppError::Validation(String::new()), 400, "validation_error")]
    #[case(AppError::Conflict(String::new()), 409, "conflict")]
    #[case(AppError::Database(String::new()), 500, "internal_error")]
    #[case(AppError::Internal(String::new()), 500, "internal_error")]
    #[case(AppError::refused(Refusal::Conflict, "no_copies_available", ""), 409, "no_copies_available")]
    #[case(AppError::refused(Refusal::Unprocessable, "borrow_limit_exceeded", ""), 422, "borrow_limit_exceeded")]
    #[case(AppError::refused(Refusal::NotFound, "not_borrowed_or_not_owner", ""), 404, "not_borrowed_or_not_owner")]
    fn test_status_and_code(#[case] error: AppError, #[case] status: u16, #[case] code: &str) {
        assert_eq!(error.status_code(), status);
        assert_eq!(error.error_code(), code);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::Unauthorized("msg".into()).to_string(),
            "Authentication failed: msg"
        );
        assert_eq!(AppError::NotFound("msg".into()).to_string(), "Not found: msg");
        assert_eq!(
            AppError::refused(Refusal::Conflict, "already_borrowed", "You already have this book borrowed.")
                .to_string(),
            "You already have this book borrowed."
        );
    }

    #[test]
    fn test_public_message_hides_store_failures() {
        let error = AppError::Database("connection reset by peer".into());
        assert_eq!(error.public_message(), "An error occurred");

        let error = AppError::Validation("Title is required".into());
        assert_eq!(error.public_message(), "Title is required");
    }
}
