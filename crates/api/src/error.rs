//! Mapping of domain and repository errors to JSON responses.
//!
//! Every error leaves the API as `{ "error": <code>, "message": <text> }`.
//! Store failures are logged here and reported as an opaque 500.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde_json::json;

use libris_core::auth::{PasswordError, RegistrationError};
use libris_core::catalog::CatalogError;
use libris_core::lending::LendingError;
use libris_db::repositories::{BorrowError, CatalogRepoError, ReviewError, UserError};
use libris_shared::error::Refusal;
use libris_shared::{AppError, JwtError};

/// Handler error: an [`AppError`] that renders itself as a response.
#[derive(Debug)]
pub struct ApiError(pub AppError);

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }
        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": self.0.public_message(),
            })),
        )
            .into_response()
    }
}

impl From<LendingError> for ApiError {
    fn from(e: LendingError) -> Self {
        let kind = match e {
            LendingError::NoCopiesAvailable
            | LendingError::AlreadyBorrowed
            | LendingError::AlreadyReviewed => Refusal::Conflict,
            LendingError::BorrowLimitExceeded { .. }
            | LendingError::NoReturnedBorrowFound
            | LendingError::InvalidRating(_)
            | LendingError::InvalidDueDate { .. } => Refusal::Unprocessable,
            LendingError::NotBorrowedOrNotOwner => Refusal::NotFound,
            LendingError::CopyCountInvariant { .. } | LendingError::InconsistentRecord(_) => {
                return Self(AppError::Internal(e.to_string()));
            }
        };
        Self(AppError::refused(kind, e.code(), e.user_message()))
    }
}

impl From<DbErr> for ApiError {
    fn from(e: DbErr) -> Self {
        Self(AppError::Database(e.to_string()))
    }
}

impl From<BorrowError> for ApiError {
    fn from(e: BorrowError) -> Self {
        match e {
            BorrowError::Lending(e) => e.into(),
            BorrowError::BookNotFound(_) => Self(AppError::NotFound("Book not found".to_string())),
            BorrowError::StudentNotFound(_) => {
                Self(AppError::NotFound("Student not found".to_string()))
            }
            BorrowError::Database(e) => e.into(),
        }
    }
}

impl From<ReviewError> for ApiError {
    fn from(e: ReviewError) -> Self {
        match e {
            ReviewError::Lending(e) => e.into(),
            ReviewError::BookNotFound(_) => Self(AppError::NotFound("Book not found".to_string())),
            ReviewError::Database(e) => e.into(),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        Self(AppError::Validation(e.to_string()))
    }
}

impl From<CatalogRepoError> for ApiError {
    fn from(e: CatalogRepoError) -> Self {
        match e {
            CatalogRepoError::Validation(e) => e.into(),
            CatalogRepoError::BookNotFound(_)
            | CatalogRepoError::AuthorNotFound(_)
            | CatalogRepoError::CategoryNotFound(_) => Self(AppError::NotFound(e.to_string())),
            CatalogRepoError::DuplicateCategory(_) | CatalogRepoError::DuplicateIsbn(_) => {
                Self(AppError::Conflict(e.to_string()))
            }
            CatalogRepoError::CopiesOnLoan { .. } => Self(AppError::refused(
                Refusal::Unprocessable,
                "copies_on_loan",
                e.to_string(),
            )),
            CatalogRepoError::Database(e) => e.into(),
        }
    }
}

impl From<RegistrationError> for ApiError {
    fn from(e: RegistrationError) -> Self {
        match e {
            RegistrationError::UsernameTaken | RegistrationError::EmailTaken => {
                Self(AppError::refused(Refusal::Conflict, e.code(), e.to_string()))
            }
            _ => Self(AppError::Validation(e.to_string())),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::Registration(e) => e.into(),
            UserError::NotFound(_) => Self(AppError::NotFound("User not found".to_string())),
            UserError::Database(e) => e.into(),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(e: PasswordError) -> Self {
        Self(AppError::Internal(e.to_string()))
    }
}

impl From<JwtError> for ApiError {
    fn from(e: JwtError) -> Self {
        Self(AppError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(LendingError::NoCopiesAvailable, 409, "no_copies_available")]
    #[case(LendingError::AlreadyBorrowed, 409, "already_borrowed")]
    #[case(LendingError::AlreadyReviewed, 409, "already_reviewed")]
    #[case(LendingError::BorrowLimitExceeded { limit: 5 }, 422, "borrow_limit_exceeded")]
    #[case(LendingError::NoReturnedBorrowFound, 422, "no_returned_borrow_found")]
    #[case(LendingError::InvalidRating(9), 422, "invalid_rating")]
    #[case(LendingError::NotBorrowedOrNotOwner, 404, "not_borrowed_or_not_owner")]
    #[case(LendingError::CopyCountInvariant { total: 1, available: 2 }, 500, "internal_error")]
    fn test_lending_error_mapping(
        #[case] error: LendingError,
        #[case] status: u16,
        #[case] code: &str,
    ) {
        let ApiError(app) = error.into();
        assert_eq!(app.status_code(), status);
        assert_eq!(app.error_code(), code);
    }

    #[test]
    fn test_invariant_message_is_opaque() {
        let ApiError(app) = LendingError::CopyCountInvariant {
            total: 1,
            available: 2,
        }
        .into();
        assert_eq!(app.public_message(), "An error occurred");
    }

    #[test]
    fn test_taken_username_is_conflict() {
        let ApiError(app) = RegistrationError::UsernameTaken.into();
        assert_eq!(app.status_code(), 409);
        assert_eq!(app.error_code(), "username_taken");

        let ApiError(app) = RegistrationError::PasswordMismatch.into();
        assert_eq!(app.status_code(), 400);
    }
}
