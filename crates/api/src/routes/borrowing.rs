//! Student borrowing routes: borrow, return, and the student's own lists.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{ApiError, ApiResult};
use crate::{AppState, middleware::auth::AuthUser};
use libris_core::lending::{BorrowRecord, BorrowStatus};
use libris_db::repositories::BorrowDetails;
use libris_shared::AppError;
use libris_shared::types::{BookId, BorrowRecordId, UserId};

/// Creates the borrowing routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/books/{book_id}/borrow", post(borrow_book))
        .route("/borrowings/{record_id}/return", post(return_book))
        .route("/me/borrowings", get(my_borrowings))
        .route("/me/books", get(my_books))
}

/// Optional status filter for borrow listings.
#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    /// `borrowed` or `returned`; absent lists both.
    pub status: Option<String>,
}

impl StatusQuery {
    /// Parses the filter.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an unknown status.
    pub fn parse(&self) -> ApiResult<Option<BorrowStatus>> {
        self.status
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::parse::<BorrowStatus>)
            .transpose()
            .map_err(|e: String| ApiError(AppError::Validation(e)))
    }
}

/// A borrow record as shown to clients.
#[derive(Debug, Serialize)]
pub struct BorrowResponse {
    /// Record ID.
    pub id: BorrowRecordId,
    /// Borrowed book.
    pub book_id: BookId,
    /// Book title.
    pub book_title: String,
    /// Borrowing student.
    pub student_id: UserId,
    /// Borrowing student's username, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_username: Option<String>,
    /// Borrow date.
    pub borrow_date: NaiveDate,
    /// Due date.
    pub due_date: NaiveDate,
    /// Return date, once returned.
    pub return_date: Option<NaiveDate>,
    /// `borrowed` or `returned`.
    pub status: BorrowStatus,
    /// Active and past due.
    pub is_overdue: bool,
    /// Days until due for active records; negative when overdue.
    pub days_remaining: Option<i64>,
}

impl BorrowResponse {
    /// Builds the view of `record` as of `today`.
    #[must_use]
    pub fn new(
        record: &BorrowRecord,
        book_title: String,
        student_username: Option<String>,
        today: NaiveDate,
    ) -> Self {
        Self {
            id: record.id(),
            book_id: record.book_id(),
            book_title,
            student_id: record.student_id(),
            student_username,
            borrow_date: record.borrow_date(),
            due_date: record.due_date(),
            return_date: record.return_date(),
            status: record.status(),
            is_overdue: record.is_overdue(today),
            days_remaining: record.days_remaining(today),
        }
    }

    /// Builds the view of a listed record as of `today`.
    #[must_use]
    pub fn from_details(details: BorrowDetails, today: NaiveDate) -> Self {
        Self::new(
            &details.record,
            details.book_title,
            Some(details.student_username),
            today,
        )
    }
}

/// POST `/books/{book_id}/borrow` - Borrow a copy of a book.
async fn borrow_book(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(book_id): Path<BookId>,
) -> ApiResult<impl IntoResponse> {
    let today = state.today();
    let outcome = state
        .borrows()
        .borrow_book(auth.user_id(), book_id, today)
        .await?;

    let message = format!(
        "You have successfully borrowed '{}'. Please return it by {}.",
        outcome.book_title,
        outcome.due_date.format("%B %-d, %Y")
    );
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "borrowing": BorrowResponse::new(&outcome.record, outcome.book_title, None, today),
            "message": message,
        })),
    ))
}

/// POST `/borrowings/{record_id}/return` - Return one of your borrows.
async fn return_book(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(record_id): Path<BorrowRecordId>,
) -> ApiResult<impl IntoResponse> {
    let today = state.today();
    let outcome = state
        .borrows()
        .return_book(record_id, Some(auth.user_id()), today)
        .await?;

    let message = format!("You have successfully returned '{}'.", outcome.book_title);
    Ok((
        StatusCode::OK,
        Json(json!({
            "borrowing": BorrowResponse::new(&outcome.record, outcome.book_title, None, today),
            "message": message,
        })),
    ))
}

/// GET `/me/borrowings` - Your borrow history, newest first.
async fn my_borrowings(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<StatusQuery>,
) -> ApiResult<impl IntoResponse> {
    let status = query.parse()?;
    let today = state.today();
    let history = state
        .borrows()
        .history_for_student(auth.user_id(), status)
        .await?;

    let borrowings: Vec<BorrowResponse> = history
        .into_iter()
        .map(|d| BorrowResponse::from_details(d, today))
        .collect();
    Ok(Json(json!({ "borrowings": borrowings })))
}

/// GET `/me/books` - Books you currently hold, soonest due first.
async fn my_books(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<impl IntoResponse> {
    let today = state.today();
    let active = state.borrows().active_for_student(auth.user_id()).await?;

    let borrowings: Vec<BorrowResponse> = active
        .into_iter()
        .map(|d| BorrowResponse::from_details(d, today))
        .collect();
    Ok(Json(json!({
        "active_count": borrowings.len(),
        "max_borrow_limit": state.lending.policy().max_borrow_limit,
        "borrowings": borrowings,
    })))
}
