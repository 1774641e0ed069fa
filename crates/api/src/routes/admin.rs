//! Staff routes: all borrowings, issuing and bulk return, and the dashboard.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::borrowing::{BorrowResponse, StatusQuery};
use crate::error::ApiResult;
use crate::{AppState, middleware::auth::StaffUser};
use libris_core::dashboard::DashboardSummary;
use libris_db::DashboardRepository;
use libris_db::repositories::BulkReturnResult;
use libris_shared::types::{BookId, BorrowRecordId, PageRequest, PageResponse, UserId};

/// Borrowings per page in the staff listing.
pub const BORROWINGS_PER_PAGE: u32 = 20;

/// Creates the staff routes (requires auth middleware).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/borrowings", get(list_borrowings).post(issue_borrowing))
        .route("/admin/borrowings/return", post(bulk_return))
        .route("/admin/dashboard", get(dashboard))
}

/// Query parameters for the staff borrowing listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListBorrowingsQuery {
    /// `borrowed` or `returned`.
    pub status: Option<String>,
    /// 1-based page number.
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// Request body for lending a book on a student's behalf.
#[derive(Debug, Deserialize)]
pub struct IssueBorrowingRequest {
    /// Borrowing student.
    pub student_id: UserId,
    /// Book to lend.
    pub book_id: BookId,
    /// Due date; defaults to the loan period from today.
    pub due_date: Option<NaiveDate>,
}

/// Request body for a bulk return.
#[derive(Debug, Deserialize)]
pub struct BulkReturnRequest {
    /// Records to mark as returned.
    pub ids: Vec<BorrowRecordId>,
}

/// GET `/admin/borrowings` - Every borrow record, newest first.
async fn list_borrowings(
    State(state): State<AppState>,
    _staff: StaffUser,
    Query(query): Query<ListBorrowingsQuery>,
) -> ApiResult<Json<PageResponse<BorrowResponse>>> {
    let status = StatusQuery {
        status: query.status,
    }
    .parse()?;
    let page = PageRequest::from_query(query.page, query.per_page, BORROWINGS_PER_PAGE);
    let today = state.today();

    let listing = state.borrows().list_all(status, page).await?;
    Ok(Json(PageResponse {
        data: listing
            .data
            .into_iter()
            .map(|d| BorrowResponse::from_details(d, today))
            .collect(),
        meta: listing.meta,
    }))
}

/// POST `/admin/borrowings` - Lend a book to a student, optionally with a
/// custom due date.
async fn issue_borrowing(
    State(state): State<AppState>,
    staff: StaffUser,
    Json(payload): Json<IssueBorrowingRequest>,
) -> ApiResult<impl IntoResponse> {
    let today = state.today();
    let outcome = state
        .borrows()
        .borrow_book_due(payload.student_id, payload.book_id, today, payload.due_date)
        .await?;

    info!(
        staff_id = %staff.user_id(),
        record_id = %outcome.record.id(),
        due_date = %outcome.due_date,
        "Staff issued borrowing"
    );
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "borrowing": BorrowResponse::new(&outcome.record, outcome.book_title, None, today),
            "message": format!("Due back by {}.", outcome.due_date.format("%B %-d, %Y")),
        })),
    ))
}

/// POST `/admin/borrowings/return` - Mark several records returned.
async fn bulk_return(
    State(state): State<AppState>,
    staff: StaffUser,
    Json(payload): Json<BulkReturnRequest>,
) -> ApiResult<Json<BulkReturnResult>> {
    let result = state
        .borrows()
        .bulk_return(&payload.ids, state.today())
        .await?;
    info!(
        staff_id = %staff.user_id(),
        returned = result.returned,
        skipped = result.skipped,
        "Staff bulk return"
    );
    Ok(Json(result))
}

/// GET `/admin/dashboard` - Library metrics.
async fn dashboard(
    State(state): State<AppState>,
    _staff: StaffUser,
) -> ApiResult<Json<DashboardSummary>> {
    let summary = DashboardRepository::new((*state.db).clone())
        .summary(state.today())
        .await?;
    Ok(Json(summary))
}
