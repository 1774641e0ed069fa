//! Review routes: the public feed and review submission.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ApiResult;
use crate::{AppState, middleware::auth::AuthUser};
use libris_core::review::ReviewInput;
use libris_db::repositories::ReviewDetails;
use libris_shared::types::{BookId, PageRequest, PageResponse, ReviewId, UserId};

/// Reviews per page in the public feed.
pub const REVIEWS_PER_PAGE: u32 = 12;

/// Creates the public review routes.
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/reviews", get(list_reviews))
}

/// Creates the review submission route (requires auth middleware).
pub fn routes() -> Router<AppState> {
    Router::new().route("/books/{book_id}/reviews", post(submit_review))
}

/// Page selection.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// 1-based page number.
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// Request body for submitting a review.
#[derive(Debug, Deserialize)]
pub struct SubmitReviewRequest {
    /// Rating, 1 to 5.
    pub rating: i32,
    /// Optional comment.
    pub comment: Option<String>,
}

/// A review as shown to clients.
#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    /// Review ID.
    pub id: ReviewId,
    /// Reviewed book.
    pub book_id: BookId,
    /// Book title.
    pub book_title: String,
    /// Reviewer.
    pub student_id: UserId,
    /// Reviewer's username.
    pub student_username: String,
    /// Rating, 1 to 5.
    pub rating: i32,
    /// Comment; may be empty.
    pub comment: String,
    /// Submission time.
    pub created_at: DateTime<FixedOffset>,
}

impl From<ReviewDetails> for ReviewResponse {
    fn from(r: ReviewDetails) -> Self {
        Self {
            id: r.id,
            book_id: r.book_id,
            book_title: r.book_title,
            student_id: r.student_id,
            student_username: r.student_username,
            rating: r.rating,
            comment: r.comment,
            created_at: r.created_at,
        }
    }
}

/// GET `/reviews` - All reviews, newest first.
async fn list_reviews(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PageResponse<ReviewResponse>>> {
    let page = PageRequest::from_query(query.page, query.per_page, REVIEWS_PER_PAGE);
    let feed = state.reviews().feed(page).await?;
    Ok(Json(PageResponse {
        data: feed.data.into_iter().map(ReviewResponse::from).collect(),
        meta: feed.meta,
    }))
}

/// POST `/books/{book_id}/reviews` - Review a book you borrowed and returned.
async fn submit_review(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(book_id): Path<BookId>,
    Json(payload): Json<SubmitReviewRequest>,
) -> ApiResult<impl IntoResponse> {
    let input = ReviewInput::new(payload.rating, payload.comment.as_deref())?;
    let review = state
        .reviews()
        .submit(auth.user_id(), book_id, input)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "review": {
                "id": review.id,
                "book_id": review.book_id,
                "rating": review.rating,
                "comment": review.comment,
                "created_at": review.created_at,
            },
            "message": "Thank you for your review!",
        })),
    ))
}
