//! Book catalog routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::borrowing::BorrowResponse;
use super::reviews::ReviewResponse;
use crate::error::{ApiError, ApiResult};
use crate::{
    AppState,
    middleware::auth::{AuthUser, StaffUser},
};
use libris_core::catalog::{BookInput, BookSort};
use libris_core::dashboard::BookCard;
use libris_db::entities::{authors, books, categories};
use libris_db::repositories::{BookDetail, BookQuery, BookRepository};
use libris_shared::AppError;
use libris_shared::types::{AuthorId, BookId, CategoryId, PageRequest, PageResponse};

/// Books per page in the catalog listing.
pub const BOOKS_PER_PAGE: u32 = 9;

/// Creates the public book routes.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/books", get(list_books))
        .route("/books/{book_id}", get(get_book))
}

/// Creates the authenticated book routes (requires auth middleware).
///
/// Writes are additionally limited to staff by the handlers.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/books", post(create_book))
        .route("/books/{book_id}", put(update_book).delete(delete_book))
        .route("/books/{book_id}/me", get(viewer_context))
}

/// Query parameters for the book listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListBooksQuery {
    /// Case-insensitive match on title or author name.
    pub q: Option<String>,
    /// Only books in this category.
    pub category: Option<CategoryId>,
    /// `newest` (default), `oldest` or `rating`.
    pub sort: Option<String>,
    /// 1-based page number.
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// Request body for creating or replacing a book.
#[derive(Debug, Deserialize)]
pub struct BookRequest {
    /// Title.
    pub title: String,
    /// Author.
    pub author_id: Option<AuthorId>,
    /// Category.
    pub category_id: Option<CategoryId>,
    /// Description.
    pub description: Option<String>,
    /// ISBN; blank means none.
    pub isbn: Option<String>,
    /// Page count.
    pub pages: Option<i32>,
    /// Language; defaults to English.
    pub language: Option<String>,
    /// Copies owned.
    pub total_copies: i32,
    /// Copies on the shelf; defaults to `total_copies` on create.
    pub available_copies: Option<i32>,
    /// Publication date.
    pub published_date: Option<NaiveDate>,
}

impl BookRequest {
    fn into_input(self, default_available: i32) -> Result<BookInput, ApiError> {
        Ok(BookInput::new(
            &self.title,
            self.author_id,
            self.category_id,
            self.description.as_deref(),
            self.isbn.as_deref(),
            self.pages,
            self.language.as_deref(),
            self.total_copies,
            self.available_copies.unwrap_or(default_available),
            self.published_date,
        )?)
    }
}

/// A book with everything the detail page shows.
#[derive(Debug, Serialize)]
pub struct BookDetailResponse {
    /// Book row.
    #[serde(flatten)]
    pub book: books::Model,
    /// Author, if any.
    pub author: Option<authors::Model>,
    /// Category, if any.
    pub category: Option<categories::Model>,
    /// Mean rating at 2 dp; `null` when unreviewed.
    pub average_rating: Option<Decimal>,
    /// At least one copy on the shelf.
    pub is_available: bool,
    /// Reviews, newest first.
    pub reviews: Vec<ReviewResponse>,
}

/// GET `/books` - Search, filter, sort and paginate the catalog.
async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<ListBooksQuery>,
) -> ApiResult<Json<PageResponse<BookCard>>> {
    let sort = match query.sort.as_deref().filter(|s| !s.is_empty()) {
        Some(sort) => sort.parse::<BookSort>()?,
        None => BookSort::default(),
    };
    let filter = BookQuery {
        q: query.q,
        category: query.category,
        sort,
    };
    let page = PageRequest::from_query(query.page, query.per_page, BOOKS_PER_PAGE);

    let books = BookRepository::new((*state.db).clone())
        .list(&filter, page)
        .await?;
    Ok(Json(books))
}

async fn load_detail(state: &AppState, book_id: BookId) -> ApiResult<BookDetail> {
    BookRepository::new((*state.db).clone())
        .find_detail(book_id)
        .await?
        .ok_or_else(|| ApiError(AppError::NotFound("Book not found".to_string())))
}

/// GET `/books/{book_id}` - Book detail with rating and reviews.
async fn get_book(
    State(state): State<AppState>,
    Path(book_id): Path<BookId>,
) -> ApiResult<Json<BookDetailResponse>> {
    let detail = load_detail(&state, book_id).await?;
    let reviews = state.reviews().for_book(book_id).await?;

    Ok(Json(BookDetailResponse {
        is_available: detail.is_available(),
        book: detail.book,
        author: detail.author,
        category: detail.category,
        average_rating: detail.average_rating,
        reviews: reviews.into_iter().map(ReviewResponse::from).collect(),
    }))
}

/// GET `/books/{book_id}/me` - Your relationship with a book.
async fn viewer_context(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(book_id): Path<BookId>,
) -> ApiResult<impl IntoResponse> {
    load_detail(&state, book_id).await?;
    let today = state.today();
    let borrows = state.borrows();
    let student_id = auth.user_id();

    let active_borrow = borrows
        .active_for_student_book(student_id, book_id)
        .await?
        .map(|d| BorrowResponse::from_details(d, today));
    let eligibility = borrows.review_eligibility(student_id, book_id).await?;
    let review = state.reviews().find_for(student_id, book_id).await?;

    Ok(Json(json!({
        "active_borrow": active_borrow,
        "review": review,
        "has_returned": eligibility.has_returned,
        "can_review": eligibility.can_review,
    })))
}

/// POST `/books` - Add a book to the catalog (staff).
async fn create_book(
    State(state): State<AppState>,
    staff: StaffUser,
    Json(payload): Json<BookRequest>,
) -> ApiResult<impl IntoResponse> {
    let total = payload.total_copies;
    let book = BookRepository::new((*state.db).clone())
        .create(payload.into_input(total)?)
        .await?;

    info!(staff_id = %staff.user_id(), book_id = %book.id, "Book added to catalog");
    Ok((StatusCode::CREATED, Json(book)))
}

/// PUT `/books/{book_id}` - Replace a book's fields (staff).
async fn update_book(
    State(state): State<AppState>,
    staff: StaffUser,
    Path(book_id): Path<BookId>,
    Json(payload): Json<BookRequest>,
) -> ApiResult<impl IntoResponse> {
    let repo = BookRepository::new((*state.db).clone());
    let current = repo
        .find_by_id(book_id)
        .await?
        .ok_or_else(|| ApiError(AppError::NotFound("Book not found".to_string())))?;
    let book = repo
        .update(book_id, payload.into_input(current.available_copies)?)
        .await?;

    info!(staff_id = %staff.user_id(), book_id = %book.id, "Book updated");
    Ok(Json(book))
}

/// DELETE `/books/{book_id}` - Remove a book with its history (staff).
async fn delete_book(
    State(state): State<AppState>,
    staff: StaffUser,
    Path(book_id): Path<BookId>,
) -> ApiResult<impl IntoResponse> {
    BookRepository::new((*state.db).clone())
        .delete(book_id)
        .await?;

    info!(staff_id = %staff.user_id(), book_id = %book_id, "Book deleted");
    Ok(StatusCode::NO_CONTENT)
}
