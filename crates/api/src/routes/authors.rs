//! Author routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::{AppState, middleware::auth::StaffUser};
use libris_core::catalog::AuthorInput;
use libris_db::AuthorRepository;
use libris_db::entities::{authors, books};
use libris_shared::AppError;
use libris_shared::types::AuthorId;

/// Creates the public author routes.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/authors", get(list_authors))
        .route("/authors/{author_id}", get(get_author))
}

/// Creates the staff author routes (requires auth middleware).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/authors", post(create_author))
        .route("/authors/{author_id}", put(update_author).delete(delete_author))
}

/// Request body for creating or replacing an author.
#[derive(Debug, Deserialize)]
pub struct AuthorRequest {
    /// Name.
    pub name: String,
    /// Biography.
    pub bio: Option<String>,
}

/// An author in the listing.
#[derive(Debug, Serialize)]
pub struct AuthorListItem {
    /// Author row.
    #[serde(flatten)]
    pub author: authors::Model,
    /// Books by this author.
    pub book_count: u64,
}

/// An author with their books.
#[derive(Debug, Serialize)]
pub struct AuthorDetailResponse {
    /// Author row.
    #[serde(flatten)]
    pub author: authors::Model,
    /// Books, newest first.
    pub books: Vec<books::Model>,
}

fn repo(state: &AppState) -> AuthorRepository {
    AuthorRepository::new((*state.db).clone())
}

/// GET `/authors` - Authors by name with book counts.
async fn list_authors(State(state): State<AppState>) -> ApiResult<Json<Vec<AuthorListItem>>> {
    let authors = repo(&state).list_with_counts().await?;
    Ok(Json(
        authors
            .into_iter()
            .map(|a| AuthorListItem {
                author: a.author,
                book_count: a.book_count,
            })
            .collect(),
    ))
}

/// GET `/authors/{author_id}` - Author detail with books.
async fn get_author(
    State(state): State<AppState>,
    Path(author_id): Path<AuthorId>,
) -> ApiResult<Json<AuthorDetailResponse>> {
    let detail = repo(&state)
        .find_detail(author_id)
        .await?
        .ok_or_else(|| ApiError(AppError::NotFound("Author not found".to_string())))?;
    Ok(Json(AuthorDetailResponse {
        author: detail.author,
        books: detail.books,
    }))
}

/// POST `/authors` - Create an author (staff).
async fn create_author(
    State(state): State<AppState>,
    staff: StaffUser,
    Json(payload): Json<AuthorRequest>,
) -> ApiResult<impl IntoResponse> {
    let input = AuthorInput::new(&payload.name, payload.bio.as_deref())?;
    let author = repo(&state).create(input).await?;
    info!(staff_id = %staff.user_id(), author_id = %author.id, "Author added");
    Ok((StatusCode::CREATED, Json(author)))
}

/// PUT `/authors/{author_id}` - Replace an author (staff).
async fn update_author(
    State(state): State<AppState>,
    _staff: StaffUser,
    Path(author_id): Path<AuthorId>,
    Json(payload): Json<AuthorRequest>,
) -> ApiResult<impl IntoResponse> {
    let input = AuthorInput::new(&payload.name, payload.bio.as_deref())?;
    Ok(Json(repo(&state).update(author_id, input).await?))
}

/// DELETE `/authors/{author_id}` - Delete an author; their books stay (staff).
async fn delete_author(
    State(state): State<AppState>,
    _staff: StaffUser,
    Path(author_id): Path<AuthorId>,
) -> ApiResult<impl IntoResponse> {
    repo(&state).delete(author_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
