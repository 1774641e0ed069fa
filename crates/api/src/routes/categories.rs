//! Category routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::{AppState, middleware::auth::StaffUser};
use libris_core::catalog::CategoryInput;
use libris_db::CategoryRepository;
use libris_db::entities::categories;
use libris_shared::types::CategoryId;

/// Creates the public category routes.
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/categories", get(list_categories))
}

/// Creates the staff category routes (requires auth middleware).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", post(create_category))
        .route(
            "/categories/{category_id}",
            put(update_category).delete(delete_category),
        )
}

/// Request body for creating or replacing a category.
#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    /// Unique name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
}

/// A category in the listing.
#[derive(Debug, Serialize)]
pub struct CategoryListItem {
    /// Category row.
    #[serde(flatten)]
    pub category: categories::Model,
    /// Books in this category.
    pub book_count: u64,
}

fn repo(state: &AppState) -> CategoryRepository {
    CategoryRepository::new((*state.db).clone())
}

/// GET `/categories` - Categories by name with book counts.
async fn list_categories(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<CategoryListItem>>> {
    let categories = repo(&state).list_with_counts().await?;
    Ok(Json(
        categories
            .into_iter()
            .map(|c| CategoryListItem {
                category: c.category,
                book_count: c.book_count,
            })
            .collect(),
    ))
}

/// POST `/categories` - Create a category (staff).
async fn create_category(
    State(state): State<AppState>,
    _staff: StaffUser,
    Json(payload): Json<CategoryRequest>,
) -> ApiResult<impl IntoResponse> {
    let input = CategoryInput::new(&payload.name, payload.description.as_deref())?;
    Ok((StatusCode::CREATED, Json(repo(&state).create(input).await?)))
}

/// PUT `/categories/{category_id}` - Replace a category (staff).
async fn update_category(
    State(state): State<AppState>,
    _staff: StaffUser,
    Path(category_id): Path<CategoryId>,
    Json(payload): Json<CategoryRequest>,
) -> ApiResult<impl IntoResponse> {
    let input = CategoryInput::new(&payload.name, payload.description.as_deref())?;
    Ok(Json(repo(&state).update(category_id, input).await?))
}

/// DELETE `/categories/{category_id}` - Delete a category; its books stay (staff).
async fn delete_category(
    State(state): State<AppState>,
    _staff: StaffUser,
    Path(category_id): Path<CategoryId>,
) -> ApiResult<impl IntoResponse> {
    repo(&state).delete(category_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
