//! Public home page data.

use axum::{Json, Router, extract::State, routing::get};

use crate::AppState;
use crate::error::ApiResult;
use libris_core::dashboard::HomePage;
use libris_db::DashboardRepository;

/// Creates the home route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/home", get(home))
}

/// GET `/home` - Newest and best rated books with headline totals.
async fn home(State(state): State<AppState>) -> ApiResult<Json<HomePage>> {
    let page = DashboardRepository::new((*state.db).clone()).home().await?;
    Ok(Json(page))
}
