//! The signed-in user's own profile.

use axum::{Json, Router, extract::State, routing::get};
use chrono::NaiveDate;
use serde::Serialize;

use super::auth::user_info;
use crate::error::{ApiError, ApiResult};
use crate::{AppState, middleware::auth::AuthUser};
use libris_core::auth::{hash_password, validate_profile_update};
use libris_core::dashboard::ProfileStats;
use libris_db::UserRepository;
use libris_db::repositories::UserWithProfile;
use libris_shared::AppError;
use libris_shared::auth::{UpdateProfileRequest, UserInfo};

/// Creates the profile routes (requires auth middleware).
pub fn routes() -> Router<AppState> {
    Router::new().route("/me/profile", get(get_profile).patch(update_profile))
}

/// Profile response.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    /// Account.
    pub user: UserInfo,
    /// Phone from the student profile.
    pub phone: String,
    /// Date the profile was created.
    pub joined_date: Option<NaiveDate>,
    /// Borrowing statistics.
    pub stats: ProfileStats,
}

impl ProfileResponse {
    fn new(account: &UserWithProfile, stats: ProfileStats) -> Self {
        Self {
            user: user_info(&account.user),
            phone: account
                .profile
                .as_ref()
                .map(|p| p.phone.clone())
                .unwrap_or_default(),
            joined_date: account.profile.as_ref().map(|p| p.joined_date),
            stats,
        }
    }
}

/// GET `/me/profile` - Your account, profile and borrowing stats.
async fn get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ProfileResponse>> {
    let repo = UserRepository::new((*state.db).clone());
    let account = repo
        .find_with_profile(auth.user_id())
        .await?
        .ok_or_else(|| ApiError(AppError::NotFound("User not found".to_string())))?;
    let stats = repo.profile_stats(auth.user_id()).await?;
    Ok(Json(ProfileResponse::new(&account, stats)))
}

/// PATCH `/me/profile` - Update names, email, phone or password.
async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    let changes = validate_profile_update(
        payload.first_name.as_deref(),
        payload.last_name.as_deref(),
        payload.email.as_deref(),
        payload.phone.as_deref(),
        payload.new_password.as_deref(),
        payload.confirm_password.as_deref(),
    )?;
    let new_hash = changes
        .new_password
        .as_deref()
        .map(hash_password)
        .transpose()?;

    let repo = UserRepository::new((*state.db).clone());
    let account = repo
        .update_profile(auth.user_id(), changes, new_hash, state.today())
        .await?;
    let stats = repo.profile_stats(auth.user_id()).await?;
    Ok(Json(ProfileResponse::new(&account, stats)))
}
