//! Authentication routes for registration and login.

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use tracing::info;

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use libris_core::auth::{hash_password, validate_registration, verify_password};
use libris_db::{UserRepository, entities::users};
use libris_shared::AppError;
use libris_shared::auth::{LoginRequest, LoginResponse, RegisterRequest, UserInfo};

/// Creates the auth router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
}

/// Public view of an account.
pub(crate) fn user_info(user: &users::Model) -> UserInfo {
    UserInfo {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        is_staff: user.is_staff,
    }
}

fn issue_token(state: &AppState, user: &users::Model) -> ApiResult<LoginResponse> {
    let access_token = state
        .jwt_service
        .generate_access_token(user.id, user.is_staff)?;
    Ok(LoginResponse {
        user: user_info(user),
        access_token,
        expires_in: state.jwt_service.access_token_expires_in(),
    })
}

fn invalid_credentials() -> ApiError {
    ApiError(AppError::Unauthorized("Invalid username or password".to_string()))
}

/// POST `/auth/login` - Authenticate and return an access token.
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let user_repo = UserRepository::new((*state.db).clone());

    let Some(user) = user_repo.find_by_username(payload.username.trim()).await? else {
        info!(username = %payload.username, "Login attempt for non-existent user");
        return Err(invalid_credentials());
    };

    if !user.is_active {
        return Err(ApiError(AppError::Unauthorized(
            "This account has been disabled".to_string(),
        )));
    }

    if !verify_password(&payload.password, &user.password_hash)? {
        info!(user_id = %user.id, "Failed login attempt - invalid password");
        return Err(invalid_credentials());
    }

    info!(user_id = %user.id, "User logged in successfully");

    Ok((StatusCode::OK, Json(issue_token(&state, &user)?)))
}

/// POST `/auth/register` - Create a student account and log it in.
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let account = validate_registration(
        &payload.username,
        &payload.email,
        &payload.first_name,
        &payload.last_name,
        payload.phone.as_deref(),
        &payload.password,
        &payload.password_confirm,
    )?;
    let password_hash = hash_password(&account.password)?;

    let user_repo = UserRepository::new((*state.db).clone());
    let created = user_repo
        .register(account, password_hash, false, state.today())
        .await?;

    info!(user_id = %created.user.id, username = %created.user.username, "New student registered");

    Ok((StatusCode::CREATED, Json(issue_token(&state, &created.user)?)))
}
