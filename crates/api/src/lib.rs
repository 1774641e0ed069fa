//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes
//! - Authentication middleware
//! - Request extractors
//! - JSON error responses

pub mod error;
pub mod middleware;
pub mod routes;

use axum::Router;
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use libris_core::lending::{Clock, LendingService};
use libris_db::{BorrowRepository, ReviewRepository};
use libris_shared::JwtService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Lending rules with the configured policy.
    pub lending: LendingService,
    /// Source of "today" for due dates and overdue checks.
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Today's date according to the configured clock.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// A borrow repository bound to this state's policy.
    #[must_use]
    pub fn borrows(&self) -> BorrowRepository {
        BorrowRepository::new((*self.db).clone(), self.lending)
    }

    /// A review repository bound to this state's policy.
    #[must_use]
    pub fn reviews(&self) -> ReviewRepository {
        ReviewRepository::new((*self.db).clone(), self.lending)
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
