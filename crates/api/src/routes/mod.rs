//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth::auth_middleware};

pub mod admin;
pub mod auth;
pub mod authors;
pub mod books;
pub mod borrowing;
pub mod categories;
pub mod health;
pub mod home;
pub mod profile;
pub mod reviews;

/// Creates the API router, wrapping protected routes in the auth middleware.
///
/// Staff-only handlers also take a `StaffUser`, which answers `403` for
/// students.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(books::routes())
        .merge(borrowing::routes())
        .merge(reviews::routes())
        .merge(profile::routes())
        .merge(authors::routes())
        .merge(categories::routes())
        .merge(admin::routes())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(home::routes())
        .merge(books::public_routes())
        .merge(authors::public_routes())
        .merge(categories::public_routes())
        .merge(reviews::public_routes())
        .merge(protected_routes)
}
