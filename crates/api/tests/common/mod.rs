//! Router test harness: a migrated in-memory database, a fixed clock and
//! helpers to issue JSON requests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use libris_api::{AppState, create_router};
use libris_core::auth::validate_registration;
use libris_core::lending::{FixedClock, LendingPolicy, LendingService};
use libris_db::UserRepository;
use libris_db::migration::{Migrator, MigratorTrait};
use libris_shared::{JwtConfig, JwtService};

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).expect("valid date")
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub clock: Arc<FixedClock>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_policy(LendingPolicy::default()).await
    }

    pub async fn with_policy(policy: LendingPolicy) -> Self {
        let db = libris_db::connect_with_pool("sqlite::memory:", 1, 1)
            .await
            .expect("Failed to open in-memory database");
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        let clock = Arc::new(FixedClock::new(start_date()));
        let state = AppState {
            db: Arc::new(db),
            jwt_service: Arc::new(JwtService::new(JwtConfig::default())),
            lending: LendingService::new(policy),
            clock: clock.clone(),
        };
        Self {
            router: create_router(state.clone()),
            state,
            clock,
        }
    }

    /// Registers an account directly and returns a bearer token for it.
    pub async fn token_for(&self, username: &str, is_staff: bool) -> String {
        let account = validate_registration(
            username,
            &format!("{username}@example.com"),
            "Test",
            "User",
            None,
            "password123",
            "password123",
        )
        .expect("valid registration");
        let created = UserRepository::new((*self.state.db).clone())
            .register(account, "$argon2id$test_hash".to_string(), is_staff, start_date())
            .await
            .expect("Failed to register");
        self.state
            .jwt_service
            .generate_access_token(created.user.id, is_staff)
            .expect("Failed to sign token")
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("readable body")
            .to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    /// Adds a book through the staff API and returns its id.
    pub async fn add_book(&self, staff_token: &str, title: &str, copies: i32) -> String {
        let (status, body) = self
            .post(
                "/api/v1/books",
                Some(staff_token),
                json!({ "title": title, "total_copies": copies }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().expect("book id").to_string()
    }
}
