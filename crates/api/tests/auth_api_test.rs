//! Health, registration, login and profile endpoints.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

use common::TestApp;

fn registration(username: &str, email: &str) -> Value {
    json!({
        "username": username,
        "email": email,
        "first_name": "Ada",
        "last_name": "Lovelace",
        "password": "analytical",
        "password_confirm": "analytical",
    })
}

#[tokio::test]
async fn test_health_reports_database() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/v1/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], true);
}

#[tokio::test]
async fn test_register_then_login() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post("/api/v1/auth/register", None, registration("ada", "ada@example.com"))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["user"]["username"], "ada");
    assert_eq!(body["user"]["is_staff"], false);
    assert!(body["access_token"].as_str().is_some_and(|t| !t.is_empty()));

    let (status, body) = app
        .post(
            "/api/v1/auth/login",
            None,
            json!({ "username": "ada", "password": "analytical" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, body) = app.get("/api/v1/me/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert_eq!(body["joined_date"], "2026-03-02");
    assert_eq!(body["stats"]["total_borrowed"], 0);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let app = TestApp::new().await;
    app.post("/api/v1/auth/register", None, registration("ada", "ada@example.com"))
        .await;

    for payload in [
        json!({ "username": "ada", "password": "wrong-password" }),
        json!({ "username": "nobody", "password": "analytical" }),
    ] {
        let (status, body) = app.post("/api/v1/auth/login", None, payload).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid username or password");
    }
}

#[tokio::test]
async fn test_register_conflicts() {
    let app = TestApp::new().await;
    app.post("/api/v1/auth/register", None, registration("ada", "ada@example.com"))
        .await;

    let (status, body) = app
        .post("/api/v1/auth/register", None, registration("ada", "other@example.com"))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "username_taken");

    let (status, body) = app
        .post("/api/v1/auth/register", None, registration("grace", "ada@example.com"))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "email_taken");
}

#[tokio::test]
async fn test_register_validates_input() {
    let app = TestApp::new().await;
    let mut payload = registration("ada", "ada@example.com");
    payload["password_confirm"] = json!("different");

    let (status, body) = app.post("/api/v1/auth/register", None, payload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_profile_update() {
    let app = TestApp::new().await;
    let token = app.token_for("ada", false).await;

    let (status, body) = app
        .request(
            Method::PATCH,
            "/api/v1/me/profile",
            Some(&token),
            Some(json!({ "first_name": "Augusta", "phone": "555-0100" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["user"]["first_name"], "Augusta");
    assert_eq!(body["user"]["last_name"], "User");
    assert_eq!(body["phone"], "555-0100");
}

#[tokio::test]
async fn test_invalid_token_is_rejected() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/v1/me/profile", Some("not-a-jwt")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");
}
