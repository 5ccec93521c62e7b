mod common;

use axum::http::StatusCode;
use common::{parse_body, TestApp};
use event_backend::domain::models::user::Role;
use serde_json::json;

async fn stored_code(app: &TestApp, email: &str) -> String {
    sqlx::query_scalar("SELECT code FROM otp_codes WHERE email = ? ORDER BY id DESC")
        .bind(email)
        .fetch_one(&app.pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_otp_signup_creates_participant() {
    let app = TestApp::new().await;

    let res = app
        .request(
            "POST",
            "/api/v1/auth/otp/send",
            None,
            Some(json!({ "email": "new@example.com", "purpose": "SIGNUP" })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(app.sent_mails().len(), 1);

    let code = stored_code(&app, "new@example.com").await;
    let res = app
        .request(
            "POST",
            "/api/v1/auth/otp/verify",
            None,
            Some(json!({ "email": "new@example.com", "code": code })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert!(body["token"].as_str().is_some());

    // The account exists with the participant profile.
    let role: String = sqlx::query_scalar("SELECT role FROM users WHERE email = ?")
        .bind("new@example.com")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(role, "PARTICIPANT");
}

#[tokio::test]
async fn test_otp_signup_existing_email_conflicts() {
    let app = TestApp::new().await;
    app.seed_user("here@example.com", Role::Participant).await;

    let res = app
        .request(
            "POST",
            "/api/v1/auth/otp/send",
            None,
            Some(json!({ "email": "here@example.com", "purpose": "SIGNUP" })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_otp_login_unknown_user_not_found() {
    let app = TestApp::new().await;

    let res = app
        .request(
            "POST",
            "/api/v1/auth/otp/send",
            None,
            Some(json!({ "email": "ghost@example.com", "purpose": "LOGIN" })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_otp_reset_does_not_leak_existence() {
    let app = TestApp::new().await;

    let res = app
        .request(
            "POST",
            "/api/v1/auth/otp/send",
            None,
            Some(json!({ "email": "ghost@example.com", "purpose": "RESET" })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    // No code issued, no mail sent.
    assert!(app.sent_mails().is_empty());
}

#[tokio::test]
async fn test_otp_is_single_use() {
    let app = TestApp::new().await;
    app.seed_user("once@example.com", Role::Participant).await;

    app.request(
        "POST",
        "/api/v1/auth/otp/send",
        None,
        Some(json!({ "email": "once@example.com", "purpose": "LOGIN" })),
    )
    .await;

    let code = stored_code(&app, "once@example.com").await;
    let payload = json!({ "email": "once@example.com", "code": code });

    let first = app
        .request("POST", "/api/v1/auth/otp/verify", None, Some(payload.clone()))
        .await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .request("POST", "/api/v1/auth/otp/verify", None, Some(payload))
        .await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_password_reset_flow_and_single_use_token() {
    let app = TestApp::new().await;
    let (user_id, _) = app.seed_user("reset@example.com", Role::Participant).await;

    let res = app
        .request(
            "POST",
            "/api/v1/auth/password/request-reset",
            None,
            Some(json!({ "email": "reset@example.com" })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(app.sent_mails().len(), 1);

    // Only the hash is at rest; mint a fresh raw token through the same path
    // the handler uses so we can exercise the reset endpoint.
    let raw = "known-test-token";
    let hash = app.state.auth_service.hash_token(raw);
    app.state
        .auth_repo
        .create_reset_token(user_id, &hash, chrono::Utc::now() + chrono::Duration::hours(1))
        .await
        .unwrap();

    // Same password is rejected.
    let res = app
        .request(
            "POST",
            "/api/v1/auth/password/reset",
            None,
            Some(json!({ "token": raw, "password": "password123" })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = app
        .request(
            "POST",
            "/api/v1/auth/password/reset",
            None,
            Some(json!({ "token": raw, "password": "brand-new-password" })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    // Token burned; second use fails.
    let res = app
        .request(
            "POST",
            "/api/v1/auth/password/reset",
            None,
            Some(json!({ "token": raw, "password": "another-password" })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // New password works, old one doesn't.
    let res = app
        .request(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "reset@example.com", "password": "brand-new-password" })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .request(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "reset@example.com", "password": "password123" })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_request_reset_unknown_email_is_generic() {
    let app = TestApp::new().await;

    let res = app
        .request(
            "POST",
            "/api/v1/auth/password/request-reset",
            None,
            Some(json!({ "email": "ghost@example.com" })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(app.sent_mails().is_empty());
}
