mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{parse_body, TestApp};
use event_backend::domain::models::user::Role;
use serde_json::json;

#[tokio::test]
async fn test_signup_verify_login_roundtrip() {
    let app = TestApp::new().await;

    let res = app
        .request(
            "POST",
            "/api/v1/auth/signup",
            None,
            Some(json!({
                "email": "alice@example.com",
                "name": "Alice",
                "password": "secret-password",
                "role": "PARTICIPANT"
            })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let mails = app.sent_mails();
    assert_eq!(mails.len(), 1);
    assert_eq!(mails[0].recipient, "alice@example.com");

    // The raw token only travels by mail; read it from the staging table.
    let token: String = sqlx::query_scalar("SELECT token FROM unverified_users WHERE email = ?")
        .bind("alice@example.com")
        .fetch_one(&app.pool)
        .await
        .unwrap();

    let res = app
        .request("GET", &format!("/api/v1/auth/verify?token={}", token), None, None)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert!(body["token"].as_str().is_some());
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert!(body["profile_id"].as_i64().is_some());

    // Staging row is gone after promotion.
    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM unverified_users")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);

    let res = app
        .request(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "alice@example.com", "password": "secret-password" })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert_eq!(body["user"]["role"], "PARTICIPANT");
}

#[tokio::test]
async fn test_expired_verification_token_is_gone() {
    let app = TestApp::new().await;

    app.request(
        "POST",
        "/api/v1/auth/signup",
        None,
        Some(json!({
            "email": "late@example.com",
            "name": "Late",
            "password": "secret-password"
        })),
    )
    .await;

    let token: String = sqlx::query_scalar("SELECT token FROM unverified_users WHERE email = ?")
        .bind("late@example.com")
        .fetch_one(&app.pool)
        .await
        .unwrap();

    sqlx::query("UPDATE unverified_users SET expires_at = ? WHERE email = ?")
        .bind(Utc::now() - Duration::minutes(5))
        .bind("late@example.com")
        .execute(&app.pool)
        .await
        .unwrap();

    let res = app
        .request("GET", &format!("/api/v1/auth/verify?token={}", token), None, None)
        .await;
    assert_eq!(res.status(), StatusCode::GONE);
}

#[tokio::test]
async fn test_signup_with_registered_email_conflicts() {
    let app = TestApp::new().await;
    app.seed_user("taken@example.com", Role::Participant).await;

    let res = app
        .request(
            "POST",
            "/api/v1/auth/signup",
            None,
            Some(json!({
                "email": "taken@example.com",
                "name": "Imposter",
                "password": "secret-password"
            })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_missing_body_fields_are_validation_errors() {
    let app = TestApp::new().await;

    // Incomplete payloads come back as the standard 400 error shape, not
    // a bare 422.
    let res = app
        .request(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "bob@example.com" })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = parse_body(res).await;
    assert!(body["error"].as_str().unwrap().contains("password"));

    let res = app
        .request("POST", "/api/v1/auth/signup", None, Some(json!({})))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_wrong_password_unauthorized() {
    let app = TestApp::new().await;
    app.seed_user("bob@example.com", Role::Participant).await;

    let res = app
        .request(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "bob@example.com", "password": "wrong" })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app
        .request(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "ghost@example.com", "password": "whatever" })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_returns_organizer_company() {
    let app = TestApp::new().await;
    let (_, _, company_id) = app.seed_organizer("owner@example.com").await;

    let res = app
        .request(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "owner@example.com", "password": "password123" })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert_eq!(body["company_id"].as_i64(), Some(company_id));
    assert!(body["profile_id"].as_i64().is_some());
}
