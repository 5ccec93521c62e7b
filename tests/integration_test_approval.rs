mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{parse_body, TestApp};
use serde_json::json;

async fn join(app: &TestApp, event_id: i64, token: &str) -> i64 {
    let res = app
        .request(
            "POST",
            &format!("/api/v1/events/{}/join", event_id),
            Some(token),
            Some(json!({})),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    parse_body(res).await["participation"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_approval_confirms_and_notifies() {
    let app = TestApp::new().await;
    let (org_token, org_id, company_id) = app.seed_organizer("org@example.com").await;
    let event_id = app
        .seed_event(org_id, company_id, true, Some(5), Utc::now() + Duration::days(1))
        .await;
    let (p_token, _) = app.seed_participant("alice@example.com").await;
    let record_id = join(&app, event_id, &p_token).await;

    let res = app
        .request(
            "POST",
            &format!("/api/v1/events/{}/participants/{}/approve", event_id, record_id),
            Some(&org_token),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert_eq!(body["participation"]["status"], "CONFIRMED");
    assert_eq!(body["notification_sent"], true);

    let mails = app.sent_mails();
    assert_eq!(mails.len(), 1);
    assert_eq!(mails[0].recipient, "alice@example.com");
    assert!(mails[0].subject.contains("Rust Meetup"));
}

#[tokio::test]
async fn test_reapproval_is_noop_without_second_mail() {
    let app = TestApp::new().await;
    let (org_token, org_id, company_id) = app.seed_organizer("org@example.com").await;
    let event_id = app
        .seed_event(org_id, company_id, true, Some(5), Utc::now() + Duration::days(1))
        .await;
    let (p_token, _) = app.seed_participant("alice@example.com").await;
    let record_id = join(&app, event_id, &p_token).await;

    let uri = format!("/api/v1/events/{}/participants/{}/approve", event_id, record_id);

    let first = app.request("POST", &uri, Some(&org_token), None).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.request("POST", &uri, Some(&org_token), None).await;
    assert_eq!(second.status(), StatusCode::OK);
    let body = parse_body(second).await;
    assert_eq!(body["participation"]["status"], "CONFIRMED");
    assert_eq!(body["notification_sent"], false);

    // Exactly one mail across both calls.
    assert_eq!(app.sent_mails().len(), 1);
}

#[tokio::test]
async fn test_approval_capacity_gate() {
    let app = TestApp::new().await;
    let (org_token, org_id, company_id) = app.seed_organizer("org@example.com").await;
    // Two seats, three pending requests.
    let event_id = app
        .seed_event(org_id, company_id, true, Some(2), Utc::now() + Duration::days(1))
        .await;

    let mut record_ids = Vec::new();
    for i in 0..3 {
        let (token, _) = app.seed_participant(&format!("p{}@example.com", i)).await;
        record_ids.push(join(&app, event_id, &token).await);
    }

    for record_id in &record_ids[..2] {
        let res = app
            .request(
                "POST",
                &format!("/api/v1/events/{}/participants/{}/approve", event_id, record_id),
                Some(&org_token),
                None,
            )
            .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    // Third approval exceeds capacity.
    let res = app
        .request(
            "POST",
            &format!("/api/v1/events/{}/participants/{}/approve", event_id, record_ids[2]),
            Some(&org_token),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = parse_body(res).await;
    assert_eq!(body["error"], "No seats available");

    // The rejected record is still pending.
    let status: String = sqlx::query_scalar("SELECT status FROM event_participants WHERE id = ?")
        .bind(record_ids[2])
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(status, "PENDING");
}

#[tokio::test]
async fn test_approval_survives_mail_failure() {
    let app = TestApp::with_failing_mail().await;
    let (org_token, org_id, company_id) = app.seed_organizer("org@example.com").await;
    let event_id = app
        .seed_event(org_id, company_id, true, Some(5), Utc::now() + Duration::days(1))
        .await;
    let (p_token, _) = app.seed_participant("alice@example.com").await;
    let record_id = join(&app, event_id, &p_token).await;

    let res = app
        .request(
            "POST",
            &format!("/api/v1/events/{}/participants/{}/approve", event_id, record_id),
            Some(&org_token),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert_eq!(body["participation"]["status"], "CONFIRMED");
    assert_eq!(body["notification_sent"], false);

    // The confirmation was committed despite the mail failure.
    let status: String = sqlx::query_scalar("SELECT status FROM event_participants WHERE id = ?")
        .bind(record_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(status, "CONFIRMED");
}

#[tokio::test]
async fn test_approve_missing_record_not_found() {
    let app = TestApp::new().await;
    let (org_token, org_id, company_id) = app.seed_organizer("org@example.com").await;
    let event_id = app
        .seed_event(org_id, company_id, true, Some(5), Utc::now() + Duration::days(1))
        .await;

    let res = app
        .request(
            "POST",
            &format!("/api/v1/events/{}/participants/9999/approve", event_id),
            Some(&org_token),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unlimited_event_approval_never_gated() {
    let app = TestApp::new().await;
    let (org_token, org_id, company_id) = app.seed_organizer("org@example.com").await;
    // No seat limit at all.
    let event_id = app
        .seed_event(org_id, company_id, true, None, Utc::now() + Duration::days(1))
        .await;

    for i in 0..4 {
        let (token, _) = app.seed_participant(&format!("p{}@example.com", i)).await;
        let record_id = join(&app, event_id, &token).await;
        let res = app
            .request(
                "POST",
                &format!("/api/v1/events/{}/participants/{}/approve", event_id, record_id),
                Some(&org_token),
                None,
            )
            .await;
        assert_eq!(res.status(), StatusCode::OK);
    }
}
