mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{parse_body, TestApp};
use event_backend::domain::models::user::Role;
use serde_json::json;

#[tokio::test]
async fn test_join_open_event_confirms_immediately() {
    let app = TestApp::new().await;
    let (_, org_id, company_id) = app.seed_organizer("org@example.com").await;
    let event_id = app
        .seed_event(org_id, company_id, false, Some(10), Utc::now() + Duration::days(1))
        .await;
    let (token, _) = app.seed_participant("p1@example.com").await;

    let res = app
        .request(
            "POST",
            &format!("/api/v1/events/{}/join", event_id),
            Some(&token),
            Some(json!({ "answers": {"shirt_size": "M"} })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = parse_body(res).await;
    assert_eq!(body["participation"]["status"], "CONFIRMED");
}

#[tokio::test]
async fn test_join_approval_event_stays_pending() {
    let app = TestApp::new().await;
    let (_, org_id, company_id) = app.seed_organizer("org@example.com").await;
    // One seat and approval required: the pending queue is uncapped.
    let event_id = app
        .seed_event(org_id, company_id, true, Some(1), Utc::now() + Duration::days(1))
        .await;

    for i in 0..3 {
        let (token, _) = app.seed_participant(&format!("p{}@example.com", i)).await;
        let res = app
            .request(
                "POST",
                &format!("/api/v1/events/{}/join", event_id),
                Some(&token),
                None,
            )
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body = parse_body(res).await;
        assert_eq!(body["participation"]["status"], "PENDING");
    }
}

#[tokio::test]
async fn test_duplicate_join_conflicts() {
    let app = TestApp::new().await;
    let (_, org_id, company_id) = app.seed_organizer("org@example.com").await;
    let event_id = app
        .seed_event(org_id, company_id, false, None, Utc::now() + Duration::days(1))
        .await;
    let (token, _) = app.seed_participant("p1@example.com").await;

    let first = app
        .request("POST", &format!("/api/v1/events/{}/join", event_id), Some(&token), None)
        .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app
        .request("POST", &format!("/api/v1/events/{}/join", event_id), Some(&token), None)
        .await;
    assert_eq!(second.status(), StatusCode::CONFLICT);

    // Still exactly one row.
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM event_participants WHERE event_id = ?")
        .bind(event_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_concurrent_duplicate_join_one_wins() {
    let app = TestApp::new().await;
    let (_, org_id, company_id) = app.seed_organizer("org@example.com").await;
    let event_id = app
        .seed_event(org_id, company_id, false, None, Utc::now() + Duration::days(1))
        .await;
    let (token, _) = app.seed_participant("p1@example.com").await;

    let url = format!("/api/v1/events/{}/join", event_id);
    let (a, b) = tokio::join!(
        app.request("POST", &url, Some(&token), None),
        app.request("POST", &url, Some(&token), None),
    );

    let mut statuses = vec![a.status(), b.status()];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::CONFLICT]);
}

#[tokio::test]
async fn test_concurrent_joins_never_overfill_last_seat() {
    let app = TestApp::new().await;
    let (_, org_id, company_id) = app.seed_organizer("org@example.com").await;
    let event_id = app
        .seed_event(org_id, company_id, false, Some(1), Utc::now() + Duration::days(1))
        .await;
    let (t1, _) = app.seed_participant("p1@example.com").await;
    let (t2, _) = app.seed_participant("p2@example.com").await;

    let url = format!("/api/v1/events/{}/join", event_id);
    let (a, b) = tokio::join!(
        app.request("POST", &url, Some(&t1), None),
        app.request("POST", &url, Some(&t2), None),
    );

    let mut statuses = vec![a.status(), b.status()];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::BAD_REQUEST]);

    // Exactly one confirmation ever lands.
    let confirmed: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM event_participants WHERE event_id = ? AND status = 'CONFIRMED'",
    )
    .bind(event_id)
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(confirmed, 1);
}

#[tokio::test]
async fn test_join_finished_event_rejected() {
    let app = TestApp::new().await;
    let (_, org_id, company_id) = app.seed_organizer("org@example.com").await;
    let event_id = app
        .seed_event(org_id, company_id, false, None, Utc::now() - Duration::hours(1))
        .await;
    let (token, _) = app.seed_participant("p1@example.com").await;

    let res = app
        .request("POST", &format!("/api/v1/events/{}/join", event_id), Some(&token), None)
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = parse_body(res).await;
    assert_eq!(body["error"], "Event already finished");
}

#[tokio::test]
async fn test_join_full_event_rejected() {
    let app = TestApp::new().await;
    let (_, org_id, company_id) = app.seed_organizer("org@example.com").await;
    let event_id = app
        .seed_event(org_id, company_id, false, Some(1), Utc::now() + Duration::days(1))
        .await;

    let (t1, _) = app.seed_participant("p1@example.com").await;
    let (t2, _) = app.seed_participant("p2@example.com").await;

    let res = app
        .request("POST", &format!("/api/v1/events/{}/join", event_id), Some(&t1), None)
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = app
        .request("POST", &format!("/api/v1/events/{}/join", event_id), Some(&t2), None)
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = parse_body(res).await;
    assert_eq!(body["error"], "No seats available");
}

#[tokio::test]
async fn test_join_without_participant_profile_rejected() {
    let app = TestApp::new().await;
    let (org_token, org_id, company_id) = app.seed_organizer("org@example.com").await;
    let event_id = app
        .seed_event(org_id, company_id, false, None, Utc::now() + Duration::days(1))
        .await;

    let res = app
        .request("POST", &format!("/api/v1/events/{}/join", event_id), Some(&org_token), None)
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_join_missing_event_not_found() {
    let app = TestApp::new().await;
    let (token, _) = app.seed_participant("p1@example.com").await;

    let res = app
        .request("POST", "/api/v1/events/9999/join", Some(&token), None)
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_participant_listing_requires_organizer() {
    let app = TestApp::new().await;
    let (org_token, org_id, company_id) = app.seed_organizer("org@example.com").await;
    let event_id = app
        .seed_event(org_id, company_id, false, None, Utc::now() + Duration::days(1))
        .await;
    let (p_token, _) = app.seed_participant("p1@example.com").await;

    app.request("POST", &format!("/api/v1/events/{}/join", event_id), Some(&p_token), None)
        .await;

    let res = app
        .request("GET", &format!("/api/v1/events/{}/participants", event_id), Some(&p_token), None)
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app
        .request("GET", &format!("/api/v1/events/{}/participants", event_id), Some(&org_token), None)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["email"], "p1@example.com");
}

#[tokio::test]
async fn test_admin_can_list_participants() {
    let app = TestApp::new().await;
    let (_, org_id, company_id) = app.seed_organizer("org@example.com").await;
    let event_id = app
        .seed_event(org_id, company_id, false, None, Utc::now() + Duration::days(1))
        .await;
    let (_, admin_token) = app.seed_user("admin@example.com", Role::Admin).await;

    let res = app
        .request("GET", &format!("/api/v1/events/{}/participants", event_id), Some(&admin_token), None)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
}
