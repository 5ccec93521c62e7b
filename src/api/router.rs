use axum::{
    body::Body,
    extract::Request,
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{auth, company, event, health, user};
use tower_http::{
    classify::ServerErrorsFailureClass,
    trace::TraceLayer,
};
use tracing::{error, info, info_span, Span};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Auth
        .route("/api/v1/auth/signup", post(auth::signup))
        .route("/api/v1/auth/verify", get(auth::verify))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/otp/send", post(auth::otp_send))
        .route("/api/v1/auth/otp/verify", post(auth::otp_verify))
        .route("/api/v1/auth/password/request-reset", post(auth::request_reset))
        .route("/api/v1/auth/password/reset", post(auth::reset_password))

        // Users
        .route("/api/v1/users", get(user::list_users))
        .route("/api/v1/users/{id}/role", patch(user::update_role))
        .route("/api/v1/users/{id}", delete(user::delete_user))
        .route("/api/v1/users/me", patch(user::update_me))
        .route("/api/v1/users/me/change-password", post(user::change_password))

        // Companies
        .route("/api/v1/companies", get(company::list_companies).post(company::create_company))
        .route("/api/v1/companies/{id}", get(company::get_company).put(company::update_company).delete(company::delete_company))
        .route("/api/v1/companies/invite-organizer", post(company::invite_organizer))

        // Events
        .route("/api/v1/events", get(event::list_events).post(event::create_event))
        .route("/api/v1/events/mark-expired", patch(event::mark_expired))
        .route("/api/v1/events/{id}", get(event::get_event).patch(event::update_event).delete(event::delete_event))
        .route("/api/v1/events/{id}/join", post(event::join_event))
        .route("/api/v1/events/{id}/participants", get(event::list_participants))
        .route("/api/v1/events/{id}/participants/{pid}/approve", post(event::approve_participant))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}
