use serde::Deserialize;
use chrono::{DateTime, Utc};
use crate::domain::models::event::NewAttachment;

#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: Option<String>,
}

#[derive(Deserialize)]
pub struct VerifyQuery {
    pub token: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct OtpSendRequest {
    pub email: String,
    pub purpose: String,
}

#[derive(Deserialize)]
pub struct OtpVerifyRequest {
    pub email: String,
    pub code: String,
}

#[derive(Deserialize)]
pub struct RequestResetRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

#[derive(Deserialize)]
pub struct UpdateMeRequest {
    pub name: String,
}

#[derive(Deserialize)]
pub struct CreateCompanyRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateCompanyRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct InviteOrganizerRequest {
    pub company_id: i64,
    pub email: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: String,
    pub mode: String,
    pub category: Option<String>,
    pub venue: Option<String>,
    pub join_link: Option<String>,
    pub contact_info: Option<String>,
    pub total_seats: Option<i64>,
    #[serde(default)]
    pub requires_approval: bool,
    pub join_questions: Option<serde_json::Value>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub attachments: Vec<NewAttachment>,
}

#[derive(Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub mode: Option<String>,
    pub category: Option<String>,
    pub venue: Option<String>,
    pub join_link: Option<String>,
    pub contact_info: Option<String>,
    pub total_seats: Option<i64>,
    pub requires_approval: Option<bool>,
    pub join_questions: Option<serde_json::Value>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub attachments: Option<Vec<NewAttachment>>,
}

#[derive(Deserialize)]
pub struct EventListQuery {
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Deserialize)]
pub struct JoinEventRequest {
    pub answers: Option<serde_json::Value>,
}
