use serde::Serialize;
use crate::domain::models::{
    event::{Attachment, EventWithCount},
    participation::ParticipationRecord,
    user::User,
};

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
    pub profile_id: Option<i64>,
    pub company_id: Option<i64>,
}

#[derive(Serialize)]
pub struct OtpVerifyResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
}

#[derive(Serialize)]
pub struct EventListItem {
    #[serde(flatten)]
    pub event: EventWithCount,
    pub attachments: Vec<Attachment>,
}

#[derive(Serialize)]
pub struct PaginatedEvents {
    pub items: Vec<EventListItem>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

#[derive(Serialize)]
pub struct JoinResponse {
    pub participation: ParticipationRecord,
}

#[derive(Serialize)]
pub struct ApproveResponse {
    pub participation: ParticipationRecord,
    pub notification_sent: bool,
}

#[derive(Serialize)]
pub struct MarkExpiredResponse {
    pub updated: u64,
}
