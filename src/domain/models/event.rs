use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Active,
    Completed,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Active => "ACTIVE",
            EventStatus::Completed => "COMPLETED",
            EventStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(EventStatus::Active),
            "COMPLETED" => Some(EventStatus::Completed),
            "CANCELLED" => Some(EventStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventMode {
    Online,
    Onsite,
}

impl EventMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventMode::Online => "ONLINE",
            EventMode::Onsite => "ONSITE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ONLINE" => Some(EventMode::Online),
            "ONSITE" => Some(EventMode::Onsite),
            _ => None,
        }
    }
}

/// Status category accepted by the event list endpoint. Unrecognized
/// values fall back to `active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Single(EventStatus),
    All,
}

impl StatusFilter {
    pub fn from_query(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "active" => StatusFilter::Single(EventStatus::Active),
            "completed" => StatusFilter::Single(EventStatus::Completed),
            "cancelled" => StatusFilter::Single(EventStatus::Cancelled),
            // past = completed only
            "past" => StatusFilter::Single(EventStatus::Completed),
            "all" => StatusFilter::All,
            _ => StatusFilter::Single(EventStatus::Active),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_filter_categories() {
        assert_eq!(StatusFilter::from_query("Active"), StatusFilter::Single(EventStatus::Active));
        assert_eq!(StatusFilter::from_query("past"), StatusFilter::Single(EventStatus::Completed));
        assert_eq!(StatusFilter::from_query("ALL"), StatusFilter::All);
        // Anything unrecognized falls back to active.
        assert_eq!(StatusFilter::from_query("???"), StatusFilter::Single(EventStatus::Active));
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub mode: String,
    pub category: Option<String>,
    pub venue: Option<String>,
    pub join_link: Option<String>,
    pub contact_info: Option<String>,
    pub total_seats: Option<i64>,
    pub requires_approval: bool,
    pub join_questions: Option<Json<serde_json::Value>>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: String,
    pub organizer_id: i64,
    pub company_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Event row joined with its confirmed participation count and the
/// organizer/company display names.
#[derive(Debug, Serialize, FromRow, Clone)]
pub struct EventWithCount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub event: Event,
    pub confirmed_participants: i64,
    pub organizer_name: String,
    pub company_name: String,
}

pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub mode: EventMode,
    pub category: Option<String>,
    pub venue: Option<String>,
    pub join_link: Option<String>,
    pub contact_info: Option<String>,
    pub total_seats: Option<i64>,
    pub requires_approval: bool,
    pub join_questions: Option<serde_json::Value>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub organizer_id: i64,
    pub company_id: i64,
}

/// Pagination and filtering for the public event listing.
pub struct EventFilter {
    pub status: StatusFilter,
    pub search: Option<String>,
    pub page: i64,
    pub page_size: i64,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Attachment {
    pub id: i64,
    pub event_id: i64,
    pub url: String,
    pub public_id: Option<String>,
    pub media_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentType {
    Image,
    Video,
}

impl AttachmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentType::Image => "IMAGE",
            AttachmentType::Video => "VIDEO",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "IMAGE" => Some(AttachmentType::Image),
            "VIDEO" => Some(AttachmentType::Video),
            _ => None,
        }
    }
}

/// Pre-resolved attachment descriptor. Uploads happen upstream; the core
/// only stores the resulting url/public id.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAttachment {
    pub url: String,
    pub public_id: Option<String>,
    pub media_type: String,
}
