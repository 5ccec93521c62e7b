use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;

/// Two-state participation machine. The only legal transition is
/// PENDING -> CONFIRMED, guarded by the event's seat capacity at approval
/// time. There is no way back out of CONFIRMED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipationStatus {
    Pending,
    Confirmed,
}

/// Outcome of applying the confirm transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// The record moved PENDING -> CONFIRMED; the participant must be notified.
    NewlyConfirmed,
    /// The record was already CONFIRMED; treat as no-op success, no re-notification.
    AlreadyConfirmed,
}

impl ParticipationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipationStatus::Pending => "PENDING",
            ParticipationStatus::Confirmed => "CONFIRMED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(ParticipationStatus::Pending),
            "CONFIRMED" => Some(ParticipationStatus::Confirmed),
            _ => None,
        }
    }

    pub fn confirm(self) -> Confirmation {
        match self {
            ParticipationStatus::Pending => Confirmation::NewlyConfirmed,
            ParticipationStatus::Confirmed => Confirmation::AlreadyConfirmed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_confirms_once() {
        assert_eq!(ParticipationStatus::Pending.confirm(), Confirmation::NewlyConfirmed);
        assert_eq!(ParticipationStatus::Confirmed.confirm(), Confirmation::AlreadyConfirmed);
    }

    #[test]
    fn unknown_status_does_not_parse() {
        assert_eq!(ParticipationStatus::parse("CANCELLED"), None);
        assert_eq!(ParticipationStatus::parse("pending"), None);
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct ParticipationRecord {
    pub id: i64,
    pub event_id: i64,
    pub participant_id: i64,
    pub status: String,
    pub answers: Option<Json<serde_json::Value>>,
    pub created_at: DateTime<Utc>,
}

pub struct NewParticipation {
    pub event_id: i64,
    pub participant_id: i64,
    pub status: ParticipationStatus,
    pub answers: Option<serde_json::Value>,
}

/// Participation row joined with the participant's profile and user for
/// the organizer-facing listing.
#[derive(Debug, Serialize, FromRow, Clone)]
pub struct ParticipantEntry {
    pub id: i64,
    pub event_id: i64,
    pub participant_id: i64,
    pub status: String,
    pub answers: Option<Json<serde_json::Value>>,
    pub created_at: DateTime<Utc>,
    pub participant_name: String,
    pub user_id: i64,
    pub email: String,
}
