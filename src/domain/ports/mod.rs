use crate::domain::models::{
    company::{Company, NewCompany},
    credential::{OtpCode, PasswordResetToken, UnverifiedUser},
    event::{Attachment, Event, EventFilter, EventWithCount, NewAttachment, NewEvent},
    participation::{Confirmation, NewParticipation, ParticipantEntry, ParticipationRecord},
    user::{NewUser, OrganizerProfile, ParticipantProfile, Role, User},
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &NewUser) -> Result<User, AppError>;
    /// Creates the user together with the profile matching its role, in one
    /// transaction.
    async fn create_with_profile(&self, user: &NewUser) -> Result<User, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;
    async fn list(&self) -> Result<Vec<User>, AppError>;
    async fn update_role(&self, id: i64, role: Role) -> Result<User, AppError>;
    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), AppError>;
    async fn update_name(&self, id: i64, name: &str) -> Result<(), AppError>;
    async fn delete(&self, id: i64) -> Result<(), AppError>;

    async fn find_organizer_profile(&self, user_id: i64) -> Result<Option<OrganizerProfile>, AppError>;
    async fn find_organizer_profile_by_id(&self, id: i64) -> Result<Option<OrganizerProfile>, AppError>;
    async fn find_participant_profile(&self, user_id: i64) -> Result<Option<ParticipantProfile>, AppError>;
    async fn create_organizer_profile(&self, user_id: i64, name: &str) -> Result<OrganizerProfile, AppError>;
    async fn create_participant_profile(&self, user_id: i64, name: &str) -> Result<ParticipantProfile, AppError>;
    async fn rename_organizer_profile(&self, user_id: i64, name: &str) -> Result<OrganizerProfile, AppError>;
    async fn rename_participant_profile(&self, user_id: i64, name: &str) -> Result<ParticipantProfile, AppError>;
    async fn find_user_by_participant(&self, participant_id: i64) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait AuthRepository: Send + Sync {
    /// Drops any pending signup for the email and stages a new one.
    async fn replace_unverified(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
        role: Role,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError>;
    async fn find_unverified_by_token(&self, token: &str) -> Result<Option<UnverifiedUser>, AppError>;
    /// Moves a staged signup into a real user + role profile and deletes the
    /// staging row, all in one transaction.
    async fn promote_unverified(&self, pending: &UnverifiedUser) -> Result<User, AppError>;

    async fn replace_otp(
        &self,
        email: &str,
        code: &str,
        purpose: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError>;
    async fn find_valid_otp(&self, email: &str, code: &str) -> Result<Option<OtpCode>, AppError>;
    async fn consume_otp(&self, id: i64) -> Result<(), AppError>;

    async fn create_reset_token(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError>;
    async fn find_valid_reset_token(&self, token_hash: &str) -> Result<Option<PasswordResetToken>, AppError>;
    /// Updates the password and burns the token in one transaction.
    async fn reset_password(&self, token_id: i64, user_id: i64, password_hash: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait CompanyRepository: Send + Sync {
    /// Inserts the company and attaches the owner as an organizer member.
    async fn create(&self, company: &NewCompany) -> Result<Company, AppError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Company>, AppError>;
    async fn list(&self) -> Result<Vec<Company>, AppError>;
    async fn update(&self, id: i64, name: Option<&str>, description: Option<&str>) -> Result<Company, AppError>;
    async fn delete(&self, id: i64) -> Result<(), AppError>;
    async fn add_organizer(&self, company_id: i64, organizer_id: i64) -> Result<(), AppError>;
    async fn list_organizers(&self, company_id: i64) -> Result<Vec<OrganizerProfile>, AppError>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(&self, event: &NewEvent, attachments: &[NewAttachment]) -> Result<Event, AppError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<EventWithCount>, AppError>;
    async fn list(&self, filter: &EventFilter) -> Result<(Vec<EventWithCount>, i64), AppError>;
    /// Full-replace update: attachments are deleted and recreated from the
    /// provided set.
    async fn update(&self, event: &Event, attachments: &[NewAttachment]) -> Result<Event, AppError>;
    async fn list_attachments(&self, event_id: i64) -> Result<Vec<Attachment>, AppError>;
    async fn delete(&self, id: i64) -> Result<(), AppError>;
    /// ACTIVE events past their end date become COMPLETED. Returns the
    /// number of rows transitioned.
    async fn mark_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}

#[async_trait]
pub trait ParticipationRepository: Send + Sync {
    /// Insert backed by the (event_id, participant_id) unique constraint;
    /// a duplicate surfaces as Conflict, never a second row. A record
    /// entering as CONFIRMED is seat-gated inside the same transaction,
    /// with the confirmed count read under the event row lock.
    async fn create(&self, record: &NewParticipation) -> Result<ParticipationRecord, AppError>;
    async fn find(&self, event_id: i64, participant_id: i64) -> Result<Option<ParticipationRecord>, AppError>;
    async fn count_confirmed(&self, event_id: i64) -> Result<i64, AppError>;
    async fn list_by_event(&self, event_id: i64) -> Result<Vec<ParticipantEntry>, AppError>;
    /// Capacity-gated PENDING -> CONFIRMED transition, atomic with the
    /// confirmed-count read. Re-approval of a CONFIRMED record is reported
    /// as `Confirmation::AlreadyConfirmed` without touching the row.
    async fn approve(&self, event_id: i64, record_id: i64) -> Result<(ParticipationRecord, Confirmation), AppError>;
}

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        text_body: &str,
        html_body: Option<&str>,
    ) -> Result<(), AppError>;
}
