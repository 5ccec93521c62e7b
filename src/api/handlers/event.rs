use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use crate::api::dtos::requests::{CreateEventRequest, EventListQuery, JoinEventRequest, UpdateEventRequest};
use crate::api::dtos::responses::{
    ApproveResponse, EventListItem, JoinResponse, MarkExpiredResponse, PaginatedEvents,
};
use crate::api::extractors::auth::AuthUser;
use crate::api::extractors::json::AppJson;
use crate::domain::models::event::{
    AttachmentType, Event, EventFilter, EventMode, EventStatus, NewAttachment, NewEvent, StatusFilter,
};
use crate::domain::models::participation::{Confirmation, NewParticipation, ParticipationStatus};
use crate::domain::models::user::Role;
use crate::domain::services::notification::build_approval_mail;
use crate::error::AppError;
use crate::state::AppState;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 50;

pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let status = StatusFilter::from_query(query.status.as_deref().unwrap_or("active"));
    let page = query.page.unwrap_or(1).max(1);
    let page_size = query
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let filter = EventFilter {
        status,
        search: query.search.filter(|s| !s.trim().is_empty()),
        page,
        page_size,
    };

    let (events, total) = state.event_repo.list(&filter).await?;

    let mut items = Vec::with_capacity(events.len());
    for event in events {
        let attachments = state.event_repo.list_attachments(event.event.id).await?;
        items.push(EventListItem { event, attachments });
    }

    Ok(Json(PaginatedEvents {
        items,
        total,
        page,
        page_size,
    }))
}

pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let event = state
        .event_repo
        .find_by_id(event_id)
        .await?
        .ok_or(AppError::NotFound("Event not found".into()))?;

    let attachments = state.event_repo.list_attachments(event_id).await?;

    Ok(Json(serde_json::json!({
        "event": event,
        "attachments": attachments,
    })))
}

fn validate_attachments(attachments: &[NewAttachment]) -> Result<(), AppError> {
    if attachments.is_empty() {
        return Err(AppError::Validation("At least one attachment is required".into()));
    }
    for att in attachments {
        if AttachmentType::parse(&att.media_type).is_none() {
            return Err(AppError::Validation(format!(
                "Invalid attachment type: {}",
                att.media_type
            )));
        }
    }
    Ok(())
}

pub async fn create_event(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    AppJson(payload): AppJson<CreateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_role(&[Role::Admin, Role::Organizer])?;

    let profile = state
        .user_repo
        .find_organizer_profile(auth.id)
        .await?
        .ok_or(AppError::Validation("Organizer profile required".into()))?;
    let company_id = profile
        .company_id
        .ok_or(AppError::Validation("Organizer must belong to a company".into()))?;

    let mode = EventMode::parse(&payload.mode)
        .ok_or(AppError::Validation("Invalid event mode".into()))?;
    if payload.start_date >= payload.end_date {
        return Err(AppError::Validation("start_date must be before end_date".into()));
    }
    validate_attachments(&payload.attachments)?;

    let event = state
        .event_repo
        .create(
            &NewEvent {
                title: payload.title,
                description: payload.description,
                mode,
                category: payload.category,
                venue: payload.venue,
                join_link: payload.join_link,
                contact_info: payload.contact_info,
                total_seats: payload.total_seats,
                requires_approval: payload.requires_approval,
                join_questions: payload.join_questions,
                start_date: payload.start_date,
                end_date: payload.end_date,
                organizer_id: profile.id,
                company_id,
            },
            &payload.attachments,
        )
        .await?;

    info!("Event {} created by organizer {}", event.id, profile.id);

    Ok((StatusCode::CREATED, Json(event)))
}

async fn require_event_owner_or_admin(
    state: &AppState,
    auth: &AuthUser,
    event_id: i64,
) -> Result<Event, AppError> {
    auth.require_role(&[Role::Admin, Role::Organizer])?;

    let event = state
        .event_repo
        .find_by_id(event_id)
        .await?
        .ok_or(AppError::NotFound("Event not found".into()))?
        .event;

    if auth.role == Role::Organizer {
        let profile = state
            .user_repo
            .find_organizer_profile(auth.id)
            .await?
            .ok_or(AppError::Forbidden("Organizer profile required".into()))?;
        if profile.id != event.organizer_id {
            return Err(AppError::Forbidden("Not the event organizer".into()));
        }
    }

    Ok(event)
}

pub async fn update_event(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(event_id): Path<i64>,
    AppJson(payload): AppJson<UpdateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut event = require_event_owner_or_admin(&state, &auth, event_id).await?;

    if let Some(title) = payload.title {
        event.title = title;
    }
    if let Some(description) = payload.description {
        event.description = description;
    }
    if let Some(mode) = payload.mode {
        EventMode::parse(&mode).ok_or(AppError::Validation("Invalid event mode".into()))?;
        event.mode = mode;
    }
    if let Some(status) = payload.status {
        EventStatus::parse(&status).ok_or(AppError::Validation("Invalid event status".into()))?;
        event.status = status;
    }
    if payload.category.is_some() {
        event.category = payload.category;
    }
    if payload.venue.is_some() {
        event.venue = payload.venue;
    }
    if payload.join_link.is_some() {
        event.join_link = payload.join_link;
    }
    if payload.contact_info.is_some() {
        event.contact_info = payload.contact_info;
    }
    if payload.total_seats.is_some() {
        event.total_seats = payload.total_seats;
    }
    if let Some(requires_approval) = payload.requires_approval {
        event.requires_approval = requires_approval;
    }
    if let Some(questions) = payload.join_questions {
        event.join_questions = Some(sqlx::types::Json(questions));
    }
    if let Some(start_date) = payload.start_date {
        event.start_date = start_date;
    }
    if let Some(end_date) = payload.end_date {
        event.end_date = end_date;
    }
    if event.start_date >= event.end_date {
        return Err(AppError::Validation("start_date must be before end_date".into()));
    }

    let attachments = match payload.attachments {
        Some(replacement) => {
            validate_attachments(&replacement)?;
            replacement
        }
        None => state
            .event_repo
            .list_attachments(event_id)
            .await?
            .into_iter()
            .map(|a| NewAttachment {
                url: a.url,
                public_id: a.public_id,
                media_type: a.media_type,
            })
            .collect(),
    };

    let updated = state.event_repo.update(&event, &attachments).await?;
    Ok(Json(updated))
}

pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(event_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    require_event_owner_or_admin(&state, &auth, event_id).await?;
    state.event_repo.delete(event_id).await?;
    info!("Deleted event {}", event_id);
    Ok(Json(serde_json::json!({ "message": "Event deleted" })))
}

/// Batch transition of ACTIVE events whose end date has passed.
pub async fn mark_expired(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let updated = state.event_repo.mark_expired(Utc::now()).await?;
    if updated > 0 {
        info!("Marked {} events as completed", updated);
    }
    Ok(Json(MarkExpiredResponse { updated }))
}

pub async fn join_event(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(event_id): Path<i64>,
    AppJson(payload): AppJson<JoinEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    let profile = state
        .user_repo
        .find_participant_profile(auth.id)
        .await?
        .ok_or(AppError::Validation("Participant profile required".into()))?;

    let event = state
        .event_repo
        .find_by_id(event_id)
        .await?
        .ok_or(AppError::NotFound("Event not found".into()))?;

    if event.event.end_date < Utc::now() {
        return Err(AppError::EventEnded);
    }

    // Open events confirm on insert; the repo runs the seat gate inside the
    // insert transaction. Approval-gated events queue PENDING rows and get
    // gated at approval time instead.
    let status = if event.event.requires_approval {
        ParticipationStatus::Pending
    } else {
        ParticipationStatus::Confirmed
    };

    let participation = state
        .participation_repo
        .create(&NewParticipation {
            event_id,
            participant_id: profile.id,
            status,
            answers: payload.answers,
        })
        .await?;

    info!(
        "Participant {} joined event {} as {}",
        profile.id,
        event_id,
        status.as_str()
    );

    Ok((StatusCode::CREATED, Json(JoinResponse { participation })))
}

pub async fn list_participants(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(event_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    require_event_owner_or_admin(&state, &auth, event_id).await?;
    let participants = state.participation_repo.list_by_event(event_id).await?;
    Ok(Json(participants))
}

pub async fn approve_participant(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((event_id, record_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let event = require_event_owner_or_admin(&state, &auth, event_id).await?;

    let (participation, confirmation) = state
        .participation_repo
        .approve(event_id, record_id)
        .await?;

    let notification_sent = match confirmation {
        Confirmation::AlreadyConfirmed => false,
        Confirmation::NewlyConfirmed => {
            send_approval_mail(&state, &event, participation.participant_id).await
        }
    };

    Ok(Json(ApproveResponse {
        participation,
        notification_sent,
    }))
}

/// Degraded-success contract: the confirmation is already committed, so a
/// failed mail only flips `notification_sent`.
async fn send_approval_mail(state: &AppState, event: &Event, participant_id: i64) -> bool {
    let result = async {
        let organizer = state
            .user_repo
            .find_organizer_profile_by_id(event.organizer_id)
            .await?
            .ok_or(AppError::NotFound("Organizer profile not found".into()))?;
        let company = state
            .company_repo
            .find_by_id(event.company_id)
            .await?
            .ok_or(AppError::NotFound("Company not found".into()))?;
        let participant = state
            .user_repo
            .find_user_by_participant(participant_id)
            .await?
            .ok_or(AppError::NotFound("Participant not found".into()))?;

        let mail = build_approval_mail(
            &state.templates,
            event,
            &organizer.name,
            &company.name,
            participant.display_name(),
        )?;

        state
            .email_service
            .send(
                &participant.email,
                &mail.subject,
                &mail.text_body,
                Some(&mail.html_body),
            )
            .await
    }
    .await;

    match result {
        Ok(()) => true,
        Err(e) => {
            warn!(
                "Approval notification for event {} participant {} failed: {:?}",
                event.id, participant_id, e
            );
            false
        }
    }
}
