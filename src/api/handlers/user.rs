use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use crate::api::dtos::requests::{ChangePasswordRequest, UpdateMeRequest, UpdateRoleRequest};
use crate::api::dtos::responses::MessageResponse;
use crate::api::extractors::auth::AuthUser;
use crate::api::extractors::json::AppJson;
use crate::api::handlers::auth::{hash_password, verify_password};
use crate::domain::models::user::Role;
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;
use tracing::info;

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    auth.require_role(&[Role::Admin])?;
    let users = state.user_repo.list().await?;
    Ok(Json(users))
}

pub async fn update_role(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(user_id): Path<i64>,
    AppJson(payload): AppJson<UpdateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_role(&[Role::Admin])?;

    let role = Role::parse(&payload.role).ok_or(AppError::Validation("Invalid role".into()))?;

    let user = state
        .user_repo
        .find_by_id(user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".into()))?;

    let updated = state.user_repo.update_role(user.id, role).await?;

    // Lazily materialize the profile the new role expects, keeping the
    // user↔profile relationship 1:1.
    match role {
        Role::Organizer => {
            if state.user_repo.find_organizer_profile(user.id).await?.is_none() {
                state
                    .user_repo
                    .create_organizer_profile(user.id, updated.display_name())
                    .await?;
            }
        }
        Role::Participant => {
            if state.user_repo.find_participant_profile(user.id).await?.is_none() {
                state
                    .user_repo
                    .create_participant_profile(user.id, updated.display_name())
                    .await?;
            }
        }
        Role::Admin => {}
    }

    info!("User {} role changed to {}", user.id, role.as_str());

    Ok(Json(updated))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_role(&[Role::Admin])?;

    if auth.id == user_id {
        return Err(AppError::Conflict("Cannot delete yourself".into()));
    }

    state.user_repo.delete(user_id).await?;
    info!("Deleted user {}", user_id);

    Ok(Json(MessageResponse {
        message: "User deleted".into(),
    }))
}

pub async fn update_me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    AppJson(payload): AppJson<UpdateMeRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Name cannot be empty".into()));
    }

    state.user_repo.update_name(auth.id, &payload.name).await?;

    // Profiles carry their own display name; keep it in sync.
    match auth.role {
        Role::Organizer => {
            if state.user_repo.find_organizer_profile(auth.id).await?.is_some() {
                state
                    .user_repo
                    .rename_organizer_profile(auth.id, &payload.name)
                    .await?;
            }
        }
        Role::Participant => {
            if state.user_repo.find_participant_profile(auth.id).await?.is_some() {
                state
                    .user_repo
                    .rename_participant_profile(auth.id, &payload.name)
                    .await?;
            }
        }
        Role::Admin => {}
    }

    let user = state
        .user_repo
        .find_by_id(auth.id)
        .await?
        .ok_or(AppError::NotFound("User not found".into()))?;

    Ok(Json(user))
}

pub async fn change_password(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .user_repo
        .find_by_id(auth.id)
        .await?
        .ok_or(AppError::NotFound("User not found".into()))?;

    let hash = user.password_hash.as_deref().ok_or(AppError::Unauthorized)?;
    if !verify_password(hash, &payload.current_password) {
        return Err(AppError::Unauthorized);
    }

    let new_hash = hash_password(&payload.new_password)?;
    state.user_repo.update_password(user.id, &new_hash).await?;

    Ok(Json(MessageResponse {
        message: "Password updated".into(),
    }))
}
