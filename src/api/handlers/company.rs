use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use crate::api::dtos::requests::{CreateCompanyRequest, InviteOrganizerRequest, UpdateCompanyRequest};
use crate::api::dtos::responses::MessageResponse;
use crate::api::extractors::auth::AuthUser;
use crate::api::extractors::json::AppJson;
use crate::api::handlers::auth::hash_password;
use crate::domain::models::company::NewCompany;
use crate::domain::models::credential::generate_password;
use crate::domain::models::user::{NewUser, Role};
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;
use tracing::{info, warn};

pub async fn create_company(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    AppJson(payload): AppJson<CreateCompanyRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_role(&[Role::Admin, Role::Organizer])?;

    let profile = state
        .user_repo
        .find_organizer_profile(auth.id)
        .await?
        .ok_or(AppError::Validation("Organizer profile required".into()))?;

    if profile.company_id.is_some() {
        return Err(AppError::Conflict("Organizer already belongs to a company".into()));
    }

    let company = state
        .company_repo
        .create(&NewCompany {
            name: payload.name,
            description: payload.description,
            owner_id: profile.id,
        })
        .await?;

    info!("Company {} created by organizer {}", company.id, profile.id);

    Ok((StatusCode::CREATED, Json(company)))
}

pub async fn list_companies(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let companies = state.company_repo.list().await?;
    Ok(Json(companies))
}

pub async fn get_company(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(company_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let company = state
        .company_repo
        .find_by_id(company_id)
        .await?
        .ok_or(AppError::NotFound("Company not found".into()))?;

    let organizers = state.company_repo.list_organizers(company_id).await?;

    Ok(Json(serde_json::json!({
        "company": company,
        "organizers": organizers,
    })))
}

async fn require_owner_or_admin(
    state: &AppState,
    auth: &AuthUser,
    company_id: i64,
) -> Result<crate::domain::models::company::Company, AppError> {
    auth.require_role(&[Role::Admin, Role::Organizer])?;

    let company = state
        .company_repo
        .find_by_id(company_id)
        .await?
        .ok_or(AppError::NotFound("Company not found".into()))?;

    if auth.role == Role::Organizer {
        let profile = state
            .user_repo
            .find_organizer_profile(auth.id)
            .await?
            .ok_or(AppError::Forbidden("Organizer profile required".into()))?;
        if profile.id != company.owner_id {
            return Err(AppError::Forbidden("Not the company owner".into()));
        }
    }

    Ok(company)
}

pub async fn update_company(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(company_id): Path<i64>,
    AppJson(payload): AppJson<UpdateCompanyRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_owner_or_admin(&state, &auth, company_id).await?;

    let updated = state
        .company_repo
        .update(company_id, payload.name.as_deref(), payload.description.as_deref())
        .await?;

    Ok(Json(updated))
}

pub async fn delete_company(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(company_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_role(&[Role::Admin])?;

    state.company_repo.delete(company_id).await?;
    info!("Deleted company {}", company_id);

    Ok(Json(MessageResponse {
        message: "Company deleted".into(),
    }))
}

pub async fn invite_organizer(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    AppJson(payload): AppJson<InviteOrganizerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let company = require_owner_or_admin(&state, &auth, payload.company_id).await?;

    if state.user_repo.find_by_email(&payload.email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password = generate_password();
    let password_hash = hash_password(&password)?;

    let user = state
        .user_repo
        .create_with_profile(&NewUser {
            email: payload.email.clone(),
            name: Some(payload.name.clone()),
            password_hash: Some(password_hash),
            role: Role::Organizer,
        })
        .await?;

    let profile = state
        .user_repo
        .find_organizer_profile(user.id)
        .await?
        .ok_or(AppError::Internal)?;
    state.company_repo.add_organizer(company.id, profile.id).await?;

    let mut context = tera::Context::new();
    context.insert("name", &payload.name);
    context.insert("company_name", &company.name);
    context.insert("email", &payload.email);
    context.insert("password", &password);
    context.insert("login_link", &format!("{}/login", state.config.frontend_url));
    let html = state
        .templates
        .render("invitation.html", &context)
        .map_err(|e| AppError::InternalWithMsg(format!("Template render error: {:?}", e)))?;

    if let Err(e) = state
        .email_service
        .send(
            &payload.email,
            &format!("You're invited to organize for {}", company.name),
            "An organizer account has been created for you. Check the details in this email.",
            Some(&html),
        )
        .await
    {
        warn!("Invitation mail to {} failed: {:?}", payload.email, e);
    }

    info!("Invited organizer {} to company {}", user.id, company.id);

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Organizer invited".into(),
        }),
    ))
}
