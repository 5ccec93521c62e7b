use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use crate::api::dtos::requests::{
    LoginRequest, OtpSendRequest, OtpVerifyRequest, RequestResetRequest, ResetPasswordRequest,
    SignupRequest, VerifyQuery,
};
use crate::api::dtos::responses::{AuthResponse, MessageResponse, OtpVerifyResponse};
use crate::api::extractors::json::AppJson;
use crate::domain::models::credential::{generate_otp_code, generate_token, OtpPurpose};
use crate::domain::models::user::{NewUser, Role, User};
use crate::error::AppError;
use crate::state::AppState;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use rand::rngs::OsRng;
use std::sync::Arc;
use tracing::{info, warn};

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|_| AppError::Internal)
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

async fn auth_response(state: &AppState, user: User) -> Result<AuthResponse, AppError> {
    let token = state.auth_service.issue_token(&user)?;
    let (profile_id, company_id) = match Role::parse(&user.role) {
        Some(Role::Organizer) => match state.user_repo.find_organizer_profile(user.id).await? {
            Some(p) => (Some(p.id), p.company_id),
            None => (None, None),
        },
        Some(Role::Participant) => (
            state
                .user_repo
                .find_participant_profile(user.id)
                .await?
                .map(|p| p.id),
            None,
        ),
        _ => (None, None),
    };

    Ok(AuthResponse {
        token,
        user,
        profile_id,
        company_id,
    })
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    if state.user_repo.find_by_email(&payload.email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let role = match payload.role.as_deref() {
        None => Role::Participant,
        Some(raw) => match Role::parse(raw) {
            Some(Role::Admin) | None => {
                return Err(AppError::Validation("Invalid role".into()));
            }
            Some(role) => role,
        },
    };

    let password_hash = hash_password(&payload.password)?;
    let token = generate_token();
    let expires_at = Utc::now() + Duration::hours(1);

    state
        .auth_repo
        .replace_unverified(&payload.email, &payload.name, &password_hash, role, &token, expires_at)
        .await?;

    let mut context = tera::Context::new();
    context.insert("name", &payload.name);
    context.insert(
        "verify_link",
        &format!("{}/verify?token={}", state.config.frontend_url, token),
    );
    let html = state
        .templates
        .render("verify_email.html", &context)
        .map_err(|e| AppError::InternalWithMsg(format!("Template render error: {:?}", e)))?;

    state
        .email_service
        .send(
            &payload.email,
            "Verify your email",
            "Follow the link in this email to verify your address.",
            Some(&html),
        )
        .await?;

    info!("Staged signup for {}", payload.email);

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Verification email sent".into(),
        }),
    ))
}

pub async fn verify(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VerifyQuery>,
) -> Result<impl IntoResponse, AppError> {
    let pending = state
        .auth_repo
        .find_unverified_by_token(&query.token)
        .await?
        .ok_or(AppError::NotFound("Invalid verification token".into()))?;

    if pending.expires_at < Utc::now() {
        return Err(AppError::Expired("Verification token expired".into()));
    }

    if state.user_repo.find_by_email(&pending.email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let user = state.auth_repo.promote_unverified(&pending).await?;
    info!("Verified signup for {} (user {})", user.email, user.id);

    let response = auth_response(&state, user).await?;
    Ok(Json(response))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .user_repo
        .find_by_email(&payload.email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let hash = user.password_hash.as_deref().ok_or(AppError::Unauthorized)?;
    if !verify_password(hash, &payload.password) {
        return Err(AppError::Unauthorized);
    }

    let response = auth_response(&state, user).await?;
    Ok(Json(response))
}

pub async fn otp_send(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<OtpSendRequest>,
) -> Result<impl IntoResponse, AppError> {
    let purpose = OtpPurpose::parse(&payload.purpose)
        .ok_or(AppError::Validation("Invalid OTP purpose".into()))?;

    let existing = state.user_repo.find_by_email(&payload.email).await?;
    match purpose {
        OtpPurpose::Signup => {
            if existing.is_some() {
                return Err(AppError::Conflict("Email already registered".into()));
            }
        }
        OtpPurpose::Login => {
            if existing.is_none() {
                return Err(AppError::NotFound("User not found".into()));
            }
        }
        OtpPurpose::Reset => {
            // Never reveal whether the account exists.
            if existing.is_none() {
                return Ok(Json(MessageResponse {
                    message: "If the account exists, a code has been sent".into(),
                }));
            }
        }
    }

    let code = generate_otp_code();
    let expires_at = Utc::now() + Duration::minutes(state.config.otp_ttl_minutes);
    state
        .auth_repo
        .replace_otp(&payload.email, &code, purpose.as_str(), expires_at)
        .await?;

    let mut context = tera::Context::new();
    context.insert("code", &code);
    context.insert("ttl_minutes", &state.config.otp_ttl_minutes);
    let html = state
        .templates
        .render("otp.html", &context)
        .map_err(|e| AppError::InternalWithMsg(format!("Template render error: {:?}", e)))?;

    state
        .email_service
        .send(
            &payload.email,
            "Your one-time code",
            &format!("Your one-time code is {}", code),
            Some(&html),
        )
        .await?;

    Ok(Json(MessageResponse {
        message: "If the account exists, a code has been sent".into(),
    }))
}

pub async fn otp_verify(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<OtpVerifyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let otp = state
        .auth_repo
        .find_valid_otp(&payload.email, &payload.code)
        .await?
        .ok_or(AppError::Validation("Invalid or expired code".into()))?;

    state.auth_repo.consume_otp(otp.id).await?;

    let purpose = OtpPurpose::parse(&otp.purpose)
        .ok_or_else(|| AppError::InternalWithMsg(format!("Corrupt OTP purpose: {}", otp.purpose)))?;

    match purpose {
        OtpPurpose::Signup => {
            if state.user_repo.find_by_email(&payload.email).await?.is_some() {
                return Err(AppError::Conflict("Email already registered".into()));
            }
            let user = state
                .user_repo
                .create_with_profile(&NewUser {
                    email: payload.email.clone(),
                    name: None,
                    password_hash: None,
                    role: Role::Participant,
                })
                .await?;
            let token = state.auth_service.issue_token(&user)?;
            Ok(Json(OtpVerifyResponse {
                message: "Account created".into(),
                token: Some(token),
                reset_token: None,
            }))
        }
        OtpPurpose::Login => {
            let user = state
                .user_repo
                .find_by_email(&payload.email)
                .await?
                .ok_or(AppError::NotFound("User not found".into()))?;
            let token = state.auth_service.issue_token(&user)?;
            Ok(Json(OtpVerifyResponse {
                message: "Logged in".into(),
                token: Some(token),
                reset_token: None,
            }))
        }
        OtpPurpose::Reset => {
            let user = state
                .user_repo
                .find_by_email(&payload.email)
                .await?
                .ok_or(AppError::NotFound("User not found".into()))?;
            let raw = generate_token();
            let expires_at = Utc::now() + Duration::minutes(state.config.reset_ttl_minutes);
            state
                .auth_repo
                .create_reset_token(user.id, &state.auth_service.hash_token(&raw), expires_at)
                .await?;
            Ok(Json(OtpVerifyResponse {
                message: "Reset token issued".into(),
                token: None,
                reset_token: Some(raw),
            }))
        }
    }
}

pub async fn request_reset(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<RequestResetRequest>,
) -> Result<impl IntoResponse, AppError> {
    let message = MessageResponse {
        message: "If the account exists, a reset link has been sent".into(),
    };

    let user = match state.user_repo.find_by_email(&payload.email).await? {
        Some(user) => user,
        None => return Ok(Json(message)),
    };

    let raw = generate_token();
    let expires_at = Utc::now() + Duration::minutes(state.config.reset_ttl_minutes);
    state
        .auth_repo
        .create_reset_token(user.id, &state.auth_service.hash_token(&raw), expires_at)
        .await?;

    let mut context = tera::Context::new();
    context.insert(
        "reset_link",
        &format!("{}/reset-password?token={}", state.config.frontend_url, raw),
    );
    context.insert("ttl_minutes", &state.config.reset_ttl_minutes);
    let html = state
        .templates
        .render("reset_password.html", &context)
        .map_err(|e| AppError::InternalWithMsg(format!("Template render error: {:?}", e)))?;

    if let Err(e) = state
        .email_service
        .send(
            &user.email,
            "Reset your password",
            "Follow the link in this email to reset your password.",
            Some(&html),
        )
        .await
    {
        warn!("Reset mail to {} failed: {:?}", user.email, e);
    }

    Ok(Json(message))
}

pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let token_hash = state.auth_service.hash_token(&payload.token);
    let token = state
        .auth_repo
        .find_valid_reset_token(&token_hash)
        .await?
        .ok_or(AppError::Validation("Invalid or expired reset token".into()))?;

    let user = state
        .user_repo
        .find_by_id(token.user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".into()))?;

    if let Some(hash) = user.password_hash.as_deref() {
        if verify_password(hash, &payload.password) {
            return Err(AppError::Conflict(
                "New password must differ from the current one".into(),
            ));
        }
    }

    let new_hash = hash_password(&payload.password)?;
    state
        .auth_repo
        .reset_password(token.id, user.id, &new_hash)
        .await?;

    info!("Password reset for user {}", user.id);

    Ok(Json(MessageResponse {
        message: "Password updated".into(),
    }))
}
