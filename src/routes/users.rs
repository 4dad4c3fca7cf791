/**
 * User Routes
 * Sign-in, sign-up and the password reset flow
 */
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{
    create_access_token, generate_reset_token, hash_password, hash_reset_token, verify_password,
};
use crate::db::models::{normalize_email, User};
use crate::error::{ApiError, ApiResult};
use crate::routes::{ApiJson, MessageResponse};
use crate::state::AppState;
use crate::store::StoreError;

const MIN_PASSWORD_LEN: usize = 8;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForgetPasswordRequest {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: Option<String>,
    pub password: Option<String>,
}

/// Account summary plus a fresh access token
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub token: String,
}

fn session_for(user: &User, state: &AppState) -> ApiResult<SessionResponse> {
    let token = create_access_token(user, &state.config)
        .map_err(|e| ApiError::Internal(format!("failed to sign token: {}", e)))?;
    Ok(SessionResponse {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        is_admin: user.is_admin,
        token,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn check_password(password: &str) -> ApiResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/users/signin
pub async fn signin(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SigninRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let (email, password) = match (non_blank(payload.email), payload.password) {
        (Some(email), Some(password)) if !password.is_empty() => (email, password),
        _ => {
            return Err(ApiError::BadRequest(
                "Email and password are required".to_string(),
            ))
        }
    };
    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = state
        .store
        .find_user_by_email(&normalize_email(&email))
        .await?
        .ok_or_else(|| {
            tracing::debug!(email = %email, "sign-in for unknown email");
            invalid()
        })?;

    if !verify_password(&password, &user.password_hash).await {
        tracing::warn!(email = %user.email, "sign-in with wrong password");
        return Err(invalid());
    }

    tracing::info!(email = %user.email, admin = user.is_admin, "user signed in");
    Ok(Json(session_for(&user, &state)?))
}

/// POST /api/users/signup - new accounts are never admins
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SignupRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let (name, email, password) = match (
        non_blank(payload.name),
        non_blank(payload.email),
        payload.password.filter(|p| !p.is_empty()),
    ) {
        (Some(name), Some(email), Some(password)) => (name, email, password),
        _ => {
            return Err(ApiError::BadRequest(
                "Name, email and password are required".to_string(),
            ))
        }
    };
    if !email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email format".to_string()));
    }
    check_password(&password)?;

    let password_hash = hash_password(&password).await?;
    let user = User::new(&name, &email, password_hash, false);

    state.store.insert_user(&user).await.map_err(|e| match e {
        StoreError::Conflict(_) => ApiError::Conflict("Email already registered".to_string()),
        other => other.into(),
    })?;

    tracing::info!(email = %user.email, "user signed up");
    Ok(Json(session_for(&user, &state)?))
}

/// POST /api/users/forget-password
/// The reset link is written to the log; mail delivery is not wired up.
pub async fn forget_password(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ForgetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let email = non_blank(payload.email)
        .ok_or_else(|| ApiError::BadRequest("Email is required".to_string()))?;

    let user = state
        .store
        .find_user_by_email(&normalize_email(&email))
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let token = generate_reset_token();
    state
        .store
        .set_reset_token(user.id, Some(&hash_reset_token(&token)))
        .await?;

    let link = format!(
        "{}/reset-password/{}",
        state.config.frontend_url.trim_end_matches('/'),
        token
    );
    tracing::info!(email = %user.email, reset_link = %link, "password reset requested");

    Ok(Json(MessageResponse::new("We sent reset password link to your email.")))
}

/// POST /api/users/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let (token, password) = match (non_blank(payload.token), payload.password) {
        (Some(token), Some(password)) => (token, password),
        _ => {
            return Err(ApiError::BadRequest(
                "Token and password are required".to_string(),
            ))
        }
    };
    check_password(&password)?;

    let user = state
        .store
        .find_user_by_reset_token(&hash_reset_token(&token))
        .await?
        .ok_or_else(|| ApiError::NotFound("Invalid or expired reset token".to_string()))?;

    let password_hash = hash_password(&password).await?;
    state.store.update_password(user.id, &password_hash).await?;

    tracing::info!(email = %user.email, "password reset");
    Ok(Json(MessageResponse::new("Password reset successfully")))
}

/// Create the configured admin account unless that email already exists.
pub async fn seed_admin(state: &AppState) -> ApiResult<()> {
    let Some(seed) = state.config.admin.as_ref() else {
        tracing::debug!("No admin seed configured");
        return Ok(());
    };

    let email = normalize_email(&seed.email);
    if state.store.find_user_by_email(&email).await?.is_some() {
        tracing::debug!(email = %email, "Admin account already present");
        return Ok(());
    }

    let password_hash = hash_password(&seed.password).await?;
    let admin = User::new(&seed.name, &email, password_hash, true);
    match state.store.insert_user(&admin).await {
        Ok(()) => {
            tracing::info!(email = %admin.email, "Admin account created");
            Ok(())
        }
        // Another instance seeded it first.
        Err(StoreError::Conflict(_)) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
