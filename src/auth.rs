/**
 * Authentication
 * JWT bearer tokens, password hashing and the extractors guarding
 * mutating routes.
 */
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::distr::{Alphanumeric, SampleString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::AppConfig;
use crate::db::models::User;
use crate::error::ApiError;
use crate::state::AppState;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub exp: i64,
    pub iat: i64,
}

pub fn create_access_token(
    user: &User,
    config: &AppConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let exp = now + Duration::days(config.token_expiry_days);

    let claims = Claims {
        sub: user.id.to_string(),
        name: user.name.clone(),
        email: user.email.clone(),
        is_admin: user.is_admin,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
}

pub fn verify_access_token(
    token: &str,
    secret: &str,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

fn extract_bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// bcrypt is CPU-bound; hash on the blocking pool.
pub async fn hash_password(password: &str) -> Result<String, ApiError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash(password, DEFAULT_COST))
        .await
        .map_err(|e| ApiError::Internal(format!("password hashing task failed: {}", e)))?
        .map_err(|e| ApiError::Internal(format!("failed to hash password: {}", e)))
}

pub async fn verify_password(password: &str, password_hash: &str) -> bool {
    let password = password.to_string();
    let password_hash = password_hash.to_string();
    tokio::task::spawn_blocking(move || verify(password, &password_hash).unwrap_or(false))
        .await
        .unwrap_or(false)
}

/// Random single-use token handed to the user for a password reset.
pub fn generate_reset_token() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), 64)
}

/// Reset tokens are stored as SHA-256 digests, never in clear.
pub fn hash_reset_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Caller holding a valid bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(parts)
            .ok_or_else(|| ApiError::Unauthorized("No Token".to_string()))?;

        verify_access_token(token, &state.config.jwt_secret)
            .map(AuthUser)
            .map_err(|e| {
                tracing::debug!("Token verification failed: {}", e);
                ApiError::Unauthorized("Invalid Token".to_string())
            })
    }
}

/// Caller holding a valid bearer token whose `isAdmin` claim is set.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Claims);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
        if !claims.is_admin {
            tracing::warn!(user = %claims.email, "non-admin attempted an admin route");
            return Err(ApiError::Forbidden("Invalid Admin Token".to_string()));
        }
        Ok(AdminUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(auth: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = auth {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn state() -> AppState {
        AppState::in_memory(AppConfig::default())
    }

    #[test]
    fn test_token_round_trip_carries_admin_flag() {
        let config = AppConfig::default();
        let user = User::new("Ann", "ann@example.com", String::new(), true);
        let token = create_access_token(&user, &config).unwrap();
        let claims = verify_access_token(&token, &config.jwt_secret).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert!(claims.is_admin);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let config = AppConfig::default();
        let user = User::new("Ann", "ann@example.com", String::new(), true);
        let token = create_access_token(&user, &config).unwrap();
        assert!(verify_access_token(&token, "another-secret").is_err());
    }

    #[test]
    fn test_reset_token_hash_is_stable_hex() {
        let token = generate_reset_token();
        assert_eq!(token.len(), 64);
        assert_eq!(hash_reset_token(&token), hash_reset_token(&token));
        assert_eq!(hash_reset_token(&token).len(), 64);
    }

    #[tokio::test]
    async fn test_password_hash_verifies() {
        let digest = hash_password("correct horse").await.unwrap();
        assert!(verify_password("correct horse", &digest).await);
        assert!(!verify_password("battery staple", &digest).await);
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let mut parts = parts_with(None);
        let err = AuthUser::from_request_parts(&mut parts, &state())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(msg) if msg == "No Token"));
    }

    #[tokio::test]
    async fn test_garbage_token_is_unauthorized() {
        let mut parts = parts_with(Some("Bearer not.a.jwt"));
        let err = AuthUser::from_request_parts(&mut parts, &state())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(msg) if msg == "Invalid Token"));
    }

    #[tokio::test]
    async fn test_non_admin_is_forbidden() {
        let state = state();
        let user = User::new("Bob", "bob@example.com", String::new(), false);
        let token = create_access_token(&user, &state.config).unwrap();
        let mut parts = parts_with(Some(&format!("Bearer {}", token)));
        let err = AdminUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_admin_passes_both_checks() {
        let state = state();
        let user = User::new("Ann", "ann@example.com", String::new(), true);
        let token = create_access_token(&user, &state.config).unwrap();
        let mut parts = parts_with(Some(&format!("Bearer {}", token)));
        let AdminUser(claims) = AdminUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(claims.email, "ann@example.com");
    }
}
