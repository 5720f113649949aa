//! Token issuance, session refresh, and logout.

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use nimbus_auth_types::cookie::{ACCESS_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS};
use nimbus_auth_types::token::{JwtClaims, REFRESH_TOKEN_TYP, TokenError, validate_refresh_token};

use crate::domain::repository::UserRepository;
use crate::error::AuthServiceError;

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before UNIX epoch")
        .as_secs()
}

fn sign(claims: &JwtClaims, secret: &str) -> Result<String, AuthServiceError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthServiceError::Internal(e.into()))
}

/// Mint a 15-minute access token. Returns the JWT and its expiry
/// (seconds since epoch).
pub fn issue_access_token(user_id: Uuid, secret: &str) -> Result<(String, u64), AuthServiceError> {
    let iat = now_secs();
    let exp = iat + ACCESS_TOKEN_TTL_SECS;
    let claims = JwtClaims {
        sub: user_id.to_string(),
        iat,
        exp,
        typ: None,
    };
    Ok((sign(&claims, secret)?, exp))
}

/// Mint a 7-day refresh token. Returns the JWT and its expiry as a
/// timestamp, ready to be mirrored onto the user row.
pub fn issue_refresh_token(
    user_id: Uuid,
    secret: &str,
) -> Result<(String, DateTime<Utc>), AuthServiceError> {
    let iat = now_secs();
    let exp = iat + REFRESH_TOKEN_TTL_SECS;
    let claims = JwtClaims {
        sub: user_id.to_string(),
        iat,
        exp,
        typ: Some(REFRESH_TOKEN_TYP.to_owned()),
    };
    let token = sign(&claims, secret)?;
    let expires_at = Utc
        .timestamp_opt(exp as i64, 0)
        .single()
        .ok_or_else(|| AuthServiceError::Internal(anyhow::anyhow!("refresh expiry overflow")))?;
    Ok((token, expires_at))
}

// ── RefreshSession ───────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct RefreshSessionOutput {
    pub user_id: Uuid,
    pub access_token: String,
    pub access_token_exp: u64,
    pub refresh_token: String,
}

/// Rotate the token pair. The presented refresh token must match the
/// user's stored one; after rotation the old token is permanently dead
/// even though its own expiry has not elapsed.
pub struct RefreshSessionUseCase<U: UserRepository> {
    pub users: U,
    pub jwt_secret: String,
}

impl<U: UserRepository> RefreshSessionUseCase<U> {
    pub async fn execute(
        &self,
        refresh_value: &str,
    ) -> Result<RefreshSessionOutput, AuthServiceError> {
        let info = validate_refresh_token(refresh_value, &self.jwt_secret).map_err(|e| match e {
            TokenError::Expired => AuthServiceError::RefreshTokenExpired,
            _ => AuthServiceError::InvalidRefreshToken,
        })?;

        let user = self
            .users
            .find_by_id(info.user_id)
            .await?
            .ok_or(AuthServiceError::InvalidRefreshToken)?;

        if !user.is_active {
            return Err(AuthServiceError::AccountDisabled);
        }

        // Rotation check: only the currently stored token is live. A
        // replayed predecessor validates as a JWT but fails here.
        if user.refresh_token.as_deref() != Some(refresh_value) {
            return Err(AuthServiceError::InvalidRefreshToken);
        }
        match user.refresh_token_expires_at {
            Some(expires_at) if expires_at > Utc::now() => {}
            _ => return Err(AuthServiceError::RefreshTokenExpired),
        }

        let (access_token, access_token_exp) = issue_access_token(user.id, &self.jwt_secret)?;
        let (refresh_token, refresh_expires_at) = issue_refresh_token(user.id, &self.jwt_secret)?;
        self.users
            .set_refresh_token(user.id, Some((&refresh_token, refresh_expires_at)))
            .await?;

        Ok(RefreshSessionOutput {
            user_id: user.id,
            access_token,
            access_token_exp,
            refresh_token,
        })
    }
}

// ── Logout ───────────────────────────────────────────────────────────────────

/// Revoke the session. Idempotent: a missing or unparseable cookie is
/// already-logged-out, not an error.
pub struct LogoutUseCase<U: UserRepository> {
    pub users: U,
    pub jwt_secret: String,
}

impl<U: UserRepository> LogoutUseCase<U> {
    pub async fn execute(&self, refresh_value: Option<&str>) -> Result<(), AuthServiceError> {
        let Some(refresh_value) = refresh_value else {
            return Ok(());
        };
        let Ok(info) = validate_refresh_token(refresh_value, &self.jwt_secret) else {
            return Ok(());
        };
        let Some(user) = self.users.find_by_id(info.user_id).await? else {
            return Ok(());
        };

        self.users.set_refresh_token(user.id, None).await?;
        // Watermark also kills every still-valid access token issued
        // before this instant.
        self.users
            .set_last_token_invalidation(user.id, Utc::now())
            .await?;
        Ok(())
    }
}
