use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use uuid::Uuid;

use nimbus_domain::user::PublicUser;

/// Full identity record as the usecases see it. Mirrors the `users` row.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub password_hash: Option<String>,
    pub role: u8,
    pub email_verified: bool,
    pub verification_token: Option<String>,
    pub verification_token_expires_at: Option<DateTime<Utc>>,
    pub reset_token: Option<String>,
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    pub refresh_token: Option<String>,
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
    pub last_token_invalidation: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AuthUser {
    pub fn to_public(&self, profile: Option<&UserProfile>) -> PublicUser {
        PublicUser {
            id: self.id,
            email: self.email.clone(),
            role: self.role,
            email_verified: self.email_verified,
            display_name: profile.and_then(|p| p.display_name.clone()),
            avatar_url: profile.and_then(|p| p.avatar_url.clone()),
            created_at: self.created_at,
        }
    }
}

/// Presentation data and activity counters, 1:1 with the user.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub settings: Value,
    pub login_count: i32,
    pub last_successful_login: Option<DateTime<Utc>>,
    pub last_activity_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Empty profile for a freshly registered user.
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            display_name: None,
            bio: None,
            avatar_url: None,
            settings: Value::Object(Default::default()),
            login_count: 0,
            last_successful_login: None,
            last_activity_at: None,
        }
    }
}

/// Link between a user and an external identity.
#[derive(Debug, Clone)]
pub struct OAuthConnection {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider: String,
    pub provider_user_id: String,
    pub created_at: DateTime<Utc>,
}

/// Provider profile normalized to a common shape by the OAuth adapters.
#[derive(Debug, Clone)]
pub struct NormalizedProfile {
    pub provider: &'static str,
    pub provider_user_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Verification/reset token time-to-live.
pub const ONE_TIME_TOKEN_TTL_HOURS: i64 = 24;

/// Generate a single-use verification or reset token with its expiry.
pub fn one_time_token() -> (String, DateTime<Utc>) {
    (
        Uuid::new_v4().to_string(),
        Utc::now() + Duration::hours(ONE_TIME_TOKEN_TTL_HOURS),
    )
}

/// Password policy: at least 8 characters with an upper-case letter, a
/// lower-case letter, and a digit. Returns the failure message for the
/// 400 body, `Ok` when the password passes.
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < 8 {
        return Err("password must be at least 8 characters");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("password must contain an upper-case letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("password must contain a lower-case letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("password must contain a digit");
    }
    Ok(())
}
