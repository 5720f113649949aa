#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::types::{AuthUser, NormalizedProfile, OAuthConnection, UserProfile};
use crate::error::AuthServiceError;

/// Repository for identity records.
///
/// Multi-row writes (`create_with_profile`, `create_oauth_user`) are
/// transactional: either every row lands or none does. A user row is
/// never visible without its profile.
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthServiceError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthServiceError>;
    async fn find_by_verification_token(
        &self,
        token: &str,
    ) -> Result<Option<AuthUser>, AuthServiceError>;
    async fn find_by_reset_token(&self, token: &str)
    -> Result<Option<AuthUser>, AuthServiceError>;

    /// Insert user + profile in one transaction (password registration).
    async fn create_with_profile(
        &self,
        user: &AuthUser,
        profile: &UserProfile,
    ) -> Result<(), AuthServiceError>;

    /// Insert user + profile + connection in one transaction (first
    /// OAuth login for an unknown external identity).
    async fn create_oauth_user(
        &self,
        user: &AuthUser,
        profile: &UserProfile,
        connection: &OAuthConnection,
    ) -> Result<(), AuthServiceError>;

    /// Compensating cleanup for failed registration.
    async fn delete(&self, id: Uuid) -> Result<(), AuthServiceError>;

    /// Overwrite the stored refresh token. `None` revokes it (logout).
    async fn set_refresh_token(
        &self,
        id: Uuid,
        token: Option<(&str, DateTime<Utc>)>,
    ) -> Result<(), AuthServiceError>;

    /// Stamp the invalidation watermark: access tokens issued before
    /// `at` become void.
    async fn set_last_token_invalidation(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), AuthServiceError>;

    /// Overwrite the verification token (resend invalidates the prior
    /// one). `None` clears it.
    async fn set_verification_token(
        &self,
        id: Uuid,
        token: Option<(&str, DateTime<Utc>)>,
    ) -> Result<(), AuthServiceError>;

    /// Mark the email verified and clear the verification token columns
    /// in the same update.
    async fn mark_email_verified(&self, id: Uuid) -> Result<(), AuthServiceError>;

    /// Overwrite the reset token. `None` clears it.
    async fn set_reset_token(
        &self,
        id: Uuid,
        token: Option<(&str, DateTime<Utc>)>,
    ) -> Result<(), AuthServiceError>;

    /// Store a new password hash and clear the reset token columns.
    async fn set_password_hash(&self, id: Uuid, hash: &str) -> Result<(), AuthServiceError>;
}

/// Repository for the 1:1 profile rows.
pub trait ProfileRepository: Send + Sync {
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<UserProfile>, AuthServiceError>;

    /// Bump activity counters on successful login. `reset_count` sets
    /// `login_count = 1` (first login of a fresh account); otherwise
    /// increments.
    async fn record_login(
        &self,
        user_id: Uuid,
        reset_count: bool,
        at: DateTime<Utc>,
    ) -> Result<(), AuthServiceError>;

    /// Copy provider values into empty profile fields. Non-empty fields
    /// are left alone so provider data never overwrites user edits.
    async fn fill_missing(
        &self,
        user_id: Uuid,
        display_name: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<(), AuthServiceError>;
}

/// Repository for external identity links.
pub trait ConnectionRepository: Send + Sync {
    async fn find_by_provider(
        &self,
        provider: &str,
        provider_user_id: &str,
    ) -> Result<Option<OAuthConnection>, AuthServiceError>;

    async fn list_by_user(&self, user_id: Uuid)
    -> Result<Vec<OAuthConnection>, AuthServiceError>;

    async fn create(&self, connection: &OAuthConnection) -> Result<(), AuthServiceError>;
}

/// Outbound email delivery boundary.
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), anyhow::Error>;
}

/// Atomic increment-with-window counter (Redis in production).
pub trait RateLimitStore: Send + Sync {
    /// Increment the counter for `key`, starting a `window_secs` window
    /// on first hit. Returns the count within the current window.
    async fn increment(&self, key: &str, window_secs: u64) -> Result<u64, anyhow::Error>;
}

/// Capability implemented per OAuth provider. The identity resolver is
/// written against this trait, never against a concrete provider.
pub trait OAuthProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Provider authorization URL carrying the CSRF state nonce.
    fn authorization_url(&self, state: &str) -> String;

    /// Exchange an authorization code for a normalized profile.
    async fn exchange_code(&self, code: &str)
    -> Result<NormalizedProfile, crate::oauth::OAuthExchangeError>;
}
