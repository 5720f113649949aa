//! Federated login: resolve a provider profile to a local user, then
//! open a session for them.

use chrono::Utc;
use uuid::Uuid;

use nimbus_domain::email::normalize_email;

use crate::domain::repository::{ConnectionRepository, ProfileRepository, UserRepository};
use crate::domain::types::{AuthUser, NormalizedProfile, OAuthConnection, UserProfile};
use crate::error::AuthServiceError;
use crate::usecase::token::{issue_access_token, issue_refresh_token};

/// Resolution failure. `EmailMissing` is kept apart from service errors
/// because the callback maps it to its own redirect code.
#[derive(Debug)]
pub enum ResolveError {
    EmailMissing,
    Service(AuthServiceError),
}

impl From<AuthServiceError> for ResolveError {
    fn from(e: AuthServiceError) -> Self {
        Self::Service(e)
    }
}

#[derive(Debug)]
pub struct OAuthLoginOutput {
    pub user: AuthUser,
    pub access_token: String,
    pub access_token_exp: u64,
    pub refresh_token: String,
}

/// Maps a normalized provider profile onto a local user and opens a
/// session. Resolution order is fixed:
///
/// 1. `(provider, provider_user_id)` link exists → that user. Email
///    changes on the provider side never migrate an established link.
/// 2. No link, provider gave a verified email that matches an existing
///    user → link the external identity to that user.
/// 3. No link, no matching email → create user + profile + connection.
///
/// Every path runs profile enrichment (provider name/picture fill
/// empty profile fields only) and refresh-token rotation.
pub struct OAuthLoginUseCase<U, P, C>
where
    U: UserRepository,
    P: ProfileRepository,
    C: ConnectionRepository,
{
    pub users: U,
    pub profiles: P,
    pub connections: C,
    pub jwt_secret: String,
}

impl<U, P, C> OAuthLoginUseCase<U, P, C>
where
    U: UserRepository,
    P: ProfileRepository,
    C: ConnectionRepository,
{
    pub async fn execute(&self, profile: &NormalizedProfile) -> Result<OAuthLoginOutput, ResolveError> {
        let (user, just_created) = self.resolve(profile).await?;

        if !user.is_active {
            return Err(AuthServiceError::AccountDisabled.into());
        }

        self.profiles
            .fill_missing(user.id, profile.name.as_deref(), profile.picture.as_deref())
            .await?;

        let (access_token, access_token_exp) =
            issue_access_token(user.id, &self.jwt_secret)?;
        let (refresh_token, refresh_expires_at) =
            issue_refresh_token(user.id, &self.jwt_secret)?;
        self.users
            .set_refresh_token(user.id, Some((&refresh_token, refresh_expires_at)))
            .await?;
        self.profiles
            .record_login(user.id, just_created, Utc::now())
            .await?;

        Ok(OAuthLoginOutput {
            user,
            access_token,
            access_token_exp,
            refresh_token,
        })
    }

    /// Returns the resolved user and whether this call created them.
    async fn resolve(
        &self,
        profile: &NormalizedProfile,
    ) -> Result<(AuthUser, bool), ResolveError> {
        if let Some(link) = self
            .connections
            .find_by_provider(profile.provider, &profile.provider_user_id)
            .await?
        {
            let user = self
                .users
                .find_by_id(link.user_id)
                .await?
                .ok_or_else(|| AuthServiceError::Internal(anyhow::anyhow!(
                    "oauth connection {} points at missing user {}",
                    link.id,
                    link.user_id,
                )))?;
            return Ok((user, false));
        }

        let Some(email) = profile.email.as_deref() else {
            return Err(ResolveError::EmailMissing);
        };
        let email = normalize_email(email);

        if let Some(user) = self.users.find_by_email(&email).await? {
            self.link(user.id, profile).await?;
            return Ok((user, false));
        }

        let user = self.create_user(&email, profile).await?;
        Ok((user, true))
    }

    /// Attach the external identity to an existing account. If the user
    /// already has a link for this provider (different provider-side
    /// account, same email) it is left untouched and the login proceeds
    /// through the existing account.
    async fn link(
        &self,
        user_id: Uuid,
        profile: &NormalizedProfile,
    ) -> Result<(), AuthServiceError> {
        let existing = self.connections.list_by_user(user_id).await?;
        if let Some(prior) = existing.iter().find(|c| c.provider == profile.provider) {
            tracing::warn!(
                user_id = %user_id,
                provider = profile.provider,
                prior_provider_user_id = prior.provider_user_id,
                new_provider_user_id = profile.provider_user_id,
                "second provider identity for a linked account, keeping the first",
            );
            return Ok(());
        }

        self.connections
            .create(&OAuthConnection {
                id: Uuid::now_v7(),
                user_id,
                provider: profile.provider.to_string(),
                provider_user_id: profile.provider_user_id.clone(),
                created_at: Utc::now(),
            })
            .await
    }

    async fn create_user(
        &self,
        email: &str,
        profile: &NormalizedProfile,
    ) -> Result<AuthUser, AuthServiceError> {
        let now = Utc::now();
        let user = AuthUser {
            id: Uuid::now_v7(),
            email: email.to_string(),
            // No password: the account can only sign in through a
            // provider until a reset flow sets one.
            password_hash: None,
            role: 0,
            // Provider-attested address, no verification round-trip.
            email_verified: true,
            verification_token: None,
            verification_token_expires_at: None,
            reset_token: None,
            reset_token_expires_at: None,
            refresh_token: None,
            refresh_token_expires_at: None,
            last_token_invalidation: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let mut user_profile = UserProfile::empty(user.id);
        user_profile.display_name = profile.name.clone();
        user_profile.avatar_url = profile.picture.clone();
        let connection = OAuthConnection {
            id: Uuid::now_v7(),
            user_id: user.id,
            provider: profile.provider.to_string(),
            provider_user_id: profile.provider_user_id.clone(),
            created_at: now,
        };
        self.users
            .create_oauth_user(&user, &user_profile, &connection)
            .await?;
        Ok(user)
    }
}
