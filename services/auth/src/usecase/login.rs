//! Password login.

use std::sync::LazyLock;

use chrono::Utc;

use nimbus_domain::email::normalize_email;

use crate::domain::repository::{ProfileRepository, UserRepository};
use crate::domain::types::AuthUser;
use crate::error::AuthServiceError;
use crate::password::{hash_password, verify_password};
use crate::usecase::token::{issue_access_token, issue_refresh_token};

/// Digest verified when the email is unknown or the account has no
/// password, so the unknown-email and wrong-password paths burn the
/// same Argon2 work and stay indistinguishable by timing.
static DUMMY_DIGEST: LazyLock<String> =
    LazyLock::new(|| hash_password("timing-equalizer").unwrap_or_default());

pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub struct LoginOutput {
    pub user: AuthUser,
    pub access_token: String,
    pub access_token_exp: u64,
    pub refresh_token: String,
}

pub struct LoginUseCase<U: UserRepository, P: ProfileRepository> {
    pub users: U,
    pub profiles: P,
    pub jwt_secret: String,
}

impl<U: UserRepository, P: ProfileRepository> LoginUseCase<U, P> {
    pub async fn execute(&self, input: LoginInput) -> Result<LoginOutput, AuthServiceError> {
        let email = normalize_email(&input.email);

        let user = match self.users.find_by_email(&email).await? {
            Some(user) => user,
            None => {
                let _ = verify_password(&input.password, &DUMMY_DIGEST);
                return Err(AuthServiceError::UserNotFound);
            }
        };

        let Some(stored_hash) = user.password_hash.as_deref() else {
            // OAuth-only account: no password to check.
            let _ = verify_password(&input.password, &DUMMY_DIGEST);
            return Err(AuthServiceError::InvalidCredentials);
        };
        if !verify_password(&input.password, stored_hash) {
            return Err(AuthServiceError::InvalidCredentials);
        }

        if !user.is_active {
            return Err(AuthServiceError::AccountDisabled);
        }
        if !user.email_verified {
            return Err(AuthServiceError::EmailNotVerified);
        }

        let (access_token, access_token_exp) = issue_access_token(user.id, &self.jwt_secret)?;
        let (refresh_token, refresh_expires_at) = issue_refresh_token(user.id, &self.jwt_secret)?;
        self.users
            .set_refresh_token(user.id, Some((&refresh_token, refresh_expires_at)))
            .await?;
        self.profiles
            .record_login(user.id, false, Utc::now())
            .await?;

        Ok(LoginOutput {
            user,
            access_token,
            access_token_exp,
            refresh_token,
        })
    }
}
