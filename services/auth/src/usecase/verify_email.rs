//! Email verification and verification-email resend.

use chrono::Utc;

use nimbus_domain::email::normalize_email;

use crate::domain::repository::{EmailSender, ProfileRepository, UserRepository};
use crate::domain::types::{AuthUser, one_time_token};
use crate::error::AuthServiceError;
use crate::usecase::token::{issue_access_token, issue_refresh_token};

#[derive(Debug)]
pub struct VerifyEmailOutput {
    pub user: AuthUser,
    pub access_token: String,
    pub access_token_exp: u64,
    pub refresh_token: String,
}

/// Consume a verification token and auto-login the user.
pub struct VerifyEmailUseCase<U: UserRepository, P: ProfileRepository> {
    pub users: U,
    pub profiles: P,
    pub jwt_secret: String,
}

impl<U: UserRepository, P: ProfileRepository> VerifyEmailUseCase<U, P> {
    pub async fn execute(&self, token: &str) -> Result<VerifyEmailOutput, AuthServiceError> {
        let user = self
            .users
            .find_by_verification_token(token)
            .await?
            .ok_or(AuthServiceError::InvalidVerificationToken)?;

        let already_verified = user.email_verified;
        if !already_verified {
            match user.verification_token_expires_at {
                Some(expires_at) if expires_at > Utc::now() => {}
                _ => return Err(AuthServiceError::VerificationTokenExpired),
            }
        }

        // Single-use: clearing the token columns happens in the same
        // update that flips the flag. Re-running with a consumed token
        // lands in InvalidVerificationToken above.
        self.users.mark_email_verified(user.id).await?;
        let user = AuthUser {
            email_verified: true,
            verification_token: None,
            verification_token_expires_at: None,
            ..user
        };

        let (access_token, access_token_exp) = issue_access_token(user.id, &self.jwt_secret)?;
        let (refresh_token, refresh_expires_at) = issue_refresh_token(user.id, &self.jwt_secret)?;
        self.users
            .set_refresh_token(user.id, Some((&refresh_token, refresh_expires_at)))
            .await?;
        // First login of the account; a re-verify race keeps its count.
        self.profiles
            .record_login(user.id, !already_verified, Utc::now())
            .await?;

        Ok(VerifyEmailOutput {
            user,
            access_token,
            access_token_exp,
            refresh_token,
        })
    }
}

/// Re-issue the verification token. Overwrites any outstanding token
/// rather than appending. Answers generically for unknown addresses so
/// the endpoint cannot be used to enumerate accounts.
pub struct ResendVerificationUseCase<U: UserRepository, E: EmailSender> {
    pub users: U,
    pub email: E,
    pub frontend_origin: String,
}

impl<U: UserRepository, E: EmailSender> ResendVerificationUseCase<U, E> {
    pub async fn execute(&self, email: &str) -> Result<(), AuthServiceError> {
        let email = normalize_email(email);
        let Some(user) = self.users.find_by_email(&email).await? else {
            return Ok(());
        };
        if user.email_verified {
            return Ok(());
        }

        let (token, token_expires_at) = one_time_token();
        self.users
            .set_verification_token(user.id, Some((&token, token_expires_at)))
            .await?;

        let link = format!("{}/verify-email/{}", self.frontend_origin, token);
        let html = format!(
            "<p>Confirm your email address by opening \
             <a href=\"{link}\">this link</a>. It expires in 24 hours.</p>"
        );
        if let Err(e) = self.email.send(&user.email, "Verify your email", &html).await {
            tracing::error!(error = %e, "resend verification email failed");
            return Err(AuthServiceError::EmailVerificationFailed);
        }
        Ok(())
    }
}
