//! Password reset: request a reset token, then redeem it.

use chrono::Utc;

use nimbus_domain::email::normalize_email;

use crate::domain::repository::{EmailSender, UserRepository};
use crate::domain::types::{one_time_token, validate_password};
use crate::error::AuthServiceError;
use crate::password::hash_password;

/// Issue a reset token and mail the link. Always answers generically;
/// unknown addresses and delivery failures look identical from outside,
/// so the endpoint cannot confirm whether an account exists.
pub struct ForgotPasswordUseCase<U: UserRepository, E: EmailSender> {
    pub users: U,
    pub email: E,
    pub frontend_origin: String,
}

impl<U: UserRepository, E: EmailSender> ForgotPasswordUseCase<U, E> {
    pub async fn execute(&self, email: &str) -> Result<(), AuthServiceError> {
        let email = normalize_email(email);
        let Some(user) = self.users.find_by_email(&email).await? else {
            return Ok(());
        };

        let (token, token_expires_at) = one_time_token();
        self.users
            .set_reset_token(user.id, Some((&token, token_expires_at)))
            .await?;

        let link = format!("{}/reset-password/{}", self.frontend_origin, token);
        let html = format!(
            "<p>Reset your password by opening <a href=\"{link}\">this link</a>. \
             It expires in 24 hours. If you did not request this, ignore this email.</p>"
        );
        if let Err(e) = self.email.send(&user.email, "Reset your password", &html).await {
            tracing::error!(error = %e, "reset email failed");
        }
        Ok(())
    }
}

/// Redeem a reset token. On success every existing session dies: the
/// stored refresh token is revoked and the invalidation watermark is
/// stamped so pre-reset access tokens are void too.
pub struct ResetPasswordUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> ResetPasswordUseCase<U> {
    pub async fn execute(&self, token: &str, new_password: &str) -> Result<(), AuthServiceError> {
        let user = self
            .users
            .find_by_reset_token(token)
            .await?
            .ok_or(AuthServiceError::InvalidResetToken)?;

        match user.reset_token_expires_at {
            Some(expires_at) if expires_at > Utc::now() => {}
            _ => return Err(AuthServiceError::ResetTokenExpired),
        }

        validate_password(new_password)
            .map_err(|msg| AuthServiceError::Validation(msg.into()))?;

        let hash = hash_password(new_password)?;
        // Clears the reset token columns in the same update.
        self.users.set_password_hash(user.id, &hash).await?;
        self.users.set_refresh_token(user.id, None).await?;
        self.users
            .set_last_token_invalidation(user.id, Utc::now())
            .await?;
        Ok(())
    }
}
