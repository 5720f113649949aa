//! Password registration.

use chrono::Utc;
use uuid::Uuid;

use nimbus_domain::email::{is_valid_email, normalize_email};

use crate::domain::repository::{EmailSender, UserRepository};
use crate::domain::types::{AuthUser, UserProfile, one_time_token, validate_password};
use crate::error::AuthServiceError;
use crate::password::hash_password;

pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

pub struct RegisterUseCase<U: UserRepository, E: EmailSender> {
    pub users: U,
    pub email: E,
    pub frontend_origin: String,
}

impl<U: UserRepository, E: EmailSender> RegisterUseCase<U, E> {
    pub async fn execute(&self, input: RegisterInput) -> Result<AuthUser, AuthServiceError> {
        let email = normalize_email(&input.email);
        if !is_valid_email(&email) {
            return Err(AuthServiceError::Validation("invalid email address".into()));
        }
        validate_password(&input.password)
            .map_err(|msg| AuthServiceError::Validation(msg.into()))?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthServiceError::UserAlreadyExists);
        }

        let password_hash = hash_password(&input.password)?;
        let (token, token_expires_at) = one_time_token();
        let now = Utc::now();
        let user = AuthUser {
            id: Uuid::now_v7(),
            email,
            password_hash: Some(password_hash),
            role: 0,
            email_verified: false,
            verification_token: Some(token.clone()),
            verification_token_expires_at: Some(token_expires_at),
            reset_token: None,
            reset_token_expires_at: None,
            refresh_token: None,
            refresh_token_expires_at: None,
            last_token_invalidation: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let mut profile = UserProfile::empty(user.id);
        profile.display_name = input.display_name;

        self.users.create_with_profile(&user, &profile).await?;

        // Registration is all-or-nothing: a user who never receives the
        // verification email cannot log in, so the row is rolled back.
        let link = format!("{}/verify-email/{}", self.frontend_origin, token);
        let html = format!(
            "<p>Welcome! Confirm your email address by opening \
             <a href=\"{link}\">this link</a>. It expires in 24 hours.</p>"
        );
        if let Err(e) = self.email.send(&user.email, "Verify your email", &html).await {
            tracing::error!(error = %e, "verification email failed, rolling back registration");
            self.users.delete(user.id).await?;
            return Err(AuthServiceError::EmailVerificationFailed);
        }

        Ok(user)
    }
}
