use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use nimbus_core::response::error_body;

/// Auth service domain error variants.
///
/// Each variant maps to a stable error code and HTTP status; the
/// response body carries `{"error": {"code", "message"}}`.
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("an account with this email already exists")]
    UserAlreadyExists,
    #[error("user not found")]
    UserNotFound,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("email address is not verified")]
    EmailNotVerified,
    #[error("account is disabled")]
    AccountDisabled,
    #[error("access token expired")]
    TokenExpired,
    #[error("invalid token")]
    TokenInvalid,
    #[error("token has been invalidated")]
    TokenInvalidated,
    #[error("no refresh token")]
    NoRefreshToken,
    #[error("invalid refresh token")]
    InvalidRefreshToken,
    #[error("refresh token expired")]
    RefreshTokenExpired,
    #[error("invalid email verification token")]
    InvalidVerificationToken,
    #[error("email verification token expired")]
    VerificationTokenExpired,
    #[error("invalid password reset token")]
    InvalidResetToken,
    #[error("password reset token expired")]
    ResetTokenExpired,
    #[error("too many requests")]
    RateLimited { retry_after_secs: u64 },
    #[error("failed to send verification email")]
    EmailVerificationFailed,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AuthServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::UserAlreadyExists => "USER_ALREADY_EXISTS",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::EmailNotVerified => "EMAIL_NOT_VERIFIED",
            Self::AccountDisabled => "ACCOUNT_DISABLED",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::TokenInvalid => "TOKEN_INVALID",
            Self::TokenInvalidated => "TOKEN_INVALIDATED",
            Self::NoRefreshToken => "NO_REFRESH_TOKEN",
            Self::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            Self::RefreshTokenExpired => "REFRESH_TOKEN_EXPIRED",
            Self::InvalidVerificationToken => "INVALID_VERIFICATION_TOKEN",
            Self::VerificationTokenExpired => "VERIFICATION_TOKEN_EXPIRED",
            Self::InvalidResetToken => "INVALID_RESET_TOKEN",
            Self::ResetTokenExpired => "RESET_TOKEN_EXPIRED",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::EmailVerificationFailed => "EMAIL_VERIFICATION_FAILED",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::UserAlreadyExists => StatusCode::BAD_REQUEST,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid
            | Self::TokenInvalidated
            | Self::NoRefreshToken
            | Self::InvalidRefreshToken
            | Self::RefreshTokenExpired
            | Self::InvalidVerificationToken
            | Self::VerificationTokenExpired
            | Self::InvalidResetToken
            | Self::ResetTokenExpired => StatusCode::UNAUTHORIZED,
            Self::EmailNotVerified | Self::AccountDisabled => StatusCode::FORBIDDEN,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::EmailVerificationFailed | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AuthServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Log 500s only; tower-http TraceLayer already records method/uri/status for all
        // requests. 4xx are expected client errors; logging them here would be noise.
        // Internal errors need the anyhow chain logged so the root cause is traceable.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %e, code = "INTERNAL", "internal error");
        }
        let body = error_body(self.code(), &self.to_string(), None);
        let mut response = (status, axum::Json(body)).into_response();
        if let Self::RateLimited { retry_after_secs } = self {
            if let Ok(value) = retry_after_secs.to_string().parse() {
                response.headers_mut().insert(axum::http::header::RETRY_AFTER, value);
            }
        }
        response
    }
}
