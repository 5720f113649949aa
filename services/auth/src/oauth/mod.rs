//! OAuth provider adapters.
//!
//! Each provider implements [`crate::domain::repository::OAuthProvider`]:
//! build an authorization URL carrying the CSRF state nonce, then
//! exchange the callback code for a [`NormalizedProfile`]. Everything
//! downstream of the adapters is provider-agnostic.

pub mod github;
pub mod google;

use rand::RngExt;

pub use github::GitHubOAuth;
pub use google::GoogleOAuth;

/// Failures during the code-for-profile exchange.
///
/// Raw provider error text stays inside the `anyhow` chain and is only
/// ever logged server-side; the browser sees a coarse redirect code.
#[derive(Debug, thiserror::Error)]
pub enum OAuthExchangeError {
    /// The provider rejected the authorization code.
    #[error("authorization code rejected")]
    InvalidCode,
    /// Token endpoint or userinfo endpoint failure.
    #[error("provider exchange failed")]
    Upstream(#[from] anyhow::Error),
}

/// Coarse error codes surfaced to the browser via redirect after a
/// failed OAuth callback. Internal detail is logged, never forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthCallbackError {
    InvalidState,
    InvalidCode,
    EmailMissing,
    CallbackFailed,
}

impl OAuthCallbackError {
    pub fn query_code(self) -> &'static str {
        match self {
            Self::InvalidState => "oauth_invalid_state",
            Self::InvalidCode => "oauth_invalid_code",
            Self::EmailMissing => "oauth_email_missing",
            Self::CallbackFailed => "oauth_callback_failed",
        }
    }
}

/// Charset for the CSRF state nonce (alphanumeric).
const STATE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Nonce length in characters.
const STATE_LEN: usize = 32;

/// Generate the CSRF state nonce stored in the short-lived state cookie
/// and echoed back by the provider.
pub fn generate_state() -> String {
    let mut rng = rand::rng();
    (0..STATE_LEN)
        .map(|_| STATE_CHARSET[rng.random_range(0..STATE_CHARSET.len())] as char)
        .collect()
}
