/// Error code the service uses for an expired access token. The only
/// 401 worth retrying after a refresh.
pub const TOKEN_EXPIRED: &str = "TOKEN_EXPIRED";

/// Client-side failure. Cloneable so one refresh outcome can fan out to
/// every caller queued behind it.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ClientError {
    /// The service answered with its error envelope.
    #[error("{code}: {message}")]
    Api { code: String, message: String },
    /// Transport-level failure (connect, TLS, body decode).
    #[error("network error: {0}")]
    Network(String),
    /// The session could not be refreshed; the caller should treat the
    /// session as ended.
    #[error("session expired")]
    SessionExpired,
}

impl ClientError {
    /// True only for the expired-access-token 401. Everything else that
    /// arrives as a 401 (invalid or expired refresh token, invalidated
    /// token, disabled account) is fatal and must not trigger a retry
    /// loop.
    pub fn is_refreshable(&self) -> bool {
        matches!(self, Self::Api { code, .. } if code == TOKEN_EXPIRED)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}
