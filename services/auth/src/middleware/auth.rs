//! Access-token guard for protected routes.
//!
//! The token is read from the `Authorization: Bearer` header first,
//! falling back to the session cookie. A valid signature alone is not
//! enough: the user row must still exist, be active, and the token must
//! have been issued after the account's invalidation watermark (stamped
//! on logout and password reset).

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use nimbus_auth_types::token::{TokenError, validate_access_token};

use crate::domain::repository::UserRepository;
use crate::domain::types::AuthUser;
use crate::error::AuthServiceError;
use crate::state::AppState;

/// Authenticated caller, attached as a request extension by
/// [`require_auth`] and pulled out by handlers.
#[derive(Clone)]
pub struct AuthContext {
    pub user: AuthUser,
    /// `iat` of the access token, seconds since epoch.
    pub token_issued_at: u64,
}

impl<S: Send + Sync> axum::extract::FromRequestParts<S> for AuthContext {
    type Rejection = AuthServiceError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthServiceError::TokenInvalid)
    }
}

/// Tokens minted before the watermark were invalidated wholesale by a
/// logout or password reset, regardless of their own expiry.
///
/// `iat` has whole-second resolution, so a fractional watermark is
/// rounded up: a token minted in the same wall-clock second as the
/// logout counts as pre-logout.
fn is_invalidated(issued_at: u64, watermark: Option<chrono::DateTime<chrono::Utc>>) -> bool {
    watermark.is_some_and(|at| {
        let mut cutoff = at.timestamp();
        if at.timestamp_subsec_nanos() > 0 {
            cutoff += 1;
        }
        (issued_at as i64) < cutoff
    })
}

fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_owned)
}

pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthServiceError> {
    let token = bearer_token(&req)
        .or_else(|| {
            jar.get(&state.cookies.access_token_name())
                .map(|c| c.value().to_owned())
        })
        .ok_or(AuthServiceError::TokenInvalid)?;

    let info = validate_access_token(&token, &state.jwt_secret).map_err(|e| match e {
        TokenError::Expired => AuthServiceError::TokenExpired,
        _ => AuthServiceError::TokenInvalid,
    })?;

    let user = state
        .user_repo()
        .find_by_id(info.user_id)
        .await?
        .ok_or(AuthServiceError::TokenInvalid)?;

    if !user.is_active {
        return Err(AuthServiceError::AccountDisabled);
    }

    if is_invalidated(info.issued_at, user.last_token_invalidation) {
        return Err(AuthServiceError::TokenInvalidated);
    }

    req.extensions_mut().insert(AuthContext {
        user,
        token_issued_at: info.issued_at,
    });
    Ok(next.run(req).await)
}
