//! Per-caller request throttling backed by Redis counters.
//!
//! Two tiers: a broad limit across the whole service and a tight one on
//! the credential and token-minting endpoints (login, register,
//! refresh, OAuth initiation). The counter key identifies the caller
//! by the best handle available, in
//! order: authenticated user id, email from a JSON body, then
//! `ip:path:user-agent`. Keying credential endpoints by the targeted
//! email means a distributed guessing run against one account shares a
//! single budget.
//!
//! Counter failures never block traffic: when Redis is down the request
//! goes through and the outage is logged.

use axum::{
    body::{Body, to_bytes},
    extract::{Request, State},
    http::header::{CONTENT_LENGTH, CONTENT_TYPE, USER_AGENT},
    middleware::Next,
    response::Response,
};

use nimbus_domain::email::normalize_email;

use crate::domain::repository::RateLimitStore;
use crate::error::AuthServiceError;
use crate::state::AppState;

use nimbus_auth_types::token::validate_access_token;

/// Broad tier: requests per caller across all routes.
const GLOBAL_LIMIT: u64 = 60;
const GLOBAL_WINDOW_SECS: u64 = 60;

/// Credential tier: attempts per caller on the throttled route set.
const AUTH_LIMIT: u64 = 5;
const AUTH_WINDOW_SECS: u64 = 900;

/// Largest JSON body worth buffering to pull the email out of.
const MAX_SNIFF_BYTES: usize = 16 * 1024;

pub async fn global_rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AuthServiceError> {
    enforce(&state, "global", GLOBAL_LIMIT, GLOBAL_WINDOW_SECS, req, next).await
}

pub async fn auth_rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AuthServiceError> {
    enforce(&state, "auth", AUTH_LIMIT, AUTH_WINDOW_SECS, req, next).await
}

async fn enforce(
    state: &AppState,
    tier: &str,
    limit: u64,
    window_secs: u64,
    req: Request,
    next: Next,
) -> Result<Response, AuthServiceError> {
    let (req, ident) = caller_identity(state, req).await;
    let key = format!("{tier}:{ident}");

    match state.rate_limits().increment(&key, window_secs).await {
        Ok(count) if count > limit => {
            tracing::warn!(tier, key, count, "rate limit exceeded");
            return Err(AuthServiceError::RateLimited {
                retry_after_secs: window_secs,
            });
        }
        Ok(_) => {}
        // Fail open.
        Err(e) => tracing::warn!(error = %e, "rate-limit store unavailable"),
    }

    Ok(next.run(req).await)
}

/// Best available handle for the caller. Consumes and reinstates the
/// request body when it has to look inside it.
async fn caller_identity(state: &AppState, req: Request) -> (Request, String) {
    if let Some(user_id) = token_user(state, &req) {
        return (req, format!("user:{user_id}"));
    }

    let (req, email) = body_email(req).await;
    if let Some(email) = email {
        return (req, format!("email:{email}"));
    }

    let key = anonymous_key(&req);
    (req, key)
}

fn token_user(state: &AppState, req: &Request) -> Option<uuid::Uuid> {
    let token = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned)
        .or_else(|| cookie_value(req, &state.cookies.access_token_name()))?;
    validate_access_token(&token, &state.jwt_secret)
        .ok()
        .map(|info| info.user_id)
}

fn cookie_value(req: &Request, name: &str) -> Option<String> {
    let header = req
        .headers()
        .get(axum::http::header::COOKIE)?
        .to_str()
        .ok()?;
    header.split(';').find_map(|pair| {
        let (k, v) = pair.trim().split_once('=')?;
        (k == name).then(|| v.to_owned())
    })
}

/// Pull `email` out of a small JSON body, putting the bytes back so the
/// handler can deserialize it again.
async fn body_email(req: Request) -> (Request, Option<String>) {
    let is_json = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    let declared_len = req
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if !is_json || !declared_len.is_some_and(|n| n > 0 && n <= MAX_SNIFF_BYTES) {
        return (req, None);
    }

    let (parts, body) = req.into_parts();
    let bytes = match to_bytes(body, MAX_SNIFF_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "failed to buffer request body");
            return (Request::from_parts(parts, Body::empty()), None);
        }
    };

    let email = serde_json::from_slice::<serde_json::Value>(&bytes)
        .ok()
        .and_then(|v| v.get("email")?.as_str().map(normalize_email));

    (Request::from_parts(parts, Body::from(bytes)), email)
}

fn anonymous_key(req: &Request) -> String {
    let ip = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("unknown")
        .to_owned();
    let ua: String = req
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .chars()
        .take(32)
        .collect();
    format!("anon:{ip}:{}:{ua}", req.uri().path())
}
