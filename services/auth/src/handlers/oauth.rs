//! OAuth start and callback endpoints.
//!
//! Start sets the CSRF state cookie and bounces to the provider.
//! Callbacks never answer with JSON errors: the browser arrived here by
//! provider redirect, so every failure becomes a 302 to the frontend
//! error page carrying only a coarse code.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::domain::repository::OAuthProvider;
use crate::oauth::{OAuthCallbackError, generate_state};
use crate::state::AppState;
use crate::usecase::oauth_login::{OAuthLoginUseCase, ResolveError};

// ── GET /auth/google, /auth/github ────────────────────────────────────────────

pub async fn google_start(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    start(&state, state.google.clone(), jar)
}

pub async fn github_start(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    start(&state, state.github.clone(), jar)
}

fn start(state: &AppState, provider: impl OAuthProvider, jar: CookieJar) -> (CookieJar, Redirect) {
    let nonce = generate_state();
    let url = provider.authorization_url(&nonce);
    let jar = state.cookies.set_oauth_state(jar, nonce);
    (jar, Redirect::to(&url))
}

// ── GET /auth/google/callback, /auth/github/callback ──────────────────────────

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set by the provider when the user denied the consent screen.
    pub error: Option<String>,
}

pub async fn google_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> impl IntoResponse {
    callback(state.clone(), state.google.clone(), jar, query).await
}

pub async fn github_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> impl IntoResponse {
    callback(state.clone(), state.github.clone(), jar, query).await
}

async fn callback(
    state: AppState,
    provider: impl OAuthProvider,
    jar: CookieJar,
    query: CallbackQuery,
) -> (CookieJar, Redirect) {
    // The state cookie is single-use whatever happens next.
    let cleared = state.cookies.clear_oauth_state(jar.clone());
    match run_callback(&state, provider, &jar, query).await {
        Ok(out) => {
            let jar = state.cookies.set_access_token(cleared, out.access_token);
            let jar = state.cookies.set_refresh_token(jar, out.refresh_token);
            (jar, Redirect::to(&state.frontend_origin))
        }
        Err(code) => {
            let url = format!(
                "{}/auth/error?code={}",
                state.frontend_origin,
                code.query_code(),
            );
            (cleared, Redirect::to(&url))
        }
    }
}

async fn run_callback(
    state: &AppState,
    provider: impl OAuthProvider,
    jar: &CookieJar,
    query: CallbackQuery,
) -> Result<crate::usecase::oauth_login::OAuthLoginOutput, OAuthCallbackError> {
    if let Some(error) = query.error {
        tracing::info!(provider = provider.name(), error, "provider denied callback");
        return Err(OAuthCallbackError::CallbackFailed);
    }

    // Byte-for-byte match between the state cookie and the echoed
    // parameter; no mutation has happened yet, so aborting is clean.
    let expected = jar
        .get(&state.cookies.oauth_state_name())
        .map(|c| c.value().to_owned())
        .ok_or(OAuthCallbackError::InvalidState)?;
    let echoed = query.state.ok_or(OAuthCallbackError::InvalidState)?;
    if expected != echoed {
        return Err(OAuthCallbackError::InvalidState);
    }

    let code = query.code.ok_or(OAuthCallbackError::InvalidCode)?;
    let profile = provider.exchange_code(&code).await.map_err(|e| {
        tracing::warn!(provider = provider.name(), error = %e, "code exchange failed");
        OAuthCallbackError::InvalidCode
    })?;

    let usecase = OAuthLoginUseCase {
        users: state.user_repo(),
        profiles: state.profile_repo(),
        connections: state.connection_repo(),
        jwt_secret: state.jwt_secret.clone(),
    };
    usecase.execute(&profile).await.map_err(|e| match e {
        ResolveError::EmailMissing => OAuthCallbackError::EmailMissing,
        ResolveError::Service(e) => {
            tracing::error!(provider = profile.provider, error = %e, "oauth login failed");
            OAuthCallbackError::CallbackFailed
        }
    })
}
