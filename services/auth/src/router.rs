use axum::{
    Router,
    http::{Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use nimbus_core::health::{healthz, readyz};
use nimbus_core::middleware::{request_id_layer, trace_layer};

use crate::handlers::{
    auth::{
        forgot_password, login, logout, me, refresh, register, resend_verification,
        reset_password, verify_email,
    },
    oauth::{github_callback, github_start, google_callback, google_start},
};
use crate::middleware::{auth_rate_limit, global_rate_limit, require_auth};
use crate::state::AppState;

/// Cookies cross origins, so CORS must name the frontend exactly and
/// allow credentials (a wildcard origin would make browsers drop them).
fn cors_layer(frontend_origin: String) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin, _| {
            origin.to_str().is_ok_and(|o| o == frontend_origin)
        }))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

pub fn build_router(state: AppState) -> Router {
    // Credential and token-minting endpoints carry the tight budget on
    // top of the service-wide limit.
    let throttled_routes = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/google", get(google_start))
        .route("/auth/github", get(github_start))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_rate_limit,
        ));

    let protected_routes = Router::new()
        .route("/auth/me", get(me))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Session
        .route("/auth/logout", post(logout))
        .route("/auth/verify-email/{token}", post(verify_email))
        .route("/auth/resend-verification-email", post(resend_verification))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password/{token}", post(reset_password))
        // OAuth callbacks (initiation lives in the throttled set)
        .route("/auth/google/callback", get(google_callback))
        .route("/auth/github/callback", get(github_callback))
        .merge(throttled_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            global_rate_limit,
        ))
        .layer(cors_layer(state.frontend_origin.clone()))
        .layer(trace_layer())
        .layer(request_id_layer())
        .with_state(state)
}
