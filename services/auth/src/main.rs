use sea_orm::Database;
use tracing::info;

use nimbus_auth::config::AuthConfig;
use nimbus_auth::infra::email::HttpEmailSender;
use nimbus_auth::oauth::{GitHubOAuth, GoogleOAuth};
use nimbus_auth::router::build_router;
use nimbus_auth::state::AppState;
use nimbus_auth_types::cookie::CookiePolicy;

#[tokio::main]
async fn main() {
    nimbus_core::tracing::init_tracing();

    let config = AuthConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let redis_cfg = deadpool_redis::Config::from_url(&config.redis_url);
    let redis = redis_cfg
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .expect("failed to create Redis pool");

    let http = reqwest::Client::new();

    let cookies = CookiePolicy {
        prefix: config.cookie_prefix.clone(),
        domain: config.cookie_domain.clone(),
        secure: config.is_production(),
    };

    let state = AppState {
        db,
        redis,
        jwt_secret: config.jwt_secret,
        cookies,
        frontend_origin: config.frontend_origin,
        google: GoogleOAuth::new(http.clone(), config.google),
        github: GitHubOAuth::new(http.clone(), config.github),
        email: HttpEmailSender {
            http,
            api_url: config.email_api_url,
            api_key: config.email_api_key,
            from: config.email_from,
        },
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.auth_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("auth service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
