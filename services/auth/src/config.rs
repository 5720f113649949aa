/// OAuth client settings for one provider.
#[derive(Debug, Clone)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl OAuthClientConfig {
    fn from_env(prefix: &str) -> Self {
        let var = |name: &str| {
            let key = format!("{prefix}_{name}");
            std::env::var(&key).unwrap_or_else(|_| panic!("{key}"))
        };
        Self {
            client_id: var("CLIENT_ID"),
            client_secret: var("CLIENT_SECRET"),
            redirect_uri: var("REDIRECT_URI"),
        }
    }
}

/// Auth service configuration loaded from environment variables.
#[derive(Debug)]
pub struct AuthConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Redis connection URL (rate-limit counters).
    pub redis_url: String,
    /// HMAC secret for signing JWT access and refresh tokens.
    pub jwt_secret: String,
    /// Cookie name prefix (e.g. "nimbus_"). Env var: `COOKIE_PREFIX`.
    pub cookie_prefix: String,
    /// Cookie Domain attribute (root domain, e.g. "example.com").
    pub cookie_domain: String,
    /// Frontend origin for OAuth redirects and CORS (e.g. "https://app.example.com").
    pub frontend_origin: String,
    /// "production" hardens cookies (Secure, SameSite=None). Env var: `ENVIRONMENT`.
    pub environment: String,
    /// TCP port to listen on (default 3100). Env var: `AUTH_PORT`.
    pub auth_port: u16,
    pub google: OAuthClientConfig,
    pub github: OAuthClientConfig,
    /// Email delivery HTTP API endpoint. Env var: `EMAIL_API_URL`.
    pub email_api_url: String,
    /// Bearer key for the email API. Env var: `EMAIL_API_KEY`.
    pub email_api_key: String,
    /// From address on outbound mail. Env var: `EMAIL_FROM`.
    pub email_from: String,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            redis_url: std::env::var("REDIS_URL").expect("REDIS_URL"),
            jwt_secret: std::env::var("JWT_SECRET").expect("JWT_SECRET"),
            cookie_prefix: std::env::var("COOKIE_PREFIX").expect("COOKIE_PREFIX"),
            cookie_domain: std::env::var("COOKIE_DOMAIN").expect("COOKIE_DOMAIN"),
            frontend_origin: std::env::var("FRONTEND_ORIGIN").expect("FRONTEND_ORIGIN"),
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_owned()),
            auth_port: std::env::var("AUTH_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3100),
            google: OAuthClientConfig::from_env("GOOGLE"),
            github: OAuthClientConfig::from_env("GITHUB"),
            email_api_url: std::env::var("EMAIL_API_URL").expect("EMAIL_API_URL"),
            email_api_key: std::env::var("EMAIL_API_KEY").expect("EMAIL_API_KEY"),
            email_from: std::env::var("EMAIL_FROM").expect("EMAIL_FROM"),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
