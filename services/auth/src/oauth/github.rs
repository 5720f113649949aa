//! GitHub OAuth adapter.
//!
//! GitHub differs from Google in two ways: the token endpoint returns
//! form-encoded data unless asked for JSON, and the profile email may
//! be null for users who hide it, in which case the primary verified
//! address is fetched from `/user/emails`.

use anyhow::Context as _;
use serde::Deserialize;

use crate::config::OAuthClientConfig;
use crate::domain::repository::OAuthProvider;
use crate::domain::types::NormalizedProfile;
use crate::oauth::OAuthExchangeError;

const AUTH_URL: &str = "https://github.com/login/oauth/authorize";
const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const USER_URL: &str = "https://api.github.com/user";
const EMAILS_URL: &str = "https://api.github.com/user/emails";

/// GitHub's API rejects requests without a User-Agent.
const USER_AGENT: &str = "nimbus-auth";

#[derive(Clone)]
pub struct GitHubOAuth {
    http: reqwest::Client,
    config: OAuthClientConfig,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Deserialize)]
struct GitHubUser {
    id: i64,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Deserialize)]
struct GitHubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

impl GitHubOAuth {
    pub fn new(http: reqwest::Client, config: OAuthClientConfig) -> Self {
        Self { http, config }
    }

    /// Fallback for users with a private profile email. Failure here is
    /// logged and treated as "no email"; the resolver decides whether
    /// that is fatal.
    async fn fetch_primary_email(&self, access_token: &str) -> Option<String> {
        let result = self
            .http
            .get(EMAILS_URL)
            .bearer_auth(access_token)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .and_then(|r| r.error_for_status());
        let emails: Vec<GitHubEmail> = match result {
            Ok(response) => match response.json().await {
                Ok(emails) => emails,
                Err(e) => {
                    tracing::warn!(error = %e, "github emails body unreadable");
                    return None;
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "github emails endpoint failed");
                return None;
            }
        };
        emails
            .iter()
            .find(|e| e.primary && e.verified)
            .or_else(|| emails.iter().find(|e| e.verified))
            .map(|e| e.email.clone())
    }
}

impl OAuthProvider for GitHubOAuth {
    fn name(&self) -> &'static str {
        "github"
    }

    fn authorization_url(&self, state: &str) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", "read:user user:email")
            .append_pair("state", state)
            .finish();
        format!("{AUTH_URL}?{query}")
    }

    async fn exchange_code(
        &self,
        code: &str,
    ) -> Result<NormalizedProfile, OAuthExchangeError> {
        let response = self
            .http
            .post(TOKEN_URL)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("code", code),
                ("client_id", &self.config.client_id),
                ("client_secret", &self.config.client_secret),
                ("redirect_uri", &self.config.redirect_uri),
            ])
            .send()
            .await
            .context("github token endpoint")?;

        if !response.status().is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(provider = "github", %detail, "token exchange rejected");
            return Err(OAuthExchangeError::InvalidCode);
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("github token response body")?;
        let access_token = token.access_token.ok_or(OAuthExchangeError::InvalidCode)?;

        let user: GitHubUser = self
            .http
            .get(USER_URL)
            .bearer_auth(&access_token)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .context("github user endpoint")?
            .error_for_status()
            .context("github user status")?
            .json()
            .await
            .context("github user body")?;

        let email = match user.email {
            Some(email) => Some(email),
            None => self.fetch_primary_email(&access_token).await,
        };

        Ok(NormalizedProfile {
            provider: "github",
            provider_user_id: user.id.to_string(),
            email,
            name: user.name,
            picture: user.avatar_url,
        })
    }
}
