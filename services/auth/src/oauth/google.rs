//! Google OAuth adapter.

use anyhow::Context as _;
use serde::Deserialize;

use crate::config::OAuthClientConfig;
use crate::domain::repository::OAuthProvider;
use crate::domain::types::NormalizedProfile;
use crate::oauth::OAuthExchangeError;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

#[derive(Clone)]
pub struct GoogleOAuth {
    http: reqwest::Client,
    config: OAuthClientConfig,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Deserialize)]
struct UserInfo {
    id: String,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

impl GoogleOAuth {
    pub fn new(http: reqwest::Client, config: OAuthClientConfig) -> Self {
        Self { http, config }
    }
}

impl OAuthProvider for GoogleOAuth {
    fn name(&self) -> &'static str {
        "google"
    }

    fn authorization_url(&self, state: &str) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", "openid email profile")
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
            .form(&[
                ("code", code),
                ("client_id", &self.config.client_id),
                ("client_secret", &self.config.client_secret),
                ("redirect_uri", &self.config.redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .context("google token endpoint")?;

        if !response.status().is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(provider = "google", %detail, "token exchange rejected");
            return Err(OAuthExchangeError::InvalidCode);
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("google token response body")?;
        let access_token = token.access_token.ok_or(OAuthExchangeError::InvalidCode)?;

        let info: UserInfo = self
            .http
            .get(USERINFO_URL)
            .bearer_auth(&access_token)
            .send()
            .await
            .context("google userinfo endpoint")?
            .error_for_status()
            .context("google userinfo status")?
            .json()
            .await
            .context("google userinfo body")?;

        Ok(NormalizedProfile {
            provider: "google",
            provider_user_id: info.id,
            email: info.email,
            name: info.name,
            picture: info.picture,
        })
    }
}
