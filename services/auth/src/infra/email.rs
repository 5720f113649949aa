//! Outbound email via an HTTP delivery API.

use anyhow::Context as _;
use serde_json::json;

use crate::domain::repository::EmailSender;

#[derive(Clone)]
pub struct HttpEmailSender {
    pub http: reqwest::Client,
    pub api_url: String,
    pub api_key: String,
    pub from: String,
}

impl EmailSender for HttpEmailSender {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), anyhow::Error> {
        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from,
                "to": to,
                "subject": subject,
                "html": html,
            }))
            .send()
            .await
            .context("email api request")?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("email api returned {status}: {detail}");
        }
        Ok(())
    }
}
