//! Thin reqwest wrapper over the auth service API.

use serde::Deserialize;
use serde_json::Value;

use crate::coordinator::RefreshTransport;
use crate::error::ClientError;

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

#[derive(Deserialize)]
struct DataEnvelope {
    data: Value,
}

/// Cookie-holding HTTP client for the auth service. Session and
/// refresh cookies set by the service ride along automatically.
#[derive(Clone)]
pub struct AuthApi {
    http: reqwest::Client,
    base_url: String,
}

impl AuthApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(ClientError::from)?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// POST a JSON body and unwrap the `data` envelope.
    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, ClientError> {
        let response = self.http.post(self.url(path)).json(body).send().await?;
        unwrap_envelope(response).await
    }

    /// GET and unwrap the `data` envelope.
    pub async fn get(&self, path: &str) -> Result<Value, ClientError> {
        let response = self.http.get(self.url(path)).send().await?;
        unwrap_envelope(response).await
    }
}

impl RefreshTransport for AuthApi {
    async fn refresh(&self) -> Result<(), ClientError> {
        let response = self.http.post(self.url("/auth/refresh")).send().await?;
        unwrap_envelope(response).await.map(|_| ())
    }
}

async fn unwrap_envelope(response: reqwest::Response) -> Result<Value, ClientError> {
    if response.status().is_success() {
        let envelope: DataEnvelope = response.json().await?;
        return Ok(envelope.data);
    }

    let status = response.status();
    match response.json::<ErrorEnvelope>().await {
        Ok(envelope) => Err(ClientError::Api {
            code: envelope.error.code,
            message: envelope.error.message,
        }),
        // Proxies can answer with non-envelope bodies; keep the status.
        Err(_) => Err(ClientError::Network(format!("http {status}"))),
    }
}
