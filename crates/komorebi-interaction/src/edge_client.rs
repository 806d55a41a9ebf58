//! Shared JSON-over-HTTP plumbing for the hosted functions.

use komorebi_core::config::EndpointConfig;
use komorebi_core::error::{KomorebiError, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone)]
pub(crate) struct EdgeFunctionClient {
    client: Client,
    service: &'static str,
    url: String,
    api_key: Option<String>,
}

impl EdgeFunctionClient {
    pub(crate) fn new(
        service: &'static str,
        url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|err| {
            KomorebiError::config(format!("Failed to build HTTP client for {service}: {err}"))
        })?;
        Ok(Self {
            client,
            service,
            url: url.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    pub(crate) fn timeout_of(config: &EndpointConfig) -> Duration {
        Duration::from_secs(config.timeout_secs)
    }

    pub(crate) fn url(&self) -> &str {
        &self.url
    }

    /// POSTs `body` and decodes the JSON response.
    pub(crate) async fn post_json<Req, Resp>(&self, body: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let mut request = self.client.post(&self.url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key).header("apikey", key);
        }

        let response = request.json(body).send().await.map_err(|err| {
            let kind = if err.is_timeout() {
                "timed out"
            } else if err.is_connect() {
                "connection failed"
            } else {
                "request failed"
            };
            KomorebiError::remote(self.service, format!("{kind}: {err}"))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(map_http_error(self.service, status, body_text));
        }

        response.json().await.map_err(|err| {
            KomorebiError::remote(self.service, format!("Failed to parse response: {err}"))
        })
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

fn map_http_error(service: &'static str, status: StatusCode, body: String) -> KomorebiError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error)
        .unwrap_or(body);
    KomorebiError::remote(service, format!("HTTP {}: {}", status.as_u16(), message))
}
