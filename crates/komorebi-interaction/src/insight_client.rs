use crate::edge_client::EdgeFunctionClient;
use async_trait::async_trait;
use komorebi_core::config::EndpointConfig;
use komorebi_core::error::Result;
use komorebi_core::remote::{InsightReply, InsightRequest, InsightService};

/// [`InsightService`] backed by the hosted `generate-insight` function.
#[derive(Clone)]
pub struct InsightApiClient {
    inner: EdgeFunctionClient,
}

impl InsightApiClient {
    pub fn from_config(config: &EndpointConfig) -> Result<Self> {
        Ok(Self {
            inner: EdgeFunctionClient::new(
                "insight",
                &config.insight_url,
                config.api_key.clone(),
                EdgeFunctionClient::timeout_of(config),
            )?,
        })
    }

    pub fn url(&self) -> &str {
        self.inner.url()
    }
}

#[async_trait]
impl InsightService for InsightApiClient {
    async fn generate_quote(&self, request: &InsightRequest) -> Result<InsightReply> {
        tracing::debug!(
            session_type = %request.session_type,
            messages = request.session_messages.len(),
            "Requesting insight quote"
        );
        self.inner.post_json(request).await
    }
}
