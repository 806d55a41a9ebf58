use crate::edge_client::EdgeFunctionClient;
use async_trait::async_trait;
use komorebi_core::config::EndpointConfig;
use komorebi_core::error::Result;
use komorebi_core::remote::{ChatReply, ChatRequest, ChatService};

/// [`ChatService`] backed by the hosted `chat` function.
#[derive(Clone)]
pub struct ChatApiClient {
    inner: EdgeFunctionClient,
}

impl ChatApiClient {
    pub fn from_config(config: &EndpointConfig) -> Result<Self> {
        Ok(Self {
            inner: EdgeFunctionClient::new(
                "chat",
                &config.chat_url,
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
impl ChatService for ChatApiClient {
    async fn send_message(&self, request: &ChatRequest) -> Result<ChatReply> {
        tracing::debug!(
            session_type = %request.session_type,
            history = request.conversation_history.len(),
            "Sending chat request"
        );
        self.inner.post_json(request).await
    }
}
