//! Reqwest-backed implementation of the chat-completion endpoint.
//!
//! The completion endpoint does not speak the backend envelope: it is a
//! plain JSON API with its own authentication key, so it talks straight to a
//! reqwest client rather than going through the gateway pipeline.

use crate::config::ClientConfig;
use arcanum_core::api::ChatApi;
use arcanum_core::chat::{ChatCompletionRequest, ChatCompletionResponse, ChatCompletionResult};
use arcanum_core::error::{ArcanumError, Result};
use async_trait::async_trait;

/// Chat-completion fetcher.
#[derive(Clone)]
pub struct HttpChatApi {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpChatApi {
    /// Creates a fetcher using the chat endpoint settings of `config`.
    ///
    /// No request-level timeout is set here: the conversation manager owns
    /// the deadline and cancels the call cooperatively.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn create_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResult> {
        let body = ChatCompletionRequest {
            conversation_id: request.conversation_id.clone(),
            model: Some(self.config.resolve_model(request.model.as_deref())),
            stream: Some(request.stream.unwrap_or(false)),
            messages: request.messages.clone(),
        };

        let mut builder = self
            .client
            .post(&self.config.chat_endpoint)
            .header("Content-Type", "application/json")
            .json(&body);

        if let Some(api_key) = &self.config.chat_api_key {
            builder = builder.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = builder
            .send()
            .await
            .map_err(|err| ArcanumError::network(format!("Chat API 请求失败: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .ok()
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| format!("Chat API 请求失败（{}）", status.as_u16()));
            return Err(ArcanumError::upstream(status.as_u16() as i64, message));
        }

        // An unparseable body is tolerated: the caller treats empty content
        // as a soft failure on the assistant message.
        let raw: Option<ChatCompletionResponse> = match response.json().await {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                tracing::warn!("failed to parse chat completion body: {err}");
                None
            }
        };

        let content = raw
            .as_ref()
            .map(|r| r.extract_content().trim().to_string())
            .unwrap_or_default();

        Ok(ChatCompletionResult { content, raw })
    }
}
