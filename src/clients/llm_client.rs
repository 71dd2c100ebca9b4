//! Chat-completion client
//!
//! Wraps `async-openai` so any OpenAI-compatible endpoint works (OpenRouter
//! by default). The client knows nothing about MCQs or verdicts: text (and
//! optionally one image) in, raw text out. Every call is bounded by the
//! configured timeout; on expiry the call fails as a unit.

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs, ImageDetail,
        ImageUrl,
    },
    Client,
};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::LlmError;

/// LLM client for one endpoint; cheap to clone per model.
#[derive(Clone)]
pub struct LlmClient {
    client: Client<OpenAIConfig>,
    timeout: Duration,
}

impl LlmClient {
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            timeout: Duration::from_secs(config.llm_timeout_secs),
        }
    }

    /// Send one chat request and return the trimmed response text.
    ///
    /// # Arguments
    /// - `model`: model identifier on the configured endpoint
    /// - `user_message`: the prompt
    /// - `system_message`: optional system message
    /// - `image_data_url`: optional `data:image/...;base64,...` URL, sent as
    ///   a vision content part alongside the prompt text
    pub async fn chat(
        &self,
        model: &str,
        user_message: &str,
        system_message: Option<&str>,
        image_data_url: Option<&str>,
    ) -> Result<String, LlmError> {
        debug!(
            "calling LLM API, model: {}, prompt: {} chars",
            model,
            user_message.len()
        );

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(|e| LlmError::ApiCallFailed {
                    model: model.to_string(),
                    detail: e.to_string(),
                })?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = if let Some(url) = image_data_url {
            // Vision request: text part plus one image part
            let content_parts = vec![
                ChatCompletionRequestUserMessageContentPart::Text(
                    ChatCompletionRequestMessageContentPartText {
                        text: user_message.to_string(),
                    },
                ),
                ChatCompletionRequestUserMessageContentPart::ImageUrl(
                    ChatCompletionRequestMessageContentPartImage {
                        image_url: ImageUrl {
                            url: url.to_string(),
                            detail: Some(ImageDetail::Auto),
                        },
                    },
                ),
            ];

            ChatCompletionRequestUserMessageArgs::default()
                .content(ChatCompletionRequestUserMessageContent::Array(content_parts))
                .build()
                .map_err(|e| LlmError::ApiCallFailed {
                    model: model.to_string(),
                    detail: e.to_string(),
                })?
        } else {
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_message)
                .build()
                .map_err(|e| LlmError::ApiCallFailed {
                    model: model.to_string(),
                    detail: e.to_string(),
                })?
        };

        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .temperature(0.3)
            .build()
            .map_err(|e| LlmError::ApiCallFailed {
                model: model.to_string(),
                detail: e.to_string(),
            })?;

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| {
                warn!(
                    "LLM call timed out after {}s (model: {})",
                    self.timeout.as_secs(),
                    model
                );
                LlmError::Timeout {
                    model: model.to_string(),
                    secs: self.timeout.as_secs(),
                }
            })?
            .map_err(|e| {
                warn!("LLM API call failed (model: {}): {}", model, e);
                LlmError::ApiCallFailed {
                    model: model.to_string(),
                    detail: e.to_string(),
                }
            })?;

        debug!("LLM API call succeeded (model: {})", model);

        let content = response
            .choices
            .first()
            .ok_or_else(|| LlmError::EmptyResponse {
                model: model.to_string(),
            })?
            .message
            .content
            .clone()
            .ok_or_else(|| LlmError::EmptyContent {
                model: model.to_string(),
            })?;

        Ok(content.trim().to_string())
    }

    /// Plain text request without system message or image.
    pub async fn simple_chat(&self, model: &str, user_message: &str) -> Result<String, LlmError> {
        self.chat(model, user_message, None, None).await
    }
}
