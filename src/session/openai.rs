//! Chat backend for OpenAI-compatible chat-completion endpoints.

use super::{ChatBackend, Completion, InlineImage, Turn, UsageRecord, UserContent};
use crate::config::{ChatSettings, Credentials};
use crate::error::{Result, SentinelError};
use crate::openai::create_client_with_timeout;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestMessageContentPartImageArgs,
    ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionRequestUserMessageContent, ChatCompletionRequestUserMessageContentPart,
    CreateChatCompletionRequestArgs, ImageUrlArgs,
};
use async_trait::async_trait;
use base64::Engine;
use std::time::Duration;
use tracing::{debug, instrument};

/// Chat backend talking to an OpenAI-compatible API (Gemini's compatibility layer by default).
pub struct OpenAiChat {
    client: async_openai::Client<OpenAIConfig>,
    model: String,
}

impl OpenAiChat {
    /// Create a backend from chat settings and the resolved credentials.
    pub fn new(settings: &ChatSettings, credentials: &Credentials) -> Result<Self> {
        let client = create_client_with_timeout(
            &credentials.chat_key,
            &settings.api_base,
            Duration::from_secs(settings.timeout_seconds),
        )?;

        Ok(Self {
            client,
            model: settings.model.clone(),
        })
    }

    /// Get the model name.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatBackend for OpenAiChat {
    #[instrument(skip(self, history), fields(model = %self.model, turns = history.len()))]
    async fn complete(&self, history: &[Turn]) -> Result<Completion> {
        let messages = to_request_messages(history)?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()
            .map_err(|e| SentinelError::Chat(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| SentinelError::Chat(e.to_string()))?;

        let text = response
            .choices
            .first()
            .ok_or_else(|| SentinelError::Chat("No response from model".to_string()))?
            .message
            .content
            .clone()
            .unwrap_or_default();

        let usage = response
            .usage
            .map(|u| UsageRecord {
                input_tokens: u64::from(u.prompt_tokens),
                output_tokens: u64::from(u.completion_tokens),
            })
            .unwrap_or_default();

        debug!("Model replied with {} characters", text.chars().count());

        Ok(Completion { text, usage })
    }
}

/// Convert the conversation log into chat-completion request messages.
fn to_request_messages(history: &[Turn]) -> Result<Vec<ChatCompletionRequestMessage>> {
    history
        .iter()
        .map(|turn| match turn {
            Turn::User { content, .. } => user_message(content),
            Turn::Model { text, .. } => ChatCompletionRequestAssistantMessageArgs::default()
                .content(text.as_str())
                .build()
                .map(Into::into)
                .map_err(|e| SentinelError::Chat(e.to_string())),
        })
        .collect()
}

fn user_message(content: &UserContent) -> Result<ChatCompletionRequestMessage> {
    let body = match content {
        UserContent::Text(text) => ChatCompletionRequestUserMessageContent::Text(text.clone()),
        UserContent::TextWithImage { text, image } => {
            let text_part = ChatCompletionRequestMessageContentPartTextArgs::default()
                .text(text.as_str())
                .build()
                .map_err(|e| SentinelError::Chat(e.to_string()))?;

            let image_url = ImageUrlArgs::default()
                .url(data_url(image))
                .build()
                .map_err(|e| SentinelError::Chat(e.to_string()))?;
            let image_part = ChatCompletionRequestMessageContentPartImageArgs::default()
                .image_url(image_url)
                .build()
                .map_err(|e| SentinelError::Chat(e.to_string()))?;

            ChatCompletionRequestUserMessageContent::Array(vec![
                ChatCompletionRequestUserMessageContentPart::Text(text_part),
                ChatCompletionRequestUserMessageContentPart::ImageUrl(image_part),
            ])
        }
    };

    ChatCompletionRequestUserMessageArgs::default()
        .content(body)
        .build()
        .map(Into::into)
        .map_err(|e| SentinelError::Chat(e.to_string()))
}

/// Encode an image as a `data:` URL.
fn data_url(image: &InlineImage) -> String {
    format!(
        "data:{};base64,{}",
        image.media_type,
        base64::engine::general_purpose::STANDARD.encode(&image.data)
    )
}
