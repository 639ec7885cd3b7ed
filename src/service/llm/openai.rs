//! Integration with Large Language Model services.
//!
//! This module provides a thin wrapper around the OpenAI chat completions API
//! for turning a system prompt and a user message into raw completion text.

use std::{sync::Arc, time::Duration};

use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest, CreateChatCompletionRequestArgs, CreateChatCompletionResponse},
};
use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{debug, info, instrument};

use crate::base::{config::Config, types::Res};

use super::{GenericLlmClient, LlmClient};

// Extra methods on `LlmClient` applied by the openai implementation.

impl LlmClient {
    pub fn openai(config: &Config) -> Self {
        let client = OpenAiLlmClient::new(config);
        Self { inner: Arc::new(client) }
    }
}

// Specific implementations.

/// OpenAI LLM client implementation.
#[derive(Clone)]
pub struct OpenAiLlmClient {
    client: Client<OpenAIConfig>,
    config: Config,
}

impl OpenAiLlmClient {
    /// Create a new OpenAI LLM client.
    #[instrument(name = "OpenAiLlmClient::new", skip_all)]
    pub fn new(config: &Config) -> Self {
        Self::with_openai_config(config, OpenAIConfig::new())
    }

    /// Create a new OpenAI LLM client on top of an explicit `async-openai` config (e.g. a different API base).
    pub fn with_openai_config(config: &Config, openai_config: OpenAIConfig) -> Self {
        let cfg = openai_config.with_api_key(config.openai_api_key.clone());

        Self {
            client: Client::with_config(cfg),
            config: config.clone(),
        }
    }

    /// Build the two-message request: the system prompt, then the user's message.
    #[instrument(name = "OpenAiLlmClient::build_request", skip_all)]
    fn build_request(&self, system_prompt: &str, user_message: &str) -> Res<CreateChatCompletionRequest> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default().content(system_prompt).build()?.into(),
            ChatCompletionRequestUserMessageArgs::default().content(user_message).build()?.into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.config.openai_model)
            .temperature(self.config.openai_temperature)
            .max_completion_tokens(self.config.openai_max_tokens)
            .n(1)
            .messages(messages)
            .build()?;

        Ok(request)
    }

    /// Make the OpenAI API call, bounded by the configured timeout.
    ///
    /// Failures are not retried; the caller decides what to surface.
    async fn call_openai_api(&self, request: CreateChatCompletionRequest) -> Res<CreateChatCompletionResponse> {
        let limit = Duration::from_secs(self.config.openai_timeout_secs);

        match timeout(limit, self.client.chat().create(request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(err)) => Err(anyhow::anyhow!("OpenAI API call failed: {err}")),
            Err(_) => Err(anyhow::anyhow!("OpenAI API call timed out after {}s", limit.as_secs())),
        }
    }
}

#[async_trait]
impl GenericLlmClient for OpenAiLlmClient {
    #[instrument(name = "OpenAiLlmClient::complete", skip_all)]
    async fn complete(&self, system_prompt: &str, user_message: &str) -> Res<String> {
        let request = self.build_request(system_prompt, user_message)?;

        let response = self.call_openai_api(request).await?;

        info!("LLM response has {} choices.", response.choices.len());

        let content = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Did not receive a completion."))?
            .message
            .content
            .unwrap_or_default();

        debug!("LLM completion: {content}");

        Ok(content)
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use async_openai::types::{ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessageContent};

    use super::*;
    use crate::base::config::ConfigInner;

    fn create_test_config() -> Config {
        Config {
            inner: Arc::new(ConfigInner {
                openai_api_key: "test_key".to_string(),
                openai_model: "gpt-4.1-mini".to_string(),
                openai_temperature: 0.0,
                openai_max_tokens: 200u32,
                openai_timeout_secs: 5,
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_build_request_has_system_then_user_message() {
        let client = OpenAiLlmClient::new(&create_test_config());

        let request = client.build_request("You extract events.", "Picnic Saturday at noon").unwrap();

        assert_eq!(request.model, "gpt-4.1-mini");
        assert_eq!(request.n, Some(1));
        assert_eq!(request.max_completion_tokens, Some(200));
        assert_eq!(request.messages.len(), 2);

        let ChatCompletionRequestMessage::System(system) = &request.messages[0] else {
            panic!("first message should be the system prompt");
        };
        assert!(matches!(&system.content, ChatCompletionRequestSystemMessageContent::Text(text) if text == "You extract events."));

        let ChatCompletionRequestMessage::User(user) = &request.messages[1] else {
            panic!("second message should be the user message");
        };
        assert!(matches!(&user.content, ChatCompletionRequestUserMessageContent::Text(text) if text == "Picnic Saturday at noon"));
    }

    #[tokio::test]
    async fn test_complete_times_out_on_unresponsive_server() {
        // Connections complete in the backlog, but nothing ever answers.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let api_base = format!("http://{}/v1", listener.local_addr().unwrap());

        let mut config = create_test_config();
        Arc::make_mut(&mut config.inner).openai_timeout_secs = 1;

        let client = OpenAiLlmClient::with_openai_config(&config, OpenAIConfig::new().with_api_base(api_base));

        let started = std::time::Instant::now();
        let err = client.complete("You extract events.", "test").await.unwrap_err();

        assert!(err.to_string().contains("timed out after 1s"), "{err}");
        assert!(started.elapsed() < Duration::from_secs(10));

        drop(listener);
    }
}
