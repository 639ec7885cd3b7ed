//! Runtime services and shared state for the event-bot.

use std::path::Path;

use tracing::{info, instrument};

use crate::{
    base::{
        config::Config,
        templates::Templates,
        types::{Res, Void},
    },
    extract::ExtractionEngine,
    service::{chat::ChatClient, llm::LlmClient},
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the LLM client, the extraction engine, the chat client, and configuration.
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The LLM client instance.
    pub llm: LlmClient,
    /// The extraction engine.
    pub engine: ExtractionEngine,
    /// The chat client instance.
    pub chat: ChatClient,
}

impl Runtime {
    /// Create a new runtime instance.
    ///
    /// Fails before connecting to anything if the templates cannot be loaded.
    #[instrument(skip_all)]
    pub async fn new(config: Config) -> Res<Self> {
        // Load the templates.
        let templates = Templates::load(config.template_dir.as_deref().map(Path::new))?;
        info!("Templates loaded.");

        // Initialize the LLM client.
        let llm = LlmClient::openai(&config);

        // Initialize the extraction engine.
        let engine = ExtractionEngine::from_config(&config, llm.clone(), templates)?;

        // Initialize the chat client.
        let chat = ChatClient::slack(&config, engine.clone()).await?;

        Ok(Self { config, llm, engine, chat })
    }

    pub async fn start(&self) -> Void {
        self.chat.start().await
    }
}
