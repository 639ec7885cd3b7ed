//! Library root for `event-bot`.
//!
//! Event-bot is an OpenAI-powered assistant for a Slack channel designed to:
//! - Notice when a message describes a real-world event
//! - Extract the event's name, date, location, and link
//! - Reply with a readable event proposal, localized to a configured timezone
//!
//! The bot integrates with Slack for chat and OpenAI for extraction. The architecture is built
//! around extensible traits that allow for different implementations of each service.

#[deny(missing_docs)]
pub mod base;
pub mod extract;
pub mod interaction;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the event-bot runtime:
/// - Initializes the crypto provider
/// - Creates the runtime context with templates, LLM, extraction engine, and chat clients
/// - Starts the main event loop for processing messages
pub async fn start(config: Config) -> Void {
    info!("Starting event-bot ...");

    // Start the crypto provider.
    crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("A crypto provider is already installed."))?;

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
