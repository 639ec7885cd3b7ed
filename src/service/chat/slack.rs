//! Chat service integration for event-bot.
//!
//! This module provides functionality for interacting with Slack:
//! - Receiving message events over socket mode
//! - Posting replies into threads
//! - Resolving channel names for the channel binding

use crate::{
    base::{
        config::Config,
        types::{Res, Void},
    },
    extract::ExtractionEngine,
    interaction::{self, chat_event::IncomingMessage},
};
use async_trait::async_trait;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use slack_morphism::prelude::*;
use tracing::{debug, info, instrument, warn};

use std::sync::Arc;

use super::{ChatClient, GenericChatClient};

// Type aliases.

type FullClient = slack_morphism::SlackClient<SlackClientHyperConnector<HttpsConnector<HttpConnector>>>;

// Extra methods on `ChatClient` applied by the slack implementation.

impl ChatClient {
    /// Creates a new Slack chat client.
    pub async fn slack(config: &Config, engine: ExtractionEngine) -> Res<Self> {
        let client = SlackChatClient::new(config, engine).await?;
        Ok(Self { inner: Arc::new(client) })
    }
}

impl From<SlackChatClient> for ChatClient {
    fn from(client: SlackChatClient) -> Self {
        Self { inner: Arc::new(client) }
    }
}

// Structs.

/// User state for the slack socket client.
struct SlackUserState {
    engine: ExtractionEngine,
    chat: ChatClient,
    bind_channel_name: String,
}

/// Slack client implementation.
#[derive(Clone)]
struct SlackChatClient {
    pub app_token: SlackApiToken,
    pub bot_token: SlackApiToken,
    pub bot_user_id: String,
    pub bind_channel_name: String,
    pub client: Arc<FullClient>,
    pub engine: ExtractionEngine,
}

impl SlackChatClient {
    /// Create a new Slack chat client.
    #[instrument(name = "SlackChatClient::new", skip_all)]
    pub async fn new(config: &Config, engine: ExtractionEngine) -> Res<Self> {
        // Initialize tokens.

        let app_token = SlackApiToken::new(SlackApiTokenValue(config.slack_app_token.clone()));
        let bot_token = SlackApiToken::new(SlackApiTokenValue(config.slack_bot_token.clone()));

        // Initialize the Slack client.

        let https_connector = HttpsConnector::<HttpConnector>::builder().with_native_roots()?.https_only().enable_all_versions().build();
        let connector = SlackClientHyperConnector::with_connector(https_connector);
        let client = Arc::new(slack_morphism::SlackClient::new(connector));

        // Get the bot's user ID.

        let session = client.open_session(&bot_token);
        let bot_user = session.auth_test().await?;
        let bot_user_id = bot_user.user_id.0;

        info!("Slack bot user ID: {}", bot_user_id);

        Ok(Self {
            app_token,
            bot_token,
            bot_user_id,
            bind_channel_name: config.bind_channel_name.clone(),
            client,
            engine,
        })
    }
}

#[async_trait]
impl GenericChatClient for SlackChatClient {
    fn bot_user_id(&self) -> &str {
        &self.bot_user_id
    }

    async fn start(&self) -> Void {
        // Initialize the socket mode listener.

        let socket_mode_callbacks = SlackSocketModeListenerCallbacks::new().with_push_events(handle_push_event);

        // Initialize the socket mode listener environment.

        let listener_environment = Arc::new(SlackClientEventsListenerEnvironment::new(self.client.clone()).with_user_state(SlackUserState {
            engine: self.engine.clone(),
            chat: ChatClient::from(self.clone()),
            bind_channel_name: self.bind_channel_name.clone(),
        }));

        let socket_mode_listener = Arc::new(SlackClientSocketModeListener::new(
            &SlackClientSocketModeConfig::new(),
            listener_environment.clone(),
            socket_mode_callbacks,
        ));

        // Register an app token to listen for events,
        socket_mode_listener.listen_for(&self.app_token).await?;

        info!("Bot is online; listening in `#{}`.", self.bind_channel_name);

        // Start WS connections calling Slack API to get WS url for the token,
        // and wait for Ctrl-C to shutdown.
        socket_mode_listener.serve().await;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn send_message(&self, channel_id: &str, thread_ts: &str, text: &str) -> Void {
        let message = SlackMessageContent::new().with_text(text.to_string());

        let request = SlackApiChatPostMessageRequest::new(SlackChannelId(channel_id.to_string()), message)
            .with_as_user(true)
            .with_thread_ts(SlackTs(thread_ts.to_string()))
            .with_link_names(true);

        let session = self.client.open_session(&self.bot_token);

        let _ = session.chat_post_message(&request).await.map_err(|e| anyhow::anyhow!("Failed to send message: {}", e))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_channel_name(&self, channel_id: &str) -> Res<String> {
        let request = SlackApiConversationsInfoRequest::new(SlackChannelId(channel_id.to_string()));
        let session = self.client.open_session(&self.bot_token);

        let response = session.conversations_info(&request).await.map_err(|e| anyhow::anyhow!("Failed to get channel info: {}", e))?;

        // Direct messages have no name, and can never match the binding.
        Ok(response.channel.name.unwrap_or_default())
    }
}

// Socket mode listener callbacks for Slack.
//
// Only push events are registered; there are no slash commands or interactive components.

/// Handles push events from Slack.
#[instrument(skip_all)]
async fn handle_push_event(event_callback: SlackPushEventCallback, _client: Arc<SlackHyperClient>, states: SlackClientEventsUserState) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let event = event_callback.event;
    let states = states.read().await;
    let user_state = states.get_user_state::<SlackUserState>().ok_or(anyhow::anyhow!("Failed to get user state"))?;

    match event {
        SlackEventCallbackBody::Message(slack_message_event) => {
            let Some(message) = to_incoming_message(&slack_message_event) else {
                debug!("Skipping message event without a user-authored body.");
                return Ok(());
            };

            info!("Received message event ...");

            interaction::chat_event::handle_chat_event(message, user_state.bind_channel_name.clone(), user_state.engine.clone(), user_state.chat.clone());
        }
        _ => {
            warn!("Received unhandled push event.")
        }
    }

    Ok(())
}

/// Convert a Slack message event into an [`IncomingMessage`].
///
/// Edits, deletions, and other subtyped events, as well as bot-authored messages, are dropped.
fn to_incoming_message(event: &SlackMessageEvent) -> Option<IncomingMessage> {
    if event.subtype.is_some() || event.sender.bot_id.is_some() {
        return None;
    }

    let channel_id = event.origin.channel.as_ref()?.0.clone();
    let text = event.content.as_ref().and_then(|c| c.text.clone()).unwrap_or_default();

    Some(IncomingMessage {
        channel_id,
        ts: event.origin.ts.0.clone(),
        thread_ts: event.origin.thread_ts.as_ref().map(|ts| ts.0.clone()),
        user_id: event.sender.user.as_ref().map(|user| user.0.clone()),
        text,
    })
}
