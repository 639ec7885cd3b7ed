use tracing::{Instrument, error, info, instrument, warn};

use crate::{
    base::{
        error::ExtractError,
        types::{ExtractionRequest, ExtractionResult, Void},
    },
    extract::ExtractionEngine,
    service::chat::ChatClient,
};

/// Posted while the completion is in flight.
pub const THINKING_MESSAGE: &str = "Thinking...";

/// Posted when the model decides the message is not an event.
pub const NOT_AN_EVENT_MESSAGE: &str = "Sorry, that didn't look like an event to me.";

/// A chat message, as delivered by the chat platform.
#[derive(Debug, Clone, Default)]
pub struct IncomingMessage {
    /// The channel the message was posted in.
    pub channel_id: String,
    /// The message timestamp / ID.
    pub ts: String,
    /// The parent thread, if the message is a reply.
    pub thread_ts: Option<String>,
    /// The author, if the message came from a user.
    pub user_id: Option<String>,
    /// The raw message text.
    pub text: String,
}

impl IncomingMessage {
    /// The thread replies should go to.
    pub fn reply_thread(&self) -> &str {
        self.thread_ts.as_deref().unwrap_or(&self.ts)
    }
}

#[instrument(skip_all)]
pub fn handle_chat_event(message: IncomingMessage, bind_channel_name: String, engine: ExtractionEngine, chat: ChatClient) {
    tokio::spawn(async move {
        // Process the event.
        let result = process_chat_event(message, &bind_channel_name, &engine, &chat).in_current_span().await;

        // Log any errors.
        if let Err(err) = &result {
            error!("Error while handling: {}", err);
        }
    });
}

/// Run the extraction pipeline for a single message and post exactly one reply.
///
/// Messages from the bot itself, empty messages, and messages outside the bound
/// channel are ignored without a reply.
#[instrument(skip_all, fields(channel_id = %message.channel_id, ts = %message.ts))]
pub async fn process_chat_event(message: IncomingMessage, bind_channel_name: &str, engine: &ExtractionEngine, chat: &ChatClient) -> Void {
    if message.user_id.as_deref() == Some(chat.bot_user_id()) {
        return Ok(());
    }

    let text = strip_leading_mention(&message.text);
    if text.is_empty() {
        return Ok(());
    }

    let channel_name = chat.get_channel_name(&message.channel_id).await?;
    if !channel_name.eq_ignore_ascii_case(bind_channel_name) {
        return Ok(());
    }

    info!("Received message: {text}");

    let thread_ts = message.reply_thread();

    if let Err(err) = chat.send_message(&message.channel_id, thread_ts, THINKING_MESSAGE).await {
        warn!("Failed to acknowledge message: {err}");
    }

    let result = engine.extract(&ExtractionRequest::now(text)).await;

    if let ExtractionResult::Failed(err) = &result {
        error!("Failed to extract event: {err}");
    }

    chat.send_message(&message.channel_id, thread_ts, &reply_for(&result)).await
}

/// The user-facing text for an extraction outcome.
pub fn reply_for(result: &ExtractionResult) -> String {
    match result {
        ExtractionResult::Relevant { proposal, .. } => proposal.clone(),
        ExtractionResult::Irrelevant => NOT_AN_EVENT_MESSAGE.to_string(),
        ExtractionResult::Failed(err) => failure_message(err),
    }
}

fn failure_message(err: &ExtractError) -> String {
    format!("Sorry, something went wrong:\n```{err}```")
}

/// Remove a leading `<@U123>` mention of the bot.
fn strip_leading_mention(text: &str) -> &str {
    let text = text.trim();

    if let Some(rest) = text.strip_prefix("<@")
        && let Some((_, rest)) = rest.split_once('>')
    {
        return rest.trim_start();
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::types::ExtractedEvent;

    #[test]
    fn test_strip_leading_mention() {
        assert_eq!(strip_leading_mention("<@U12345> Picnic at noon"), "Picnic at noon");
        assert_eq!(strip_leading_mention("  Picnic at noon  "), "Picnic at noon");
        assert_eq!(strip_leading_mention("Picnic with <@U12345>"), "Picnic with <@U12345>");
        assert_eq!(strip_leading_mention("<@U12345>"), "");
    }

    #[test]
    fn test_reply_for_each_outcome() {
        let relevant = ExtractionResult::Relevant {
            event: ExtractedEvent::default(),
            proposal: "*Name:* Picnic".to_string(),
        };
        assert_eq!(reply_for(&relevant), "*Name:* Picnic");

        assert_eq!(reply_for(&ExtractionResult::Irrelevant), NOT_AN_EVENT_MESSAGE);

        let failed = ExtractionResult::Failed(ExtractError::Completion("quota exceeded".to_string()));
        assert_eq!(reply_for(&failed), "Sorry, something went wrong:\n```completion error: quota exceeded```");
    }

    #[test]
    fn test_reply_thread_prefers_parent() {
        let top_level = IncomingMessage {
            ts: "1.1".to_string(),
            ..Default::default()
        };
        assert_eq!(top_level.reply_thread(), "1.1");

        let reply = IncomingMessage {
            ts: "1.2".to_string(),
            thread_ts: Some("1.1".to_string()),
            ..Default::default()
        };
        assert_eq!(reply.reply_thread(), "1.1");
    }
}
