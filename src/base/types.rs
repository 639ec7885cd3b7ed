//! Common result aliases and the data model shared by the extraction pipeline.

use chrono::{DateTime, Utc};

use super::error::ExtractError;

/// Application-level error type.
pub type Err = anyhow::Error;
/// Application-level result type.
pub type Res<T> = Result<T, Err>;
/// Application-level result with no value.
pub type Void = Res<()>;

/// A single message handed to the extraction engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    /// The point in time relative expressions ("next Friday") are resolved against.
    pub reference_time: DateTime<Utc>,
    /// The raw message text, with any leading bot mention already stripped.
    pub message_text: String,
}

impl ExtractionRequest {
    /// Create a request for the given message, anchored at `reference_time`.
    pub fn new(reference_time: DateTime<Utc>, message_text: impl Into<String>) -> Self {
        Self {
            reference_time,
            message_text: message_text.into(),
        }
    }

    /// Create a request anchored at the current time.
    pub fn now(message_text: impl Into<String>) -> Self {
        Self::new(Utc::now(), message_text)
    }
}

/// Event fields pulled out of a completion.
///
/// Every field is best-effort: anything the model omitted is an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedEvent {
    /// The event name.
    pub name: String,
    /// RFC3339 start time, or empty when the model could not tell.
    pub date: String,
    /// Free-form location.
    pub location: String,
    /// A link for the event.
    pub url: String,
    /// The source message; always back-filled from the request, never from the model.
    pub message: String,
}

/// The outcome of a single extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionResult {
    /// The model decided the message does not describe an event.
    Irrelevant,
    /// The message describes an event.
    Relevant {
        /// The decoded event fields.
        event: ExtractedEvent,
        /// The rendered, human-facing proposal.
        proposal: String,
    },
    /// Something went wrong along the way.
    Failed(ExtractError),
}

impl ExtractionResult {
    /// Whether the message was judged to describe an event.
    pub fn is_relevant(&self) -> bool {
        matches!(self, Self::Relevant { .. })
    }
}
