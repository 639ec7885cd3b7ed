//! The extraction engine: one completion per message, classified, decoded and rendered.

use chrono_tz::Tz;
use tracing::{debug, info, instrument, warn};

use crate::{
    base::{
        config::Config,
        error::ExtractError,
        prompts::IRRELEVANT_SENTINEL,
        templates::{ProposalContext, Templates},
        types::{ExtractedEvent, ExtractionRequest, ExtractionResult, Res},
    },
    service::llm::LlmClient,
};

use super::{
    payload::{DecodePolicy, decode_event},
    prompt::PromptBuilder,
    time::{human_readable, human_readable_at_offset, parse_event_date},
};

/// Turns chat messages into event proposals.
///
/// Holds no per-request state. It is trivially cloneable, so each message can be
/// processed on its own task.
#[derive(Clone)]
pub struct ExtractionEngine {
    llm: LlmClient,
    templates: Templates,
    prompt: PromptBuilder,
    timezone: Tz,
    policy: DecodePolicy,
}

impl ExtractionEngine {
    pub fn new(llm: LlmClient, templates: Templates, timezone: Tz, policy: DecodePolicy) -> Self {
        let prompt = PromptBuilder::new(templates.clone(), timezone);

        Self {
            llm,
            templates,
            prompt,
            timezone,
            policy,
        }
    }

    /// Build an engine from the application config.
    pub fn from_config(config: &Config, llm: LlmClient, templates: Templates) -> Res<Self> {
        Ok(Self::new(llm, templates, config.tz()?, DecodePolicy::from_strict(config.strict_payload_decoding)))
    }

    /// Run the full pipeline for one message.
    #[instrument(name = "ExtractionEngine::extract", skip_all)]
    pub async fn extract(&self, request: &ExtractionRequest) -> ExtractionResult {
        match self.extract_internal(request).await {
            Ok(Some((event, proposal))) => ExtractionResult::Relevant { event, proposal },
            Ok(None) => ExtractionResult::Irrelevant,
            Err(err) => {
                warn!("Extraction failed: {err}");
                ExtractionResult::Failed(err)
            }
        }
    }

    async fn extract_internal(&self, request: &ExtractionRequest) -> Result<Option<(ExtractedEvent, String)>, ExtractError> {
        let system_prompt = self.prompt.build(request.reference_time)?;

        let content = self
            .llm
            .complete(&system_prompt, &request.message_text)
            .await
            .map_err(|e| ExtractError::Completion(e.to_string()))?;

        // The model may wrap the sentinel in prose, so any occurrence counts.
        if content.contains(IRRELEVANT_SENTINEL) {
            info!("Completion flagged the message as not an event.");
            return Ok(None);
        }

        let mut event = decode_event(&content, self.policy)?;
        event.message = request.message_text.clone();

        debug!("Decoded event: {event:?}");

        // Without a date, the proposal shows the reference time.
        let date = if event.date.is_empty() {
            human_readable(&request.reference_time, self.timezone)
        } else {
            human_readable_at_offset(&parse_event_date(&event.date)?, self.timezone)
        };

        let proposal = self.templates.render_proposal(&ProposalContext {
            name: event.name.clone(),
            date,
            location: event.location.clone(),
            url: event.url.clone(),
            desc: event.message.clone(),
        })?;

        info!("Rendered proposal for `{}`.", event.name);

        Ok(Some((event, proposal.trim().to_string())))
    }
}
