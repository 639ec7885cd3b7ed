//! Builds the system prompt for a single extraction.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::base::{
    error::ExtractError,
    prompts::IRRELEVANT_SENTINEL,
    templates::{PromptContext, Templates},
};

use super::time::{human_readable, utc_offset};

/// Renders the system prompt, anchored at a reference time.
#[derive(Clone, Debug)]
pub struct PromptBuilder {
    templates: Templates,
    timezone: Tz,
}

impl PromptBuilder {
    pub fn new(templates: Templates, timezone: Tz) -> Self {
        Self { templates, timezone }
    }

    /// The template variables for `reference_time`.
    pub fn context(&self, reference_time: DateTime<Utc>) -> PromptContext {
        PromptContext {
            date_with_tz: human_readable(&reference_time, self.timezone),
            utc_offset: utc_offset(&reference_time, self.timezone),
            sentinel: IRRELEVANT_SENTINEL.to_string(),
        }
    }

    pub fn build(&self, reference_time: DateTime<Utc>) -> Result<String, ExtractError> {
        self.templates.render_prompt(&self.context(reference_time))
    }
}
