//! Prompt and proposal templates, parsed once at startup.

use std::{path::Path, sync::Arc};

use serde::Serialize;
use tera::{Context, Tera};
use tracing::{info, instrument};

use super::{
    error::ExtractError,
    prompts::{DEFAULT_PROMPT_CREATE_EVENT, DEFAULT_PROPOSED_EVENT, IRRELEVANT_SENTINEL, PROMPT_CREATE_EVENT, PROPOSED_EVENT},
};

/// Variables available to the system prompt template.
#[derive(Debug, Clone, Serialize)]
pub struct PromptContext {
    /// The reference time, human-readable, with timezone abbreviation.
    pub date_with_tz: String,
    /// The reference time's UTC offset, e.g. `-05:00`.
    pub utc_offset: String,
    /// The irrelevance sentinel the model should emit.
    pub sentinel: String,
}

/// Variables available to the proposal template.
#[derive(Debug, Clone, Serialize)]
pub struct ProposalContext {
    /// The event name.
    pub name: String,
    /// The event time, human-readable.
    pub date: String,
    /// The event location.
    pub location: String,
    /// The event link.
    pub url: String,
    /// The original message, used as the description.
    pub desc: String,
}

/// The parsed template set.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone, Debug)]
pub struct Templates {
    tera: Arc<Tera>,
}

impl Templates {
    /// Load templates from `dir` if given, otherwise use the embedded defaults.
    pub fn load(dir: Option<&Path>) -> Result<Self, ExtractError> {
        match dir {
            Some(dir) => Self::from_dir(dir),
            None => Self::embedded(),
        }
    }

    /// The templates shipped with the binary.
    pub fn embedded() -> Result<Self, ExtractError> {
        Self::from_sources(DEFAULT_PROMPT_CREATE_EVENT, DEFAULT_PROPOSED_EVENT)
    }

    /// Read both templates from a directory.
    #[instrument(name = "Templates::from_dir", skip_all, fields(dir = %dir.display()))]
    pub fn from_dir(dir: &Path) -> Result<Self, ExtractError> {
        let read = |name: &str| {
            let path = dir.join(name);
            std::fs::read_to_string(&path).map_err(|e| ExtractError::Template(format!("could not read `{}`: {e}", path.display())))
        };

        let prompt = read(PROMPT_CREATE_EVENT)?;
        let proposal = read(PROPOSED_EVENT)?;

        info!("Loaded templates from disk.");

        Self::from_sources(&prompt, &proposal)
    }

    /// Parse both templates from raw sources.
    ///
    /// Each template is rendered once with sample values so that references to unknown
    /// variables are reported now rather than on the first message.
    pub fn from_sources(prompt: &str, proposal: &str) -> Result<Self, ExtractError> {
        let mut tera = Tera::default();

        // Nothing here is HTML.
        tera.autoescape_on(vec![]);
        tera.add_raw_templates(vec![(PROMPT_CREATE_EVENT, prompt), (PROPOSED_EVENT, proposal)])?;

        let templates = Self { tera: Arc::new(tera) };

        templates.render_prompt(&PromptContext {
            date_with_tz: "Monday, January 1, 2024, 00:00 UTC".to_string(),
            utc_offset: "+00:00".to_string(),
            sentinel: IRRELEVANT_SENTINEL.to_string(),
        })?;

        templates.render_proposal(&ProposalContext {
            name: "Name".to_string(),
            date: "Monday, January 1, 2024, 00:00 UTC".to_string(),
            location: "Location".to_string(),
            url: "https://example.com".to_string(),
            desc: "Description".to_string(),
        })?;

        Ok(templates)
    }

    /// Render the system prompt.
    pub fn render_prompt(&self, context: &PromptContext) -> Result<String, ExtractError> {
        self.render(PROMPT_CREATE_EVENT, context)
    }

    /// Render the proposal.
    pub fn render_proposal(&self, context: &ProposalContext) -> Result<String, ExtractError> {
        self.render(PROPOSED_EVENT, context)
    }

    fn render<C: Serialize>(&self, name: &str, context: &C) -> Result<String, ExtractError> {
        let context = Context::from_serialize(context)?;
        Ok(self.tera.render(name, &context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_proposal() -> ProposalContext {
        ProposalContext {
            name: "Team Lunch".to_string(),
            date: "Friday, January 12, 2024, 12:00 EST".to_string(),
            location: String::new(),
            url: "https://x.co".to_string(),
            desc: "Team lunch Friday at noon".to_string(),
        }
    }

    #[test]
    fn test_embedded_templates_load() {
        let templates = Templates::embedded().unwrap();

        let prompt = templates
            .render_prompt(&PromptContext {
                date_with_tz: "Wednesday, January 10, 2024, 09:00 EST".to_string(),
                utc_offset: "-05:00".to_string(),
                sentinel: IRRELEVANT_SENTINEL.to_string(),
            })
            .unwrap();

        assert!(prompt.contains("Wednesday, January 10, 2024, 09:00 EST"));
        assert!(prompt.contains("-05:00"));
        assert!(prompt.contains(IRRELEVANT_SENTINEL));
    }

    #[test]
    fn test_embedded_proposal_marks_missing_fields() {
        let templates = Templates::embedded().unwrap();

        let proposal = templates.render_proposal(&sample_proposal()).unwrap();

        assert!(proposal.contains("*Name:* Team Lunch"));
        assert!(proposal.contains("*Location:* _not provided_"));
        assert!(proposal.contains("*URL:* https://x.co"));
        assert!(proposal.contains("Team lunch Friday at noon"));
    }

    #[test]
    fn test_malformed_template_is_rejected() {
        let err = Templates::from_sources("{% if %}", DEFAULT_PROPOSED_EVENT).unwrap_err();
        assert!(matches!(err, ExtractError::Template(_)));
    }

    #[test]
    fn test_unknown_variable_is_rejected_at_load() {
        let err = Templates::from_sources(DEFAULT_PROMPT_CREATE_EVENT, "{{ organizer }}").unwrap_err();

        let ExtractError::Template(message) = err else {
            panic!("expected a template error");
        };
        assert!(message.contains("organizer"));
    }

    #[test]
    fn test_missing_directory_is_rejected() {
        let dir = std::env::temp_dir().join("event-bot-templates-that-do-not-exist");

        let err = Templates::load(Some(&dir)).unwrap_err();
        assert!(matches!(err, ExtractError::Template(_)));
    }

    #[test]
    fn test_loads_templates_from_directory() {
        let dir = std::env::temp_dir().join(format!("event-bot-templates-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(PROMPT_CREATE_EVENT), "Now: {{ date_with_tz }}").unwrap();
        std::fs::write(dir.join(PROPOSED_EVENT), "{{ name }} @ {{ date }}").unwrap();

        let templates = Templates::load(Some(&dir)).unwrap();
        let proposal = templates.render_proposal(&sample_proposal()).unwrap();

        assert_eq!(proposal, "Team Lunch @ Friday, January 12, 2024, 12:00 EST");

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
