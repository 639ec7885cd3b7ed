//! The natural-language event extraction pipeline.
//!
//! A message and its reference time go through two stages:
//! - [`prompt::PromptBuilder`] renders the system prompt, anchored at the reference time.
//! - [`engine::ExtractionEngine`] requests one completion, decides whether it describes an
//!   event, decodes the fields, validates the date and renders the proposal.

pub mod engine;
pub mod payload;
pub mod prompt;
pub mod time;

pub use engine::ExtractionEngine;
pub use payload::DecodePolicy;
