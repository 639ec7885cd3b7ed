//! Core components, types, and utilities for the event-bot.
//!
//! This module contains fundamental building blocks used throughout the application:
//! - Configuration handling and environment variables.
//! - Prompt and proposal templates.
//! - Common types, the extraction data model, and error handling.

pub mod config;
pub mod error;
pub mod prompts;
pub mod templates;
pub mod types;
