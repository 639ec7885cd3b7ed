//! Event handling and user interactions for event-bot.
//!
//! This module provides functionality for handling chat events:
//! - Filtering incoming messages down to the bound channel
//! - Coordinating the extraction engine and the chat client
//! - Turning extraction outcomes into replies

pub mod chat_event;
