//! relay-service: relays browser chat messages to Gemini as the Omni Console,
//! with the lore knowledge base injected as context.

pub mod config;
pub mod error;
pub mod handlers;
pub mod lore;
pub mod middleware;
pub mod prompt;
pub mod services;
pub mod startup;
