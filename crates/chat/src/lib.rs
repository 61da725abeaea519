//! Note assistant for notarium.
//!
//! A thin client for an OpenAI-compatible chat-completions API. The web
//! layer hands it a prompt and, optionally, the decrypted text of the note
//! the user is looking at; everything else (auth, persistence, rendering)
//! stays out of this crate.

pub mod client;
pub mod error;

pub use {client::AssistantClient, error::ChatError};
