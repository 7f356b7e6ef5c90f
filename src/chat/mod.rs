//! Chat-completion transport
//!
//! This module provides:
//! - `ChatClient`, one HTTP round trip against an OpenAI-compatible endpoint
//! - `ChatWorker`, a background thread that runs those round trips and
//!   reports completions over a channel

pub mod client;
pub mod worker;

use crate::error::TransportError;
use crate::messages::Message;
use futures::future::BoxFuture;

pub use client::{interpret_response, ChatClient};
pub use worker::{ChatCommand, ChatEvent, ChatHandle, ChatWorker};

/// One request/response cycle with a chat-completion service
///
/// Implementations make a single attempt: no retry, no timeout, no backoff.
pub trait ChatTransport: Send + Sync + 'static {
    /// Send the full ordered history and return the assistant reply
    fn complete<'a>(
        &'a self,
        messages: &'a [Message],
    ) -> BoxFuture<'a, Result<Message, TransportError>>;
}
