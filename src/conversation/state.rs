use crate::messages::{Message, MessageLog};

/// Everything the view renders
///
/// Only the controller mutates this; the UI reads it once per frame.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    pub messages: MessageLog,
    pub draft_input: String,
    /// A chat request is in flight
    pub is_loading: bool,
    /// A capture session is active
    pub is_listening: bool,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `text` may be submitted right now
    pub fn can_submit(&self, text: &str) -> bool {
        !self.is_loading && !text.trim().is_empty()
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}
