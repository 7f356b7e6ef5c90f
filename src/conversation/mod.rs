//! Conversation state and the controller that owns it

pub mod controller;
pub mod state;

pub use controller::{ConversationController, GENERIC_ERROR_MESSAGE};
pub use state::ConversationState;
