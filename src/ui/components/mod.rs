//! Reusable pieces of the chat window

mod input_bar;
mod message_list;

pub use input_bar::{InputBar, LISTEN_LABEL, SEND_LABEL, STOP_LISTENING_LABEL};
pub use message_list::{role_label, MessageList, TYPING_INDICATOR};
