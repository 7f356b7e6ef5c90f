//! Hovor: a voice-enabled chat client for OpenAI-compatible completion APIs
//!
//! The conversation controller owns all state. Chat round trips run on a
//! background worker; speech capture and playback sit behind the
//! `SpeechRecognizer` and `SpeechSynthesizer` traits.

pub mod audio;
pub mod chat;
pub mod config;
pub mod conversation;
pub mod error;
pub mod messages;
pub mod speech;
pub mod ui;

pub use error::{CaptureError, HovorError, Result, TransportError};
