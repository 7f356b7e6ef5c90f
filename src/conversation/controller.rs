//! Turn lifecycle and voice capture orchestration
//!
//! The controller is driven from the UI thread. User actions mutate state
//! immediately; results from the chat worker and the recognizer are applied
//! in `poll_events`, which the UI calls once per frame.

use super::state::ConversationState;
use crate::chat::{ChatEvent, ChatHandle};
use crate::error::TransportError;
use crate::messages::Message;
use crate::speech::{CaptureEvent, CaptureSession, SpeechRecognizer, SpeechSynthesizer};
use crate::Result;
use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// The only text a user ever sees when a turn fails
pub const GENERIC_ERROR_MESSAGE: &str = "Došlo k chybě. Zkuste to znovu.";

pub struct ConversationController {
    state: ConversationState,
    locale: String,
    chat: ChatHandle,
    recognizer: Box<dyn SpeechRecognizer>,
    synthesizer: Box<dyn SpeechSynthesizer>,
    capture_tx: Sender<CaptureEvent>,
    capture_rx: Receiver<CaptureEvent>,
    pending_request: Option<Uuid>,
    capture_session: Option<u64>,
    next_session_id: u64,
}

impl ConversationController {
    pub fn new(
        chat: ChatHandle,
        recognizer: Box<dyn SpeechRecognizer>,
        synthesizer: Box<dyn SpeechSynthesizer>,
        locale: impl Into<String>,
    ) -> Self {
        let (capture_tx, capture_rx) = bounded(16);
        Self {
            state: ConversationState::new(),
            locale: locale.into(),
            chat,
            recognizer,
            synthesizer,
            capture_tx,
            capture_rx,
            pending_request: None,
            capture_session: None,
            next_session_id: 1,
        }
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    /// Mutable access to the draft for the text input widget
    pub fn draft_mut(&mut self) -> &mut String {
        &mut self.state.draft_input
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.state.draft_input = text.into();
    }

    /// Start a turn with `text`
    ///
    /// Returns `false` without touching anything when the text is blank or a
    /// request is already in flight.
    pub fn submit_message(&mut self, text: &str) -> bool {
        if !self.state.can_submit(text) {
            debug!("Submit rejected (loading: {})", self.state.is_loading);
            return false;
        }

        self.state.messages.append(Message::user(text));
        self.state.draft_input.clear();
        self.state.is_loading = true;

        let request_id = Uuid::new_v4();
        let history = self.state.messages.to_vec();
        info!("Dispatching chat request {} ({} messages)", request_id, history.len());

        match self.chat.send(request_id, history) {
            Ok(()) => self.pending_request = Some(request_id),
            Err(e) => {
                error!("Could not reach chat worker: {}", e);
                self.finish_turn(Err(TransportError::WorkerUnavailable));
            }
        }
        true
    }

    /// Submit whatever is in the draft, like a form submit
    pub fn submit_draft(&mut self) -> bool {
        let draft = self.state.draft_input.clone();
        self.submit_message(&draft)
    }

    /// Start a capture session, or cancel the active one
    pub fn toggle_voice_capture(&mut self) {
        if self.state.is_listening {
            if let Some(session) = self.capture_session.take() {
                info!("Cancelling capture session {}", session);
            }
            self.recognizer.stop();
            self.state.is_listening = false;
            return;
        }

        let session = CaptureSession::new(self.next_session_id, self.locale.clone());
        self.next_session_id += 1;
        self.capture_session = Some(session.id);
        self.state.is_listening = true;

        info!("Starting capture session {}", session.id);
        self.recognizer.start(session, self.capture_tx.clone());
    }

    /// Apply every completed chat reply and capture outcome
    pub fn poll_events(&mut self) {
        while let Some(event) = self.chat.try_recv_event() {
            match event {
                ChatEvent::Reply { request_id, result } => {
                    if self.pending_request != Some(request_id) {
                        warn!("Ignoring reply for stale request {}", request_id);
                        continue;
                    }
                    self.pending_request = None;
                    self.finish_turn(result);
                }
                ChatEvent::Shutdown => {
                    if self.pending_request.take().is_some() {
                        self.finish_turn(Err(TransportError::WorkerUnavailable));
                    }
                }
            }
        }

        while let Ok(event) = self.capture_rx.try_recv() {
            if self.capture_session != Some(event.session()) {
                warn!("Ignoring event for stale capture session {}", event.session());
                continue;
            }
            self.capture_session = None;
            self.state.is_listening = false;

            match event {
                CaptureEvent::Transcript { text, .. } => {
                    debug!("Transcript received ({} chars)", text.len());
                    self.state.draft_input = text;
                }
                CaptureEvent::Error { session, error } => {
                    warn!("Capture session {} failed: {}", session, error);
                }
            }
        }
    }

    /// Stop capture and the chat worker
    pub fn shutdown(&mut self) -> Result<()> {
        self.recognizer.stop();
        self.capture_session = None;
        self.state.is_listening = false;
        self.chat.shutdown()
    }

    fn finish_turn(&mut self, result: std::result::Result<Message, TransportError>) {
        match result {
            Ok(reply) => {
                let spoken = reply.content().to_string();
                self.state.messages.append(reply);
                self.synthesizer.speak(&spoken, &self.locale);
            }
            Err(e) => {
                error!("Chat turn failed: {}", e);
                self.state
                    .messages
                    .append(Message::system(GENERIC_ERROR_MESSAGE));
            }
        }
        self.state.is_loading = false;
    }
}
