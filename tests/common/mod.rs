//! Scripted stand-ins for the chat service and the speech adapters

#![allow(dead_code)]

use crossbeam_channel::{Receiver, Sender};
use futures::future::BoxFuture;
use hovor::chat::{ChatTransport, ChatWorker};
use hovor::conversation::ConversationController;
use hovor::error::TransportError;
use hovor::messages::Message;
use hovor::speech::{CaptureEvent, CaptureSession, SpeechRecognizer, SpeechSynthesizer};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub type Outcome = Result<Message, TransportError>;

/// Replies from a script and records every history it was sent
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<VecDeque<Outcome>>>,
    pub requests: Arc<Mutex<Vec<Vec<Message>>>>,
    gate: Option<Receiver<()>>,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = Outcome>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
            ..Default::default()
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new([Ok(Message::assistant(text))])
    }

    pub fn failing(error: TransportError) -> Self {
        Self::new([Err(error)])
    }

    /// Hold every reply until a unit is sent on the returned channel
    pub fn gated(mut self) -> (Self, Sender<()>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.gate = Some(rx);
        (self, tx)
    }
}

impl ChatTransport for ScriptedTransport {
    fn complete<'a>(&'a self, messages: &'a [Message]) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            self.requests.lock().push(messages.to_vec());
            if let Some(gate) = &self.gate {
                let _ = gate.recv();
            }
            self.script
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Network("script exhausted".into())))
        })
    }
}

#[derive(Default)]
pub struct RecognizerLog {
    pub started: Vec<CaptureSession>,
    pub stops: usize,
    pub events: Option<Sender<CaptureEvent>>,
}

/// Recognizer that only records calls; tests emit events by hand
#[derive(Clone, Default)]
pub struct FakeRecognizer {
    pub log: Arc<Mutex<RecognizerLog>>,
}

impl FakeRecognizer {
    pub fn last_session(&self) -> Option<u64> {
        self.log.lock().started.last().map(|s| s.id)
    }

    pub fn emit(&self, event: CaptureEvent) {
        let log = self.log.lock();
        let events = log.events.as_ref().expect("no capture started");
        events.send(event).expect("controller dropped");
    }
}

impl SpeechRecognizer for FakeRecognizer {
    fn start(&mut self, session: CaptureSession, events: Sender<CaptureEvent>) {
        let mut log = self.log.lock();
        log.started.push(session);
        log.events = Some(events);
    }

    fn stop(&mut self) {
        self.log.lock().stops += 1;
    }
}

/// Synthesizer that records every utterance
#[derive(Clone, Default)]
pub struct FakeSynthesizer {
    pub spoken: Arc<Mutex<Vec<(String, String)>>>,
}

impl SpeechSynthesizer for FakeSynthesizer {
    fn speak(&self, text: &str, locale: &str) {
        self.spoken.lock().push((text.to_string(), locale.to_string()));
    }
}

pub struct Fixture {
    pub controller: ConversationController,
    pub transport: ScriptedTransport,
    pub recognizer: FakeRecognizer,
    pub synthesizer: FakeSynthesizer,
}

pub fn fixture(transport: ScriptedTransport) -> Fixture {
    let recognizer = FakeRecognizer::default();
    let synthesizer = FakeSynthesizer::default();
    let chat = ChatWorker::new(transport.clone())
        .start()
        .expect("chat worker starts");
    let controller = ConversationController::new(
        chat,
        Box::new(recognizer.clone()),
        Box::new(synthesizer.clone()),
        "cs-CZ",
    );

    Fixture {
        controller,
        transport,
        recognizer,
        synthesizer,
    }
}

/// Poll until the in-flight request resolves
pub fn settle(controller: &mut ConversationController) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while controller.state().is_loading {
        assert!(Instant::now() < deadline, "request never resolved");
        controller.poll_events();
        std::thread::sleep(Duration::from_millis(5));
    }
}

/// Wait until the transport has seen `count` requests
pub fn wait_for_requests(transport: &ScriptedTransport, count: usize) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while transport.requests.lock().len() < count {
        assert!(Instant::now() < deadline, "transport never called");
        std::thread::sleep(Duration::from_millis(5));
    }
}
