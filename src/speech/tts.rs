//! Cloud text-to-speech
//!
//! `speak` only enqueues. A background worker fetches MP3 audio from an
//! OpenAI-compatible speech endpoint and plays utterances in arrival order.

use super::{select_voice, SpeechSynthesizer};
use crate::config::SpeechConfig;
use crate::{HovorError, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use reqwest::Client;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

/// Client for the speech endpoint
#[derive(Clone)]
pub struct Speaker {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl Speaker {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    /// Request MP3 audio for `text` in the given voice
    pub async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>> {
        let request = SpeechRequest {
            model: &self.model,
            input: text,
            voice,
            response_format: "mp3",
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| HovorError::AudioProcessing(format!("Speech request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HovorError::AudioProcessing(format!(
                "Speech API error {}: {}",
                status, body
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| HovorError::AudioProcessing(format!("Speech body read failed: {}", e)))?;

        debug!("Synthesized {} chars into {} bytes", text.len(), bytes.len());
        Ok(bytes.to_vec())
    }
}

/// Where fetched speech ends up
pub trait PlaybackSink {
    /// Play one MP3 utterance, returning early once `cancel` is set
    fn play_mp3(&self, mp3: &[u8], cancel: &AtomicBool) -> Result<()>;
}

#[cfg(feature = "audio-io")]
impl PlaybackSink for crate::audio::AudioOutput {
    fn play_mp3(&self, mp3: &[u8], cancel: &AtomicBool) -> Result<()> {
        let (samples, sample_rate) = crate::audio::decode_mp3(mp3)?;
        self.play(&samples, sample_rate, cancel)
    }
}

#[cfg(feature = "audio-io")]
fn open_default_sink() -> Option<Box<dyn PlaybackSink>> {
    match crate::audio::AudioOutput::new() {
        Ok(output) => Some(Box::new(output)),
        Err(e) => {
            warn!("No audio output: {}", e);
            None
        }
    }
}

#[cfg(not(feature = "audio-io"))]
fn open_default_sink() -> Option<Box<dyn PlaybackSink>> {
    warn!("Built without audio output");
    None
}

enum SynthesisCommand {
    Speak { text: String, voice: String },
    Shutdown,
}

/// Fire-and-forget synthesizer with its own playback worker
pub struct CloudSynthesizer {
    config: SpeechConfig,
    command_tx: Sender<SynthesisCommand>,
    worker_handle: Option<JoinHandle<()>>,
    cancel: Arc<AtomicBool>,
}

impl CloudSynthesizer {
    /// Start the playback worker on the default output device
    pub fn start(config: SpeechConfig, api_key: impl Into<String>) -> Result<Self> {
        Self::start_with_sink(config, api_key, open_default_sink)
    }

    /// Start the playback worker with a custom sink
    ///
    /// `open_sink` runs on the worker thread. When it yields `None` nothing
    /// is ever requested from the speech endpoint.
    pub fn start_with_sink<F>(
        config: SpeechConfig,
        api_key: impl Into<String>,
        open_sink: F,
    ) -> Result<Self>
    where
        F: FnOnce() -> Option<Box<dyn PlaybackSink>> + Send + 'static,
    {
        let speaker = Speaker::new(
            config.synthesis_endpoint.clone(),
            config.synthesis_model.clone(),
            api_key,
        );
        let (command_tx, command_rx) = unbounded();
        let cancel = Arc::new(AtomicBool::new(false));

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| HovorError::Channel(format!("Failed to create runtime: {}", e)))?;

        let worker_cancel = Arc::clone(&cancel);
        let worker_handle = std::thread::Builder::new()
            .name("hovor-speech".to_string())
            .spawn(move || worker_loop(runtime, speaker, open_sink(), command_rx, worker_cancel))?;

        Ok(Self {
            config,
            command_tx,
            worker_handle: Some(worker_handle),
            cancel,
        })
    }

    /// Voice that `speak` would use for `locale`
    pub fn voice_for(&self, locale: &str) -> &str {
        select_voice(&self.config.voices, locale)
            .map(|v| v.name.as_str())
            .unwrap_or(&self.config.default_voice)
    }
}

impl SpeechSynthesizer for CloudSynthesizer {
    fn speak(&self, text: &str, locale: &str) {
        if !self.config.enabled {
            debug!("Speech disabled, not speaking");
            return;
        }
        if text.trim().is_empty() {
            debug!("Ignoring empty utterance");
            return;
        }

        let voice = self.voice_for(locale).to_string();
        debug!("Queueing utterance for voice {} ({})", voice, locale);

        if self
            .command_tx
            .send(SynthesisCommand::Speak {
                text: text.to_string(),
                voice,
            })
            .is_err()
        {
            warn!("Speech worker is gone, dropping utterance");
        }
    }
}

impl Drop for CloudSynthesizer {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        let _ = self.command_tx.send(SynthesisCommand::Shutdown);
        // Detached: playback may be mid-utterance
        self.worker_handle.take();
    }
}

fn worker_loop(
    runtime: tokio::runtime::Runtime,
    speaker: Speaker,
    sink: Option<Box<dyn PlaybackSink>>,
    command_rx: Receiver<SynthesisCommand>,
    cancel: Arc<AtomicBool>,
) {
    match sink {
        Some(_) => info!("Speech worker started"),
        None => warn!("Speech worker started without playback, utterances will be dropped"),
    }

    while let Ok(command) = command_rx.recv() {
        match command {
            SynthesisCommand::Speak { text, voice } => {
                let Some(sink) = &sink else {
                    debug!("No playback sink, dropping {} chars", text.len());
                    continue;
                };

                let played = runtime
                    .block_on(speaker.synthesize(&text, &voice))
                    .and_then(|audio| sink.play_mp3(&audio, &cancel));
                if let Err(e) = played {
                    warn!("Speaking failed: {}", e);
                }
            }
            SynthesisCommand::Shutdown => break,
        }

        if cancel.load(Ordering::Relaxed) {
            break;
        }
    }

    info!("Speech worker stopped");
}
