//! Cloud speech-to-text
//!
//! Each session runs on its own thread: capture from the default microphone
//! until the utterance ends, then upload it as WAV to an OpenAI-compatible
//! transcription endpoint.

use super::{language_from_locale, CaptureEvent, CaptureSession, SpeechRecognizer};
use crate::config::SpeechConfig;
use crate::error::CaptureError;
use crossbeam_channel::Sender;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[derive(Deserialize)]
struct ServiceErrorBody {
    error: Option<ServiceErrorDetail>,
}

#[derive(Deserialize)]
struct ServiceErrorDetail {
    message: Option<String>,
}

/// Turn a transcription response into the transcript text
///
/// A blank transcript counts as `NoSpeech`.
pub fn interpret_transcription(status: StatusCode, body: &[u8]) -> Result<String, CaptureError> {
    if !status.is_success() {
        let detail = serde_json::from_slice::<ServiceErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .and_then(|e| e.message)
            .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned());
        return Err(CaptureError::Service(format!("{}: {}", status, detail)));
    }

    let response: TranscriptionResponse = serde_json::from_slice(body)
        .map_err(|e| CaptureError::Service(format!("invalid transcription body: {}", e)))?;

    let text = response.text.trim();
    if text.is_empty() {
        return Err(CaptureError::NoSpeech);
    }
    Ok(text.to_string())
}

/// Client for the transcription endpoint
#[derive(Clone)]
pub struct Transcriber {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl Transcriber {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    /// Upload one WAV utterance and return its transcript
    pub async fn transcribe(&self, wav: Vec<u8>, locale: &str) -> Result<String, CaptureError> {
        debug!("Uploading {} WAV bytes for transcription", wav.len());

        let file = reqwest::multipart::Part::bytes(wav)
            .file_name("utterance.wav")
            .mime_str("audio/wav")
            .map_err(|e| CaptureError::Service(e.to_string()))?;

        let mut form = reqwest::multipart::Form::new()
            .part("file", file)
            .text("model", self.model.clone());

        let language = language_from_locale(locale);
        if !language.is_empty() {
            form = form.text("language", language);
        }

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| CaptureError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| CaptureError::Network(e.to_string()))?;

        interpret_transcription(status, &body)
    }
}

#[cfg_attr(not(feature = "audio-io"), allow(dead_code))]
struct ActiveCapture {
    session_id: u64,
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Single-utterance recognizer backed by a cloud transcription service
pub struct CloudRecognizer {
    config: SpeechConfig,
    #[cfg_attr(not(feature = "audio-io"), allow(dead_code))]
    transcriber: Transcriber,
    active: Option<ActiveCapture>,
}

impl CloudRecognizer {
    pub fn new(config: SpeechConfig, api_key: impl Into<String>) -> Self {
        let transcriber = Transcriber::new(
            config.transcription_endpoint.clone(),
            config.transcription_model.clone(),
            api_key,
        );
        Self {
            config,
            transcriber,
            active: None,
        }
    }

    /// Session currently being captured, if any
    pub fn active_session(&self) -> Option<u64> {
        self.active
            .as_ref()
            .filter(|a| !a.handle.is_finished())
            .map(|a| a.session_id)
    }

    fn reject(session: &CaptureSession, events: &Sender<CaptureEvent>, error: CaptureError) {
        warn!("Capture session {} rejected: {}", session.id, error);
        let _ = events.send(CaptureEvent::Error {
            session: session.id,
            error,
        });
    }

    #[cfg(feature = "audio-io")]
    fn spawn(&mut self, session: CaptureSession, events: Sender<CaptureEvent>) {
        let cancel = Arc::new(AtomicBool::new(false));
        let worker_cancel = Arc::clone(&cancel);
        let config = self.config.clone();
        let transcriber = self.transcriber.clone();
        let session_id = session.id;

        let spawned = std::thread::Builder::new()
            .name(format!("hovor-capture-{}", session_id))
            .spawn({
                let events = events.clone();
                move || {
                    let outcome = capture::run(&config, &transcriber, &session, &worker_cancel);
                    let event = match outcome {
                        Ok(text) => {
                            info!("Capture session {} transcribed {} chars", session.id, text.len());
                            CaptureEvent::Transcript {
                                session: session.id,
                                text,
                            }
                        }
                        Err(error) => {
                            warn!("Capture session {} failed: {}", session.id, error);
                            CaptureEvent::Error {
                                session: session.id,
                                error,
                            }
                        }
                    };
                    if events.send(event).is_err() {
                        debug!("Capture event receiver dropped");
                    }
                }
            });

        match spawned {
            Ok(handle) => {
                self.active = Some(ActiveCapture {
                    session_id,
                    cancel,
                    handle,
                });
            }
            Err(e) => {
                tracing::error!("Failed to spawn capture thread: {}", e);
                let _ = events.send(CaptureEvent::Error {
                    session: session_id,
                    error: CaptureError::Unsupported(e.to_string()),
                });
            }
        }
    }
}

impl SpeechRecognizer for CloudRecognizer {
    fn start(&mut self, session: CaptureSession, events: Sender<CaptureEvent>) {
        self.stop();

        if !self.config.enabled {
            Self::reject(
                &session,
                &events,
                CaptureError::Unsupported("speech is disabled in configuration".into()),
            );
            return;
        }

        #[cfg(feature = "audio-io")]
        {
            info!(
                "Starting capture session {} ({})",
                session.id, session.locale
            );
            self.spawn(session, events);
        }

        #[cfg(not(feature = "audio-io"))]
        Self::reject(
            &session,
            &events,
            CaptureError::Unsupported("built without microphone support".into()),
        );
    }

    fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            if !active.handle.is_finished() {
                info!("Stopping capture session {}", active.session_id);
            }
            active.cancel.store(true, Ordering::Relaxed);
        }
    }
}

impl Drop for CloudRecognizer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(feature = "audio-io")]
mod capture {
    use super::Transcriber;
    use crate::audio::{
        encode_wav, resample_mono, AudioInput, UtteranceDetector, UtteranceStatus,
        TRANSCRIPTION_SAMPLE_RATE,
    };
    use crate::config::SpeechConfig;
    use crate::error::CaptureError;
    use crate::speech::CaptureSession;
    use crossbeam_channel::{bounded, RecvTimeoutError};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tracing::debug;

    /// Capture one utterance and transcribe it
    pub(super) fn run(
        config: &SpeechConfig,
        transcriber: &Transcriber,
        session: &CaptureSession,
        cancel: &Arc<AtomicBool>,
    ) -> Result<String, CaptureError> {
        let input = AudioInput::new().map_err(|e| CaptureError::Unsupported(e.to_string()))?;

        let (chunk_tx, chunk_rx) = bounded::<Vec<f32>>(64);
        let stream = input
            .open_stream(chunk_tx, Arc::clone(cancel))
            .map_err(|e| CaptureError::PermissionDenied(e.to_string()))?;
        let sample_rate = stream.sample_rate();

        let mut detector = UtteranceDetector::new(
            sample_rate,
            config.silence_threshold,
            config.trailing_silence_ms,
            config.max_utterance_secs,
        );
        let mut recorded = Vec::new();

        loop {
            if cancel.load(Ordering::Relaxed) {
                return Err(CaptureError::Aborted);
            }

            match chunk_rx.recv_timeout(Duration::from_millis(100)) {
                Ok(chunk) => {
                    recorded.extend_from_slice(&chunk);
                    match detector.push(&chunk) {
                        UtteranceStatus::Listening => {}
                        UtteranceStatus::Ended => break,
                        UtteranceStatus::NoSpeech => return Err(CaptureError::NoSpeech),
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(CaptureError::Unsupported("input stream closed".into()));
                }
            }
        }

        drop(stream);
        debug!(
            "Session {} captured {} samples at {} Hz",
            session.id,
            recorded.len(),
            sample_rate
        );

        let samples = resample_mono(&recorded, sample_rate, TRANSCRIPTION_SAMPLE_RATE)
            .map_err(|e| CaptureError::Service(e.to_string()))?;
        let wav = encode_wav(&samples, TRANSCRIPTION_SAMPLE_RATE)
            .map_err(|e| CaptureError::Service(e.to_string()))?;

        if cancel.load(Ordering::Relaxed) {
            return Err(CaptureError::Aborted);
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| CaptureError::Service(e.to_string()))?;

        runtime.block_on(transcriber.transcribe(wav, &session.locale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use std::time::Duration;

    #[test]
    fn test_transcript_is_trimmed() {
        let text = interpret_transcription(StatusCode::OK, br#"{"text": "  Ahoj svete "}"#).unwrap();
        assert_eq!(text, "Ahoj svete");
    }

    #[test]
    fn test_blank_transcript_is_no_speech() {
        let err = interpret_transcription(StatusCode::OK, br#"{"text": "   "}"#).unwrap_err();
        assert_eq!(err, CaptureError::NoSpeech);
    }

    #[test]
    fn test_service_error_carries_remote_message() {
        let err = interpret_transcription(
            StatusCode::BAD_REQUEST,
            br#"{"error": {"message": "audio too short"}}"#,
        )
        .unwrap_err();
        match err {
            CaptureError::Service(detail) => assert!(detail.contains("audio too short")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_disabled_recognizer_reports_unsupported() {
        let mut recognizer = CloudRecognizer::new(SpeechConfig::default().disabled(), "sk-test");
        let (tx, rx) = bounded(4);

        recognizer.start(CaptureSession::new(3, "cs-CZ"), tx);

        match rx.recv_timeout(Duration::from_secs(1)).unwrap() {
            CaptureEvent::Error { session, error } => {
                assert_eq!(session, 3);
                assert!(matches!(error, CaptureError::Unsupported(_)));
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(recognizer.active_session().is_none());
    }

    #[test]
    fn test_stop_when_idle_is_noop() {
        let mut recognizer = CloudRecognizer::new(SpeechConfig::default(), "sk-test");
        recognizer.stop();
        recognizer.stop();
        assert!(recognizer.active_session().is_none());
    }
}
