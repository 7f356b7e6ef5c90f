//! Configuration for the chat transport and the speech adapters
//!
//! Loaded once at startup from a TOML file. How credentials get into that
//! file is up to the user.

use crate::speech::Voice;
use crate::{HovorError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_CHAT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_LOCALE: &str = "cs-CZ";

/// Top-level configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub chat: ChatConfig,
    pub speech: SpeechConfig,
}

/// Chat-completion endpoint and credentials
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Bearer token
    pub api_key: String,
    /// Sent as `OpenAI-Organization` when present
    pub organization: Option<String>,
    pub endpoint: String,
    pub model: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            organization: None,
            endpoint: DEFAULT_CHAT_ENDPOINT.to_string(),
            model: DEFAULT_CHAT_MODEL.to_string(),
        }
    }
}

impl ChatConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// Voice capture and playback settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// BCP 47 tag used for both recognition and synthesis
    pub locale: String,
    /// Turn the cloud speech backends on or off
    pub enabled: bool,
    pub transcription_endpoint: String,
    pub transcription_model: String,
    pub synthesis_endpoint: String,
    pub synthesis_model: String,
    /// Voice used when no catalog entry matches the locale
    pub default_voice: String,
    /// Voices available to the synthesizer, each tied to a locale
    pub voices: Vec<Voice>,
    /// RMS level below which a frame counts as silence
    pub silence_threshold: f32,
    /// Silence after speech that ends the utterance
    pub trailing_silence_ms: u64,
    /// Hard cap on one capture session
    pub max_utterance_secs: f32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            locale: DEFAULT_LOCALE.to_string(),
            enabled: true,
            transcription_endpoint: "https://api.openai.com/v1/audio/transcriptions".to_string(),
            transcription_model: "whisper-1".to_string(),
            synthesis_endpoint: "https://api.openai.com/v1/audio/speech".to_string(),
            synthesis_model: "tts-1".to_string(),
            default_voice: "alloy".to_string(),
            voices: Vec::new(),
            silence_threshold: 0.01,
            trailing_silence_ms: 1200,
            max_utterance_secs: 15.0,
        }
    }
}

impl SpeechConfig {
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn with_voice(mut self, voice: Voice) -> Self {
        self.voices.push(voice);
        self
    }

    /// Disable the cloud speech backends (text-only mode)
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

impl Config {
    pub fn new(chat: ChatConfig) -> Self {
        Self {
            chat,
            speech: SpeechConfig::default(),
        }
    }

    pub fn with_speech(mut self, speech: SpeechConfig) -> Self {
        self.speech = speech;
        self
    }

    /// Parse a configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| HovorError::Config(e.to_string()))
    }

    /// Load a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            HovorError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from the platform config directory, falling back to defaults
    /// when the file does not exist
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            debug!("No configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| HovorError::Config("Could not determine config directory".into()))?;
        Ok(config_dir.join("hovor").join("config.toml"))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.chat.api_key.trim().is_empty() {
            return Err(HovorError::Config("chat.api_key is required".into()));
        }
        if self.chat.model.trim().is_empty() {
            return Err(HovorError::Config("chat.model must not be empty".into()));
        }
        if self.chat.endpoint.trim().is_empty() {
            return Err(HovorError::Config("chat.endpoint must not be empty".into()));
        }
        if self.speech.locale.trim().is_empty() {
            return Err(HovorError::Config("speech.locale must not be empty".into()));
        }
        if self.speech.max_utterance_secs <= 0.0 {
            return Err(HovorError::Config(
                "speech.max_utterance_secs must be positive".into(),
            ));
        }
        if self.speech.trailing_silence_ms == 0 {
            return Err(HovorError::Config(
                "speech.trailing_silence_ms must be positive".into(),
            ));
        }
        Ok(())
    }
}
