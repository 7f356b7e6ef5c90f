//! End-of-utterance detection for single-shot capture
//!
//! A capture session ends on the first stretch of trailing silence after
//! speech, or when the hard duration cap is reached.

/// Outcome after feeding a chunk to the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtteranceStatus {
    /// Keep capturing
    Listening,
    /// Speech was heard and has ended
    Ended,
    /// The cap was reached without any speech
    NoSpeech,
}

/// Energy-based utterance endpointing
#[derive(Debug, Clone)]
pub struct UtteranceDetector {
    silence_threshold: f32,
    trailing_silence_samples: usize,
    max_samples: usize,
    heard_speech: bool,
    silence_run: usize,
    total: usize,
}

impl UtteranceDetector {
    /// Create a detector
    ///
    /// # Arguments
    /// * `sample_rate` - Sample rate of the mono stream being fed
    /// * `silence_threshold` - RMS level below which a chunk is silence
    /// * `trailing_silence_ms` - Silence after speech that ends the utterance
    /// * `max_secs` - Hard cap on the session length
    pub fn new(
        sample_rate: u32,
        silence_threshold: f32,
        trailing_silence_ms: u64,
        max_secs: f32,
    ) -> Self {
        Self {
            silence_threshold,
            trailing_silence_samples: (sample_rate as u64 * trailing_silence_ms / 1000) as usize,
            max_samples: (sample_rate as f32 * max_secs.max(0.0)) as usize,
            heard_speech: false,
            silence_run: 0,
            total: 0,
        }
    }

    /// Feed the next mono chunk
    pub fn push(&mut self, chunk: &[f32]) -> UtteranceStatus {
        if rms(chunk) >= self.silence_threshold {
            self.heard_speech = true;
            self.silence_run = 0;
        } else {
            self.silence_run += chunk.len();
        }
        self.total += chunk.len();

        if self.heard_speech && self.silence_run >= self.trailing_silence_samples {
            return UtteranceStatus::Ended;
        }

        if self.total >= self.max_samples {
            return if self.heard_speech {
                UtteranceStatus::Ended
            } else {
                UtteranceStatus::NoSpeech
            };
        }

        UtteranceStatus::Listening
    }

    pub fn heard_speech(&self) -> bool {
        self.heard_speech
    }

    pub fn reset(&mut self) {
        self.heard_speech = false;
        self.silence_run = 0;
        self.total = 0;
    }
}

/// Root mean square of a chunk (0.0 for an empty chunk)
pub fn rms(chunk: &[f32]) -> f32 {
    if chunk.is_empty() {
        return 0.0;
    }
    let sum: f32 = chunk.iter().map(|s| s * s).sum();
    (sum / chunk.len() as f32).sqrt()
}
