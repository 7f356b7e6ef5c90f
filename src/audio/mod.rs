//! Audio plumbing for voice capture and playback
//!
//! Device access (`input`, `output`) needs the `audio-io` feature; the
//! signal helpers are always available.

pub mod endpoint;
#[cfg(feature = "audio-io")]
pub mod input;
#[cfg(feature = "audio-io")]
pub mod output;
pub mod resampler;
pub mod wav;

pub use endpoint::{UtteranceDetector, UtteranceStatus};
#[cfg(feature = "audio-io")]
pub use input::{downmix, AudioInput, CaptureStream};
#[cfg(feature = "audio-io")]
pub use output::{decode_mp3, AudioOutput};
pub use resampler::{resample_mono, AudioResampler};
pub use wav::encode_wav;

/// Sample rate expected by the transcription service
pub const TRANSCRIPTION_SAMPLE_RATE: u32 = 16000;
