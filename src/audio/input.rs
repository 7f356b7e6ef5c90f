use crate::{HovorError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Average interleaved frames down to one channel
pub fn downmix(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// The default microphone, opened once per capture session
pub struct AudioInput {
    device: Device,
    config: StreamConfig,
}

/// A live microphone stream for one capture session
///
/// Dropping it closes the device. The stream is not `Send` on every
/// platform, so keep it on the thread that runs the session.
pub struct CaptureStream {
    _stream: Stream,
    sample_rate: u32,
}

impl CaptureStream {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl Drop for CaptureStream {
    fn drop(&mut self) {
        debug!("Microphone stream closed");
    }
}

impl AudioInput {
    pub fn new() -> Result<Self> {
        let device = cpal::default_host()
            .default_input_device()
            .ok_or_else(|| HovorError::AudioDevice("No input device available".into()))?;

        let config = device
            .default_input_config()
            .map_err(|e| HovorError::AudioDevice(format!("Failed to get input config: {}", e)))?
            .into();

        Ok(Self { device, config })
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Stream mono chunks into `chunk_tx` until `cancel` is raised
    ///
    /// Once the flag is set the callback forwards nothing more, even if the
    /// stream outlives the session by a few buffers.
    pub fn open_stream(
        &self,
        chunk_tx: Sender<Vec<f32>>,
        cancel: Arc<AtomicBool>,
    ) -> Result<CaptureStream> {
        let channels = self.config.channels as usize;

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if cancel.load(Ordering::Relaxed) {
                        return;
                    }
                    if let Err(e) = chunk_tx.try_send(downmix(data, channels)) {
                        debug!("Dropped capture chunk: {}", e);
                    }
                },
                |err| error!("Audio input stream error: {}", err),
                None,
            )
            .map_err(|e| HovorError::AudioDevice(format!("Failed to build input stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| HovorError::AudioDevice(format!("Failed to start input stream: {}", e)))?;

        info!(
            "Listening on {} at {} Hz",
            self.device.name().unwrap_or_else(|_| "unknown device".to_string()),
            self.sample_rate()
        );

        Ok(CaptureStream {
            _stream: stream,
            sample_rate: self.sample_rate(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    #[test]
    fn test_downmix_averages_frames() {
        let stereo = [0.5, -0.5, 1.0, 0.0, 0.2, 0.4];
        let mono = downmix(&stereo, 2);
        assert_eq!(mono.len(), 3);
        assert!(mono[0].abs() < 1e-6);
        assert!((mono[1] - 0.5).abs() < 1e-6);
        assert!((mono[2] - 0.3).abs() < 1e-6);

        assert_eq!(downmix(&[0.1, 0.2], 1), vec![0.1, 0.2]);
    }

    #[test]
    fn test_cancelled_stream_forwards_nothing() {
        // No input device on most CI machines
        let Ok(input) = AudioInput::new() else {
            return;
        };
        let cancel = Arc::new(AtomicBool::new(true));
        let (tx, rx) = bounded(64);

        if let Ok(stream) = input.open_stream(tx, Arc::clone(&cancel)) {
            assert_eq!(stream.sample_rate(), input.sample_rate());
            std::thread::sleep(std::time::Duration::from_millis(200));
            drop(stream);
            assert!(rx.try_recv().is_err());
        }
    }
}
