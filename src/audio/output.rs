use super::resampler::resample_mono;
use crate::{HovorError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, StreamConfig};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Playback on the default output device
pub struct AudioOutput {
    device: Device,
    config: StreamConfig,
}

impl AudioOutput {
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| HovorError::AudioDevice("No output device available".into()))?;

        info!(
            "Using output device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let config = device
            .default_output_config()
            .map_err(|e| HovorError::AudioDevice(format!("Failed to get output config: {}", e)))?
            .into();

        Ok(Self { device, config })
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Play a mono buffer and block until it has drained or `cancel` is set
    pub fn play(&self, samples: &[f32], sample_rate: u32, cancel: &AtomicBool) -> Result<()> {
        let samples = resample_mono(samples, sample_rate, self.sample_rate())?;
        if samples.is_empty() {
            return Ok(());
        }

        let channels = self.config.channels as usize;
        let queue = Arc::new(Mutex::new(samples.into_iter().collect::<VecDeque<f32>>()));
        let callback_queue = Arc::clone(&queue);

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut queue = callback_queue.lock();
                    for frame in data.chunks_mut(channels) {
                        let sample = queue.pop_front().unwrap_or(0.0);
                        frame.fill(sample);
                    }
                },
                |err| error!("Audio output stream error: {}", err),
                None,
            )
            .map_err(|e| HovorError::AudioDevice(format!("Failed to build output stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| HovorError::AudioDevice(format!("Failed to start output stream: {}", e)))?;

        while !queue.lock().is_empty() {
            if cancel.load(Ordering::Relaxed) {
                debug!("Playback cancelled");
                break;
            }
            std::thread::sleep(Duration::from_millis(20));
        }

        // Let the device flush its last buffer
        std::thread::sleep(Duration::from_millis(100));
        drop(stream);
        Ok(())
    }
}

/// Decode an MP3 byte stream into mono samples and their sample rate
pub fn decode_mp3(bytes: &[u8]) -> Result<(Vec<f32>, u32)> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(bytes));
    let mut samples = Vec::new();
    let mut sample_rate = 0u32;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                sample_rate = frame.sample_rate as u32;
                let channels = frame.channels.max(1);
                samples.extend(frame.data.chunks(channels).map(|f| {
                    f.iter().map(|&s| s as f32 / i16::MAX as f32).sum::<f32>() / channels as f32
                }));
            }
            Err(minimp3::Error::Eof) => break,
            Err(minimp3::Error::SkippedData) => continue,
            Err(e) => {
                return Err(HovorError::AudioProcessing(format!("MP3 decode failed: {:?}", e)));
            }
        }
    }

    if sample_rate == 0 {
        return Err(HovorError::AudioProcessing("MP3 stream has no frames".into()));
    }

    debug!("Decoded {} samples at {} Hz", samples.len(), sample_rate);
    Ok((samples, sample_rate))
}
