//! Microphone capture via cpal, written out as WAV.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{error, info};

use attendant::{AudioCapture, AutomationError};

pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

fn recording_err(context: &str, e: impl std::fmt::Display) -> AutomationError {
    AutomationError::Recording(format!("{context}: {e}"))
}

/// Records mono f32 from the default input device for a fixed duration.
pub struct CpalRecorder {
    sample_rate: u32,
}

impl CpalRecorder {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

impl Default for CpalRecorder {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}

#[async_trait]
impl AudioCapture for CpalRecorder {
    async fn capture_to(&self, path: &Path, duration: Duration) -> Result<(), AutomationError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| recording_err("could not create output directory", e))?;
            }
        }
        let path = path.to_path_buf();
        let sample_rate = self.sample_rate;
        // cpal streams are not Send; the whole capture lives on one blocking
        // thread.
        tokio::task::spawn_blocking(move || record_blocking(&path, sample_rate, duration))
            .await
            .map_err(|e| recording_err("capture task failed", e))?
    }
}

fn record_blocking(
    path: &Path,
    sample_rate: u32,
    duration: Duration,
) -> Result<(), AutomationError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| AutomationError::Recording("no input device available".to_string()))?;
    info!(
        "capturing from input device: {}",
        device.name().unwrap_or_else(|_| "unknown".to_string())
    );

    let config = cpal::StreamConfig {
        channels: 1,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let samples: Arc<Mutex<Vec<f32>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = samples.clone();
    let err_fn = |err| error!("input stream error: {err}");

    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if let Ok(mut sink) = sink.lock() {
                    sink.extend_from_slice(data);
                }
            },
            err_fn,
            None,
        )
        .map_err(|e| recording_err("could not open input stream", e))?;

    stream
        .play()
        .map_err(|e| recording_err("could not start input stream", e))?;
    std::thread::sleep(duration);
    drop(stream);

    let samples = samples
        .lock()
        .map_err(|_| AutomationError::Recording("sample buffer poisoned".to_string()))?;
    write_wav(path, sample_rate, &samples)?;
    info!("captured {} samples to {:?}", samples.len(), path);
    Ok(())
}

fn write_wav(path: &Path, sample_rate: u32, samples: &[f32]) -> Result<(), AutomationError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer =
        hound::WavWriter::create(path, spec).map_err(|e| recording_err("could not create wav", e))?;
    for &sample in samples {
        writer
            .write_sample(sample)
            .map_err(|e| recording_err("could not write sample", e))?;
    }
    writer
        .finalize()
        .map_err(|e| recording_err("could not finalize wav", e))
}
