//! Audio output backends
//!
//! The engine talks to its output through [`OutputBackend`], which takes
//! ownership of the ring-buffer consumer and drains it until stopped.
//! [`CpalOutput`] is the real device path; [`NullOutput`] drains the buffer
//! without hardware and exists so the engine's state machine can be
//! exercised headless (tests, CI).

use crate::audio::types::{AudioFrame, SourceFormat};
use crate::error::{Error, Result};
use crate::playback::ring_buffer::AudioConsumer;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SampleRate, SizedSample, Stream, StreamConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Sink for decoded audio frames.
///
/// `start` hands over the consumer half of the ring buffer; the backend
/// drains it (at real-time rate for a device) until `stop`. Errors raised
/// by the backend after `start` are reported through `error_flag`, which
/// the streaming loop polls.
pub trait OutputBackend {
    fn start(&mut self, consumer: AudioConsumer, error_flag: Arc<AtomicBool>) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
}

/// List available audio output device names.
pub fn list_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();

    let devices: Vec<String> = host
        .output_devices()
        .map_err(|e| Error::Device(format!("failed to enumerate devices: {}", e)))?
        .filter_map(|device| device.name().ok())
        .collect();

    debug!("found {} output devices", devices.len());
    Ok(devices)
}

/// Audio output through cpal.
///
/// Opened with the source's channel count and sample rate; the sample
/// format is negotiated with the device (f32 preferred) and frames are
/// converted on write.
pub struct CpalOutput {
    device: Device,
    config: StreamConfig,
    sample_format: SampleFormat,
    stream: Option<Stream>,
}

impl CpalOutput {
    /// Open an output device configured for the given source format.
    ///
    /// # Arguments
    /// - `device_name`: optional device name (None = default device). If
    ///   the named device is missing, falls back to the default device.
    /// - `format`: validated source format; its sample rate and channel
    ///   count are requested from the device.
    ///
    /// # Errors
    /// `Device` if no device is available or no supported configuration
    /// covers the source's sample rate.
    pub fn open(device_name: Option<&str>, format: &SourceFormat) -> Result<Self> {
        let host = cpal::default_host();

        let device = if let Some(name) = device_name {
            let mut devices = host
                .output_devices()
                .map_err(|e| Error::Device(format!("failed to enumerate devices: {}", e)))?;

            match devices.find(|d| d.name().ok().as_deref() == Some(name)) {
                Some(dev) => {
                    info!("found requested audio device: {}", name);
                    dev
                }
                None => {
                    warn!("device '{}' not found, falling back to default", name);
                    host.default_output_device().ok_or_else(|| {
                        Error::Device(format!(
                            "device '{}' not found and no default device available",
                            name
                        ))
                    })?
                }
            }
        } else {
            host.default_output_device()
                .ok_or_else(|| Error::Device("no default output device found".to_string()))?
        };

        let (config, sample_format) = Self::pick_config(&device, format)?;
        debug!(
            "audio config: rate={}, channels={}, format={:?}",
            config.sample_rate.0, config.channels, sample_format
        );

        Ok(Self {
            device,
            config,
            sample_format,
            stream: None,
        })
    }

    /// Pick a supported device configuration for the source.
    ///
    /// Preference order: exact channel match with f32 samples, exact
    /// channel match with any sample format, then any channel layout that
    /// covers the source rate (the callback up/downmixes). The source rate
    /// itself is non-negotiable; resampling is out of scope.
    fn pick_config(
        device: &Device,
        format: &SourceFormat,
    ) -> Result<(StreamConfig, SampleFormat)> {
        let ranges: Vec<_> = device
            .supported_output_configs()
            .map_err(|e| Error::Device(format!("failed to get device configs: {}", e)))?
            .collect();

        let rate = SampleRate(format.sample_rate_hz);
        let covers_rate = |r: &&cpal::SupportedStreamConfigRange| {
            r.min_sample_rate() <= rate && rate <= r.max_sample_rate()
        };

        let picked = ranges
            .iter()
            .filter(covers_rate)
            .find(|r| {
                r.channels() == format.channel_count && r.sample_format() == SampleFormat::F32
            })
            .or_else(|| {
                ranges
                    .iter()
                    .filter(covers_rate)
                    .find(|r| r.channels() == format.channel_count)
            })
            .or_else(|| {
                ranges
                    .iter()
                    .filter(covers_rate)
                    .find(|r| r.sample_format() == SampleFormat::F32)
            })
            .or_else(|| ranges.iter().find(covers_rate));

        match picked {
            Some(range) => {
                let supported = range.clone().with_sample_rate(rate);
                let sample_format = supported.sample_format();
                Ok((supported.config(), sample_format))
            }
            None => Err(Error::Device(format!(
                "no output configuration supports {} Hz",
                format.sample_rate_hz
            ))),
        }
    }

    /// Negotiated sample rate
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Negotiated channel count
    pub fn channels(&self) -> u16 {
        self.config.channels
    }

    fn build_stream<T>(
        &self,
        mut consumer: AudioConsumer,
        error_flag: Arc<AtomicBool>,
    ) -> Result<Stream>
    where
        T: SizedSample + FromSample<f32>,
    {
        let channels = (self.config.channels as usize).max(1);

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    consumer.service_flush();

                    for frame_out in data.chunks_mut(channels) {
                        // Underrun yields silence without crashing
                        let frame = consumer.pop().unwrap_or_else(AudioFrame::zero);

                        if frame_out.len() == 1 {
                            frame_out[0] = T::from_sample(frame.mono());
                        } else {
                            frame_out[0] = T::from_sample(frame.left);
                            frame_out[1] = T::from_sample(frame.right);
                            for sample in frame_out.iter_mut().skip(2) {
                                *sample = T::from_sample(0.0f32);
                            }
                        }
                    }
                },
                move |err| {
                    error!("audio stream error: {}", err);
                    error_flag.store(true, Ordering::SeqCst);
                },
                None,
            )
            .map_err(|e| Error::Device(format!("failed to build stream: {}", e)))?;

        Ok(stream)
    }
}

impl OutputBackend for CpalOutput {
    fn start(&mut self, consumer: AudioConsumer, error_flag: Arc<AtomicBool>) -> Result<()> {
        info!("starting audio stream");

        let stream = match self.sample_format {
            SampleFormat::F32 => self.build_stream::<f32>(consumer, error_flag)?,
            SampleFormat::I16 => self.build_stream::<i16>(consumer, error_flag)?,
            SampleFormat::U16 => self.build_stream::<u16>(consumer, error_flag)?,
            other => {
                return Err(Error::Device(format!(
                    "unsupported sample format: {:?}",
                    other
                )));
            }
        };

        stream
            .play()
            .map_err(|e| Error::Device(format!("failed to start stream: {}", e)))?;

        self.stream = Some(stream);
        info!("audio stream started");
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            info!("stopping audio stream");
            stream
                .pause()
                .map_err(|e| Error::Device(format!("failed to pause stream: {}", e)))?;
            drop(stream);
        }
        Ok(())
    }
}

impl Drop for CpalOutput {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Headless output backend.
///
/// Drains the ring buffer on a plain thread and discards the frames, so
/// the engine's full state machine can run without audio hardware. By
/// default it drains as fast as the streaming thread can read; `paced`
/// drains at a real device's rate instead, preserving the streaming loop's
/// wall-clock pacing for timing-sensitive tests.
pub struct NullOutput {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    /// Frames per second to drain, None = unpaced
    pace_hz: Option<u32>,
}

impl NullOutput {
    pub fn new() -> Self {
        Self {
            shutdown: Arc::new(AtomicBool::new(false)),
            handle: None,
            pace_hz: None,
        }
    }

    /// Drain at `sample_rate_hz` frames per second, like a real device.
    pub fn paced(sample_rate_hz: u32) -> Self {
        Self {
            shutdown: Arc::new(AtomicBool::new(false)),
            handle: None,
            pace_hz: Some(sample_rate_hz.max(1)),
        }
    }
}

impl Default for NullOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputBackend for NullOutput {
    fn start(&mut self, mut consumer: AudioConsumer, _error_flag: Arc<AtomicBool>) -> Result<()> {
        let shutdown = Arc::clone(&self.shutdown);
        let pace_hz = self.pace_hz;

        let handle = thread::Builder::new()
            .name("wavescope-null-out".to_string())
            .spawn(move || match pace_hz {
                None => {
                    while !shutdown.load(Ordering::Acquire) {
                        consumer.service_flush();
                        if consumer.pop().is_none() {
                            thread::sleep(Duration::from_micros(200));
                        }
                    }
                }
                Some(rate) => {
                    // Drain ~10ms of frames per tick
                    let batch = (rate / 100).max(1);
                    while !shutdown.load(Ordering::Acquire) {
                        consumer.service_flush();
                        for _ in 0..batch {
                            if consumer.pop().is_none() {
                                break;
                            }
                        }
                        thread::sleep(Duration::from_millis(10));
                    }
                }
            })
            .map_err(|e| Error::Device(format!("failed to spawn drain thread: {}", e)))?;

        self.handle = Some(handle);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        Ok(())
    }
}

impl Drop for NullOutput {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
