//! Core audio data types
//!
//! Defines the validated source format, the normalized amplitude pair used
//! for rendering, and the f32 frame used in the playback pipeline.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// One normalized amplitude pair: (left, right).
///
/// 8-bit sources land in [-128, 127], 16-bit sources in [-32768, 32767].
/// Mono sources carry the same value in both slots.
pub type SamplePair = (i16, i16);

/// Validated format parameters of a PCM WAV source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFormat {
    /// Channel count, 1 (mono) or 2 (stereo)
    pub channel_count: u16,

    /// Bytes per sample, 1 (8-bit unsigned) or 2 (16-bit signed LE)
    pub sample_width_bytes: u16,

    /// Sample rate in Hz, passed through to the output stream unchanged
    pub sample_rate_hz: u32,
}

impl SourceFormat {
    /// Validate a WAV header into a supported source format.
    ///
    /// Anything other than 1/2 channels with 8/16-bit integer samples is
    /// rejected with `UnsupportedFormat`.
    pub fn from_spec(spec: &hound::WavSpec) -> Result<Self> {
        if spec.sample_format != hound::SampleFormat::Int {
            return Err(Error::UnsupportedFormat(
                "float samples are not supported".to_string(),
            ));
        }
        if !matches!(spec.channels, 1 | 2) {
            return Err(Error::UnsupportedFormat(format!(
                "unsupported number of channels: {}",
                spec.channels
            )));
        }
        if !matches!(spec.bits_per_sample, 8 | 16) {
            return Err(Error::UnsupportedFormat(format!(
                "unsupported sample width: {} bits",
                spec.bits_per_sample
            )));
        }

        Ok(Self {
            channel_count: spec.channels,
            sample_width_bytes: spec.bits_per_sample / 8,
            sample_rate_hz: spec.sample_rate,
        })
    }

    /// Factor that maps a normalized integer amplitude to f32 in [-1.0, 1.0)
    pub fn amplitude_scale(&self) -> f32 {
        match self.sample_width_bytes {
            1 => 1.0 / 128.0,
            _ => 1.0 / 32768.0,
        }
    }
}

/// AudioFrame represents a single stereo sample (one frame of audio).
///
/// Used for passing audio data between the streaming thread and the output
/// device callback.
#[derive(Debug, Clone, Copy)]
pub struct AudioFrame {
    /// Left channel sample
    pub left: f32,

    /// Right channel sample
    pub right: f32,
}

impl AudioFrame {
    /// Create a silent frame (0.0, 0.0)
    pub fn zero() -> Self {
        AudioFrame {
            left: 0.0,
            right: 0.0,
        }
    }

    /// Create a frame from a mono sample (duplicate to both channels)
    pub fn from_mono(sample: f32) -> Self {
        AudioFrame {
            left: sample,
            right: sample,
        }
    }

    /// Create a frame from left and right samples
    pub fn from_stereo(left: f32, right: f32) -> Self {
        AudioFrame { left, right }
    }

    /// Mono mixdown, used when the output device only offers one channel
    pub fn mono(&self) -> f32 {
        0.5 * (self.left + self.right)
    }
}
