//! Audio test file generation utilities
//!
//! Generates deterministic WAV files with known characteristics so decode
//! and playback behavior can be asserted exactly:
//! - silent audio (all zeros)
//! - a repeating integer ramp with per-channel sign, see [`sample_value`]

use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;

/// Standard test sample rate (44.1 kHz)
pub const TEST_SAMPLE_RATE: u32 = 44100;

fn spec(channels: u16, sample_rate: u32, bits_per_sample: u16) -> WavSpec {
    WavSpec {
        channels,
        sample_rate,
        bits_per_sample,
        sample_format: SampleFormat::Int,
    }
}

/// Deterministic amplitude for a given frame and channel.
///
/// A ramp over [-1001, 1001] repeating every 2003 frames; the right
/// channel carries the negated left value.
pub fn sample_value(frame: usize, channel: usize) -> i16 {
    let base = (frame % 2003) as i32 - 1001;
    if channel == 0 {
        base as i16
    } else {
        -base as i16
    }
}

/// Write a 16-bit WAV from explicit interleaved samples.
pub fn write_wav_i16<P: AsRef<Path>>(
    path: P,
    channels: u16,
    sample_rate: u32,
    samples: &[i16],
) -> Result<(), hound::Error> {
    let mut writer = WavWriter::create(path, spec(channels, sample_rate, 16))?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()
}

/// Write an 8-bit WAV from explicit interleaved samples.
///
/// Values are centered (hound applies the unsigned offset on disk).
pub fn write_wav_i8<P: AsRef<Path>>(
    path: P,
    channels: u16,
    sample_rate: u32,
    samples: &[i8],
) -> Result<(), hound::Error> {
    let mut writer = WavWriter::create(path, spec(channels, sample_rate, 8))?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()
}

/// Generate a silent 16-bit stereo WAV with the given frame count.
pub fn generate_silent_wav<P: AsRef<Path>>(
    path: P,
    frames: usize,
) -> Result<(), hound::Error> {
    let mut writer = WavWriter::create(path, spec(2, TEST_SAMPLE_RATE, 16))?;
    for _ in 0..frames * 2 {
        writer.write_sample(0i16)?;
    }
    writer.finalize()
}

/// Generate a 16-bit ramp WAV; every sample is [`sample_value`].
pub fn generate_ramp_wav<P: AsRef<Path>>(
    path: P,
    channels: u16,
    frames: usize,
) -> Result<(), hound::Error> {
    let mut writer = WavWriter::create(path, spec(channels, TEST_SAMPLE_RATE, 16))?;
    for frame in 0..frames {
        for channel in 0..channels as usize {
            writer.write_sample(sample_value(frame, channel))?;
        }
    }
    writer.finalize()
}
