//! Eager WAV decoding for waveform display
//!
//! `Waveform` holds the whole file as normalized amplitude pairs. It exists
//! only to drive rendering; playback streams the file independently through
//! [`crate::audio::source::WavSource`] rather than reusing this buffer.

use crate::audio::types::{SamplePair, SourceFormat};
use crate::error::Result;
use std::path::Path;
use tracing::{debug, warn};

/// Decoded waveform: validated format metadata plus one normalized
/// (left, right) amplitude pair per frame.
///
/// Immutable after construction; a new load replaces the value wholesale.
#[derive(Debug, Clone)]
pub struct Waveform {
    format: SourceFormat,
    frame_count: u64,
    samples: Vec<SamplePair>,
}

impl Waveform {
    /// Open and fully decode the WAV file at `path`.
    ///
    /// 8-bit samples are unsigned on disk; hound centers them to
    /// [-128, 127] on read. 16-bit little-endian signed samples are taken
    /// verbatim. Mono sources duplicate each sample into both pair slots,
    /// stereo sources pair consecutive interleaved samples.
    ///
    /// # Errors
    /// - `UnsupportedFormat` for channel counts other than 1/2, widths
    ///   other than 8/16 bits, or non-integer encodings
    /// - `Io` for open/read failures
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        let format = SourceFormat::from_spec(&spec)?;
        let header_frames = reader.duration() as u64;

        let mut samples = Vec::with_capacity(header_frames as usize);
        match format.channel_count {
            1 => {
                for sample in reader.samples::<i16>() {
                    let value = sample?;
                    samples.push((value, value));
                }
            }
            _ => {
                let mut iter = reader.samples::<i16>();
                while let Some(left) = iter.next() {
                    let left = left?;
                    let right = match iter.next() {
                        Some(right) => right?,
                        // Trailing unpaired sample in a truncated file
                        None => break,
                    };
                    samples.push((left, right));
                }
            }
        }

        let frame_count = samples.len() as u64;
        if frame_count != header_frames {
            warn!(
                "{}: header declares {} frames, decoded {}",
                path.display(),
                header_frames,
                frame_count
            );
        }
        debug!(
            "decoded {}: {}ch {}B {}Hz, {} frames",
            path.display(),
            format.channel_count,
            format.sample_width_bytes,
            format.sample_rate_hz,
            frame_count
        );

        Ok(Self {
            format,
            frame_count,
            samples,
        })
    }

    /// Validated format parameters
    pub fn format(&self) -> &SourceFormat {
        &self.format
    }

    /// Channel count of the source (1 or 2)
    pub fn channel_count(&self) -> u16 {
        self.format.channel_count
    }

    /// Bytes per sample of the source (1 or 2)
    pub fn sample_width_bytes(&self) -> u16 {
        self.format.sample_width_bytes
    }

    /// Sample rate in Hz
    pub fn sample_rate_hz(&self) -> u32 {
        self.format.sample_rate_hz
    }

    /// Total frames decoded
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Normalized (left, right) amplitude pairs, one per frame
    pub fn samples(&self) -> &[SamplePair] {
        &self.samples
    }
}
