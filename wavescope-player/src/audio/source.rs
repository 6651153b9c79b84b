//! Streaming read cursor for playback
//!
//! `WavSource` is the playback-side view of the file: chunked frame reads
//! converted to f32 [`AudioFrame`]s, plus frame-accurate seeking. The
//! streaming loop owns the read path; seeks from the control surface happen
//! under the same lock as the loop's reads (see the engine).

use crate::audio::types::{AudioFrame, SourceFormat};
use crate::error::Result;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Exclusively owned decode/read cursor into a WAV file.
pub struct WavSource {
    reader: hound::WavReader<BufReader<File>>,
    format: SourceFormat,
    frame_count: u64,
    position_frames: u64,
}

impl WavSource {
    /// Open the file and position the cursor at frame 0.
    ///
    /// Applies the same format validation as the display decoder.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        let format = SourceFormat::from_spec(&spec)?;
        let frame_count = reader.duration() as u64;

        debug!(
            "opened source {}: {}ch {}B {}Hz, {} frames",
            path.display(),
            format.channel_count,
            format.sample_width_bytes,
            format.sample_rate_hz,
            frame_count
        );

        Ok(Self {
            reader,
            format,
            frame_count,
            position_frames: 0,
        })
    }

    /// Read up to `max_frames` frames from the current position.
    ///
    /// Returns fewer frames than requested only at end of file. Mono
    /// sources are duplicated into both channels; amplitudes are scaled to
    /// f32 at the source's native width.
    pub fn read_chunk(&mut self, max_frames: usize) -> Result<Vec<AudioFrame>> {
        let scale = self.format.amplitude_scale();
        let stereo = self.format.channel_count == 2;
        let mut frames = Vec::with_capacity(max_frames);

        {
            let mut samples = self.reader.samples::<i16>();
            for _ in 0..max_frames {
                let Some(first) = samples.next() else { break };
                let first = first? as f32 * scale;
                if stereo {
                    let Some(second) = samples.next() else { break };
                    frames.push(AudioFrame::from_stereo(first, second? as f32 * scale));
                } else {
                    frames.push(AudioFrame::from_mono(first));
                }
            }
        }

        self.position_frames += frames.len() as u64;
        Ok(frames)
    }

    /// Reposition the cursor, clamping into `[0, frame_count]`.
    ///
    /// Returns the clamped frame actually seeked to.
    pub fn seek(&mut self, position_frames: u64) -> Result<u64> {
        let clamped = position_frames.min(self.frame_count);
        self.reader.seek(clamped as u32)?;
        self.position_frames = clamped;
        Ok(clamped)
    }

    /// Current cursor position in frames
    pub fn position(&self) -> u64 {
        self.position_frames
    }

    /// Total frames in the source per the header
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Validated format parameters
    pub fn format(&self) -> &SourceFormat {
        &self.format
    }
}
