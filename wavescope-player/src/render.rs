//! Waveform render model
//!
//! Pure functions that reduce a decoded waveform to per-pixel-column
//! amplitude bars and map between playback position and marker pixel.
//! The hosting UI owns the actual drawing.
//!
//! Downsampling is nearest-sample: each column shows the single sample at
//! `x * stride`, with no averaging inside the stride window.
//!
//! The two position mappings are intentionally not inverses of each other:
//! [`position_to_pixel`] is stride-based with a `+1` bias toward the right
//! edge of the indexed sample's column, while [`pixel_to_position`] is a
//! proportional floor over the full width. This asymmetry reproduces the
//! established on-screen behavior and must not be unified silently.

use crate::audio::types::SamplePair;

/// Downsampling parameters for one (waveform, canvas) pairing.
///
/// Both fields are guaranteed to be at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderScale {
    /// Source samples per rendered pixel column
    pub stride: usize,

    /// Divisor mapping amplitudes into half the canvas height
    pub amplitude_divisor: i32,
}

/// Compute the downsampling stride and amplitude divisor.
///
/// `stride = max(1, samples / pixel_width)`; a zero-width canvas degrades
/// to stride 1 rather than dividing by zero. The divisor scales the peak
/// amplitude into `pixel_height / 2`; silent or empty waveforms and
/// degenerate heights degrade to divisor 1. The ≥ 1 floors are load-bearing
/// for every caller that divides by these values.
pub fn compute_scale(samples: &[SamplePair], pixel_width: u32, pixel_height: u32) -> RenderScale {
    let stride = if pixel_width == 0 {
        1
    } else {
        (samples.len() / pixel_width as usize).max(1)
    };

    let half_height = (pixel_height / 2).max(1) as i32;
    let peak = samples
        .iter()
        .map(|&(left, right)| (left as i32).abs().max((right as i32).abs()))
        .max()
        .unwrap_or(0);
    let amplitude_divisor = (peak / half_height).max(1);

    RenderScale {
        stride,
        amplitude_divisor,
    }
}

/// Per-column (left, right) bar heights in pixels.
///
/// Column `x` shows `samples[x * stride]` divided by the amplitude divisor.
/// Columns whose index falls past the sample range produce no bar, so the
/// result may be shorter than `pixel_width`.
pub fn column_amplitudes(
    samples: &[SamplePair],
    scale: &RenderScale,
    pixel_width: u32,
) -> Vec<(i32, i32)> {
    let stride = scale.stride.max(1);
    let divisor = scale.amplitude_divisor.max(1);

    let mut columns = Vec::new();
    for x in 0..pixel_width as usize {
        let index = x * stride;
        if index >= samples.len() {
            break;
        }
        let (left, right) = samples[index];
        columns.push((left as i32 / divisor, right as i32 / divisor));
    }
    columns
}

/// Pixel column of the position marker.
///
/// The `+1` biases the marker to the right edge of the indexed sample's
/// column, matching how clicks map back through [`pixel_to_position`].
pub fn position_to_pixel(position_frames: u64, stride: usize) -> u32 {
    ((position_frames + 1) / stride.max(1) as u64) as u32
}

/// Frame position for a click at `click_x` on a `pixel_width`-wide canvas.
///
/// Proportional floor mapping, deliberately not the inverse of
/// [`position_to_pixel`].
pub fn pixel_to_position(click_x: u32, pixel_width: u32, frame_count: u64) -> u64 {
    if pixel_width == 0 {
        return 0;
    }
    (click_x as u128 * frame_count as u128 / pixel_width as u128) as u64
}
