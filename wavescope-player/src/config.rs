//! wavescope-player specific configuration

use crate::playback::ring_buffer::DEFAULT_RING_CAPACITY;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Playback engine configuration
///
/// Plain value struct; the hosting application decides where (or whether)
/// these settings are persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Frames read from the source and written to the device per streaming
    /// loop iteration
    pub chunk_frames: usize,

    /// Sleep interval of the streaming loop while not playing
    pub idle_poll_ms: u64,

    /// Capacity of the frame ring buffer between the streaming thread and
    /// the output callback (~46ms at 44.1kHz with the default)
    pub ring_capacity_frames: usize,

    /// Event bus channel depth
    pub event_capacity: usize,

    /// Output device name (None = default device)
    pub device_name: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_frames: 1024,
            idle_poll_ms: 100,
            ring_capacity_frames: DEFAULT_RING_CAPACITY,
            event_capacity: 256,
            device_name: None,
        }
    }
}

impl EngineConfig {
    /// Idle poll interval as a Duration
    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }
}
