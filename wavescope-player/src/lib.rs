//! # wavescope player library (wavescope-player)
//!
//! Core of a WAV waveform viewer/player: eager waveform decoding for
//! display, a pure downsampling render model, and a threaded playback
//! engine that streams audio from disk to an output device.
//!
//! **Architecture:** hound decode, lock-free ring buffer, cpal output.
//! A dedicated streaming thread reads fixed-size chunks from the file and
//! pushes frames into the ring buffer; the audio callback drains it. The
//! engine publishes position and state through the shared [`EventBus`] so a
//! hosting UI can keep its marker and controls in sync.
//!
//! Window layout, dialogs and canvas drawing belong to the hosting UI and
//! are not part of this crate.

pub mod audio;
pub mod config;
pub mod error;
pub mod playback;
pub mod render;

pub use audio::decoder::Waveform;
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use playback::PlaybackEngine;
pub use wavescope_common::{EventBus, PlaybackState, PlayerEvent};
