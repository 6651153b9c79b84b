//! # wavescope common types (wavescope-common)
//!
//! Shared event and state definitions for the wavescope waveform player.
//!
//! The player core and any hosting UI communicate through the [`EventBus`]
//! defined here: the engine publishes position, state and error events, and
//! the UI subscribes to redraw its marker and controls.

pub mod events;

pub use events::{EventBus, PlaybackState, PlayerEvent};
