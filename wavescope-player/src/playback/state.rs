//! Shared transport state
//!
//! Status and repeat are plain atomics. The position atomic is the
//! lock-free *queryable* copy; every write to it happens while holding the
//! engine's source lock, so the cursor and the published position can never
//! disagree. Readers never block.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use wavescope_common::PlaybackState;

const STOPPED: u8 = 0;
const PLAYING: u8 = 1;
const PAUSED: u8 = 2;

fn encode(state: PlaybackState) -> u8 {
    match state {
        PlaybackState::Stopped => STOPPED,
        PlaybackState::Playing => PLAYING,
        PlaybackState::Paused => PAUSED,
    }
}

fn decode(raw: u8) -> PlaybackState {
    match raw {
        PLAYING => PlaybackState::Playing,
        PAUSED => PlaybackState::Paused,
        _ => PlaybackState::Stopped,
    }
}

/// Transport state shared between the controlling actor and the streaming
/// loop.
#[derive(Debug)]
pub struct SharedTransport {
    status: AtomicU8,
    position_frames: AtomicU64,
    repeat: AtomicBool,
}

impl SharedTransport {
    pub fn new() -> Self {
        Self {
            status: AtomicU8::new(STOPPED),
            position_frames: AtomicU64::new(0),
            repeat: AtomicBool::new(false),
        }
    }

    pub fn status(&self) -> PlaybackState {
        decode(self.status.load(Ordering::Acquire))
    }

    /// Set the status, returning the previous value.
    pub fn set_status(&self, status: PlaybackState) -> PlaybackState {
        decode(self.status.swap(encode(status), Ordering::AcqRel))
    }

    pub fn position(&self) -> u64 {
        self.position_frames.load(Ordering::Acquire)
    }

    /// Callers must hold the engine's source lock; see module docs.
    pub fn set_position(&self, position_frames: u64) {
        self.position_frames.store(position_frames, Ordering::Release);
    }

    pub fn repeat(&self) -> bool {
        self.repeat.load(Ordering::Acquire)
    }

    pub fn set_repeat(&self, repeat: bool) {
        self.repeat.store(repeat, Ordering::Release);
    }
}

impl Default for SharedTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let transport = SharedTransport::new();
        assert_eq!(transport.status(), PlaybackState::Stopped);
        assert_eq!(transport.position(), 0);
        assert!(!transport.repeat());
    }

    #[test]
    fn test_set_status_returns_previous() {
        let transport = SharedTransport::new();
        assert_eq!(
            transport.set_status(PlaybackState::Playing),
            PlaybackState::Stopped
        );
        assert_eq!(
            transport.set_status(PlaybackState::Paused),
            PlaybackState::Playing
        );
        assert_eq!(transport.status(), PlaybackState::Paused);
    }

    #[test]
    fn test_position_roundtrip() {
        let transport = SharedTransport::new();
        transport.set_position(44100);
        assert_eq!(transport.position(), 44100);
    }

    #[test]
    fn test_repeat_flag() {
        let transport = SharedTransport::new();
        transport.set_repeat(true);
        assert!(transport.repeat());
        transport.set_repeat(false);
        assert!(!transport.repeat());
    }
}
