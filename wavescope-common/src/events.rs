//! Event types and EventBus for wavescope
//!
//! # Architecture
//!
//! The player uses one-to-many event broadcasting:
//! - **EventBus** (tokio::broadcast): engine to subscribers
//! - **Shared state** (atomics in the player crate): lock-free position reads
//!
//! Position events are an indicator stream, not an event log. Subscribers
//! that fall behind lose the oldest events and resume with the latest, which
//! is the intended behavior for a redraw-the-marker consumer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

/// Playback transport state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Playing,
    Paused,
    Stopped,
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
            PlaybackState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Events published by the playback engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerEvent {
    /// Playback position moved (streamed chunk, seek, stop or rewind)
    PositionChanged {
        position_frames: u64,
        timestamp: DateTime<Utc>,
    },

    /// Transport state changed
    ///
    /// Also emitted with `old_state == new_state == Playing` when repeat
    /// wraps at end of file, so controls can refresh themselves.
    PlaybackStateChanged {
        old_state: PlaybackState,
        new_state: PlaybackState,
        timestamp: DateTime<Utc>,
    },

    /// A failure occurred on the streaming thread
    PlaybackError {
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl PlayerEvent {
    /// Position event stamped with the current time
    pub fn position(position_frames: u64) -> Self {
        PlayerEvent::PositionChanged {
            position_frames,
            timestamp: Utc::now(),
        }
    }

    /// State transition event stamped with the current time
    pub fn state_change(old_state: PlaybackState, new_state: PlaybackState) -> Self {
        PlayerEvent::PlaybackStateChanged {
            old_state,
            new_state,
            timestamp: Utc::now(),
        }
    }

    /// Error event stamped with the current time
    pub fn error(message: impl Into<String>) -> Self {
        PlayerEvent::PlaybackError {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Short event name for logging and dispatch
    pub fn event_type(&self) -> &'static str {
        match self {
            PlayerEvent::PositionChanged { .. } => "PositionChanged",
            PlayerEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            PlayerEvent::PlaybackError { .. } => "PlaybackError",
        }
    }
}

/// Central event distribution bus
///
/// Wraps tokio::broadcast, providing:
/// - Non-blocking publish (slow subscribers don't block the engine)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PlayerEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the given channel capacity.
    ///
    /// Capacity bounds how many events a slow subscriber can fall behind
    /// before old events are dropped. A zero capacity is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events.
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers.
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if nobody is listening.
    pub fn emit(
        &self,
        event: PlayerEvent,
    ) -> Result<usize, broadcast::error::SendError<PlayerEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring the case where no subscribers are listening.
    ///
    /// The engine publishes position updates unconditionally; whether a UI
    /// is currently attached is not its concern.
    pub fn emit_lossy(&self, event: PlayerEvent) {
        if self.tx.send(event).is_err() {
            trace!("event dropped: no subscribers");
        }
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eventbus_new() {
        let bus = EventBus::new(100);
        assert_eq!(bus.capacity(), 100);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_eventbus_zero_capacity_raised() {
        let bus = EventBus::new(0);
        assert_eq!(bus.capacity(), 1);
    }

    #[test]
    fn test_eventbus_subscribe() {
        let bus = EventBus::new(100);
        let _rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        let _rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn test_eventbus_emit_no_subscribers() {
        let bus = EventBus::new(100);
        let event = PlayerEvent::state_change(PlaybackState::Paused, PlaybackState::Playing);

        // Should return error when no subscribers
        assert!(bus.emit(event).is_err());
    }

    #[test]
    fn test_eventbus_emit_with_subscriber() {
        let bus = EventBus::new(100);
        let mut rx = bus.subscribe();

        let event = PlayerEvent::state_change(PlaybackState::Paused, PlaybackState::Playing);
        assert!(bus.emit(event).is_ok());

        let received = rx.try_recv().unwrap();
        match received {
            PlayerEvent::PlaybackStateChanged {
                old_state,
                new_state,
                ..
            } => {
                assert_eq!(old_state, PlaybackState::Paused);
                assert_eq!(new_state, PlaybackState::Playing);
            }
            _ => panic!("Wrong event type received"),
        }
    }

    #[test]
    fn test_eventbus_emit_lossy() {
        let bus = EventBus::new(100);
        // Should not panic even without subscribers
        bus.emit_lossy(PlayerEvent::position(1024));
    }

    #[test]
    fn test_position_events_drop_oldest_when_lagged() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();

        for frame in 0..8u64 {
            bus.emit_lossy(PlayerEvent::position(frame * 1024));
        }

        // The first read reports the lag, then the latest events remain
        assert!(matches!(
            rx.try_recv(),
            Err(tokio::sync::broadcast::error::TryRecvError::Lagged(_))
        ));
        let latest = rx.try_recv().unwrap();
        match latest {
            PlayerEvent::PositionChanged { position_frames, .. } => {
                assert!(position_frames >= 6 * 1024);
            }
            _ => panic!("Expected PositionChanged"),
        }
    }

    #[test]
    fn test_playback_state_display() {
        assert_eq!(PlaybackState::Playing.to_string(), "playing");
        assert_eq!(PlaybackState::Paused.to_string(), "paused");
        assert_eq!(PlaybackState::Stopped.to_string(), "stopped");
    }

    #[test]
    fn test_event_type_names() {
        assert_eq!(PlayerEvent::position(0).event_type(), "PositionChanged");
        assert_eq!(PlayerEvent::error("boom").event_type(), "PlaybackError");
    }
}
