//! Lock-free ring buffer for audio frames
//!
//! Single-producer single-consumer buffer between the streaming thread and
//! the audio output callback.
//!
//! Design:
//! - Producer (streaming thread): fills the buffer with decoded frames; a
//!   full buffer is the loop's backpressure, since the device drains it at
//!   real-time rate
//! - Consumer (audio callback): pops frames without locks, outputs silence
//!   on underrun
//! - Flush flag: seek and stop raise it; the consumer discards everything
//!   buffered before its next pop, so stale pre-seek audio never reaches
//!   the device

use crate::audio::types::AudioFrame;
use ringbuf::{traits::*, HeapRb};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Default ring capacity in frames (~46ms @ 44.1kHz)
pub const DEFAULT_RING_CAPACITY: usize = 2048;

/// Lock-free SPSC ring buffer for audio frames.
pub struct AudioRingBuffer {
    buffer: HeapRb<AudioFrame>,

    /// Underrun counter (callback found the buffer empty)
    underruns: Arc<AtomicU64>,

    /// Overrun counter (producer found the buffer full)
    overruns: Arc<AtomicU64>,

    /// Raised by the control surface on seek/stop; serviced by the consumer
    flush_pending: Arc<AtomicBool>,

    /// Whether audio output is currently expected (set by the engine from
    /// the transport state). Classifies underruns: trace when idle or
    /// paused, warn during active playback.
    audio_expected: Arc<AtomicBool>,
}

impl AudioRingBuffer {
    /// Create a ring buffer with the given capacity in frames.
    pub fn new(capacity: usize, audio_expected: Arc<AtomicBool>) -> Self {
        let capacity = capacity.max(1);
        debug!("creating audio ring buffer, capacity {} frames", capacity);

        Self {
            buffer: HeapRb::new(capacity),
            underruns: Arc::new(AtomicU64::new(0)),
            overruns: Arc::new(AtomicU64::new(0)),
            flush_pending: Arc::new(AtomicBool::new(false)),
            audio_expected,
        }
    }

    /// Split into producer and consumer halves plus the flush handle.
    ///
    /// The producer goes to the streaming thread, the consumer to the
    /// output backend, the flush handle stays with the engine.
    pub fn split(self) -> (AudioProducer, AudioConsumer, FlushHandle) {
        let (prod, cons) = self.buffer.split();

        let producer = AudioProducer {
            producer: prod,
            overruns: Arc::clone(&self.overruns),
        };

        let consumer = AudioConsumer {
            consumer: cons,
            underruns: Arc::clone(&self.underruns),
            flush_pending: Arc::clone(&self.flush_pending),
            audio_expected: Arc::clone(&self.audio_expected),
        };

        (producer, consumer, FlushHandle(self.flush_pending))
    }
}

/// Producer half (streaming thread).
pub struct AudioProducer {
    producer: ringbuf::HeapProd<AudioFrame>,
    overruns: Arc<AtomicU64>,
}

impl AudioProducer {
    /// Push a frame. Returns false if the buffer was full.
    ///
    /// The streaming loop treats a full buffer as its pacing signal and
    /// retries after a short sleep.
    pub fn push(&mut self, frame: AudioFrame) -> bool {
        match self.producer.try_push(frame) {
            Ok(()) => true,
            Err(_) => {
                self.overruns.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Current buffer fill level in frames
    pub fn occupied_len(&self) -> usize {
        self.producer.occupied_len()
    }

    /// Buffer capacity in frames
    pub fn capacity(&self) -> usize {
        self.producer.capacity().into()
    }
}

/// Consumer half (output callback).
pub struct AudioConsumer {
    consumer: ringbuf::HeapCons<AudioFrame>,
    underruns: Arc<AtomicU64>,
    flush_pending: Arc<AtomicBool>,
    audio_expected: Arc<AtomicBool>,
}

impl AudioConsumer {
    /// Discard all buffered frames if a flush was requested.
    ///
    /// Called once per callback invocation, before popping. Returns the
    /// number of frames discarded.
    pub fn service_flush(&mut self) -> usize {
        if !self.flush_pending.swap(false, Ordering::AcqRel) {
            return 0;
        }
        let mut discarded = 0;
        while self.consumer.try_pop().is_some() {
            discarded += 1;
        }
        if discarded > 0 {
            trace!("flushed {} stale frames", discarded);
        }
        discarded
    }

    /// Pop a frame, or None if the buffer is empty (underrun).
    ///
    /// The caller outputs silence on None. Underruns while paused, stopped
    /// or between sessions are expected and logged at trace; underruns
    /// during active playback mean the streaming thread is not keeping up.
    pub fn pop(&mut self) -> Option<AudioFrame> {
        match self.consumer.try_pop() {
            Some(frame) => Some(frame),
            None => {
                let count = self.underruns.fetch_add(1, Ordering::Relaxed) + 1;
                // Log every 1000th underrun to avoid spam
                if count % 1000 == 0 {
                    if self.audio_expected.load(Ordering::Acquire) {
                        warn!("audio ring buffer underrun during playback (total: {})", count);
                    } else {
                        trace!("audio ring buffer underrun while idle (total: {})", count);
                    }
                }
                None
            }
        }
    }

    /// Current buffer fill level in frames
    pub fn occupied_len(&self) -> usize {
        self.consumer.occupied_len()
    }
}

/// Control-surface handle that requests a consumer-side flush.
#[derive(Clone)]
pub struct FlushHandle(Arc<AtomicBool>);

impl FlushHandle {
    /// Ask the consumer to discard buffered frames before its next pop.
    pub fn request(&self) {
        self.0.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(capacity: usize) -> (AudioProducer, AudioConsumer, FlushHandle) {
        let audio_expected = Arc::new(AtomicBool::new(false));
        AudioRingBuffer::new(capacity, audio_expected).split()
    }

    #[test]
    fn test_ring_buffer_basic() {
        let (mut prod, mut cons, _flush) = ring(128);

        assert!(prod.push(AudioFrame::from_stereo(0.1, 0.2)));
        assert!(prod.push(AudioFrame::from_stereo(0.3, 0.4)));

        let popped1 = cons.pop().unwrap();
        assert_eq!(popped1.left, 0.1);
        assert_eq!(popped1.right, 0.2);

        let popped2 = cons.pop().unwrap();
        assert_eq!(popped2.left, 0.3);
        assert_eq!(popped2.right, 0.4);

        // Buffer should be empty now
        assert!(cons.pop().is_none());
    }

    #[test]
    fn test_ring_buffer_overrun() {
        let (mut prod, mut _cons, _flush) = ring(4);
        let frame = AudioFrame::zero();

        assert!(prod.push(frame));
        assert!(prod.push(frame));
        assert!(prod.push(frame));
        assert!(prod.push(frame));

        // Next push should fail (overrun)
        assert!(!prod.push(frame));
        assert_eq!(prod.occupied_len(), 4);
        assert_eq!(prod.capacity(), 4);
    }

    #[test]
    fn test_ring_buffer_underrun() {
        let (_prod, mut cons, _flush) = ring(128);
        assert!(cons.pop().is_none());
    }

    #[test]
    fn test_flush_discards_buffered_frames() {
        let (mut prod, mut cons, flush) = ring(128);
        for _ in 0..10 {
            prod.push(AudioFrame::from_mono(0.5));
        }

        // Without a request, nothing is discarded
        assert_eq!(cons.service_flush(), 0);
        assert_eq!(cons.occupied_len(), 10);

        flush.request();
        assert_eq!(cons.service_flush(), 10);
        assert!(cons.pop().is_none());

        // The request is one-shot
        assert_eq!(cons.service_flush(), 0);
    }

    #[test]
    fn test_flush_then_new_frames_pass_through() {
        let (mut prod, mut cons, flush) = ring(128);
        prod.push(AudioFrame::from_mono(0.1));
        flush.request();
        cons.service_flush();

        prod.push(AudioFrame::from_mono(0.9));
        let frame = cons.pop().unwrap();
        assert_eq!(frame.left, 0.9);
    }
}
