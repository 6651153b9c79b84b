//! Playback engine
//!
//! Owns the open source, the output backend and the transport state, and
//! runs the streaming loop on a dedicated thread for the lifetime of an
//! open session.
//!
//! # Concurrency
//!
//! Two writers share the transport: the controlling actor (play, pause,
//! stop, seek, repeat) and the streaming loop (chunk advance, end-of-file
//! reset). Status and repeat are atomics; the file cursor and the published
//! position form a pair guarded by the source mutex, so a seek or stop
//! issued while playing is visible to the very next chunk the loop reads.
//! Tear-down is cooperative: `close()` raises a shutdown flag the loop
//! observes at its next sleep or push, bounded by about one chunk.
//!
//! After every streamed chunk and on every seek, stop and rewind the engine
//! publishes the current frame position on the event bus; the hosting UI
//! redraws its marker from the latest value and may drop intermediate ones.

use crate::audio::output::{CpalOutput, OutputBackend};
use crate::audio::source::WavSource;
use crate::audio::types::AudioFrame;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::playback::ring_buffer::{AudioProducer, AudioRingBuffer, FlushHandle};
use crate::playback::state::SharedTransport;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use wavescope_common::{EventBus, PlaybackState, PlayerEvent};

/// Lock the source, recovering the guard if the streaming thread panicked
/// while holding it.
fn lock_source(source: &Mutex<WavSource>) -> MutexGuard<'_, WavSource> {
    match source.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Everything tied to one open file: torn down wholesale on close/reopen.
struct Session {
    source: Arc<Mutex<WavSource>>,
    frame_count: u64,
    output: Box<dyn OutputBackend>,
    flush: FlushHandle,
    shutdown: Arc<AtomicBool>,
    failed: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

/// Concurrent playback engine with transport controls and position
/// publication.
///
/// Transport methods are soft: with no open session, `play`, `pause`,
/// `stop` and `seek` are harmless no-ops, so a stray control action before
/// a file is loaded cannot fail.
pub struct PlaybackEngine {
    config: EngineConfig,
    transport: Arc<SharedTransport>,
    events: EventBus,
    audio_expected: Arc<AtomicBool>,
    session: Option<Session>,
}

impl PlaybackEngine {
    pub fn new(config: EngineConfig) -> Self {
        let events = EventBus::new(config.event_capacity);
        Self {
            config,
            transport: Arc::new(SharedTransport::new()),
            events,
            audio_expected: Arc::new(AtomicBool::new(false)),
            session: None,
        }
    }

    /// Event bus carrying position, state and error notifications.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Open `path` for playback on the configured output device.
    ///
    /// Any prior session is closed first; the new device stream is
    /// configured from the new source's format. The engine stays `Stopped`
    /// until `play`.
    pub fn open<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.close();
        let source = WavSource::open(path)?;
        let output = CpalOutput::open(self.config.device_name.as_deref(), source.format())?;
        info!("opened {} for playback", path.display());
        self.install_session(source, Box::new(output))
    }

    /// Open `path` with a caller-provided output backend.
    ///
    /// Used with [`crate::audio::output::NullOutput`] to run the engine
    /// without audio hardware.
    pub fn open_with_output<P: AsRef<Path>>(
        &mut self,
        path: P,
        output: Box<dyn OutputBackend>,
    ) -> Result<()> {
        let path = path.as_ref();
        self.close();
        let source = WavSource::open(path)?;
        info!("opened {} for playback (custom output)", path.display());
        self.install_session(source, output)
    }

    fn install_session(
        &mut self,
        source: WavSource,
        mut output: Box<dyn OutputBackend>,
    ) -> Result<()> {
        let frame_count = source.frame_count();
        let ring = AudioRingBuffer::new(
            self.config.ring_capacity_frames,
            Arc::clone(&self.audio_expected),
        );
        let (producer, consumer, flush) = ring.split();

        let device_error = Arc::new(AtomicBool::new(false));
        output.start(consumer, Arc::clone(&device_error))?;

        let source = Arc::new(Mutex::new(source));
        let shutdown = Arc::new(AtomicBool::new(false));
        let failed = Arc::new(AtomicBool::new(false));

        let worker = StreamWorker {
            source: Arc::clone(&source),
            producer,
            transport: Arc::clone(&self.transport),
            events: self.events.clone(),
            shutdown: Arc::clone(&shutdown),
            device_error,
            failed: Arc::clone(&failed),
            audio_expected: Arc::clone(&self.audio_expected),
            frame_count,
            chunk_frames: self.config.chunk_frames.max(1),
            idle_poll: self.config.idle_poll(),
        };
        let handle = thread::Builder::new()
            .name("wavescope-stream".to_string())
            .spawn(move || worker.run())?;

        self.transport.set_position(0);
        self.events.emit_lossy(PlayerEvent::position(0));

        self.session = Some(Session {
            source,
            frame_count,
            output,
            flush,
            shutdown,
            failed,
            worker: Some(handle),
        });
        Ok(())
    }

    /// Tear down the current session: stop the streaming thread, stop the
    /// output stream, drop the file. Reachable from any state; a new
    /// `open` is required before transport controls do anything again.
    pub fn close(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        info!("closing playback session");

        session.shutdown.store(true, Ordering::Release);
        if let Some(worker) = session.worker.take() {
            if worker.join().is_err() {
                warn!("streaming thread panicked");
            }
        }
        if let Err(e) = session.output.stop() {
            warn!("failed to stop output stream: {}", e);
        }

        self.audio_expected.store(false, Ordering::Release);
        let old = self.transport.set_status(PlaybackState::Stopped);
        // Worker is joined; the transport has a single writer again
        self.transport.set_position(0);
        self.publish_state(old, PlaybackState::Stopped);
    }

    /// Start or resume playback. No-op while nothing is open.
    pub fn play(&mut self) {
        let failed = match &self.session {
            None => {
                debug!("play ignored: no open session");
                return;
            }
            Some(session) => session.failed.load(Ordering::Acquire),
        };
        if failed {
            warn!("play ignored: session failed earlier, tearing down");
            self.close();
            return;
        }

        self.audio_expected.store(true, Ordering::Release);
        let old = self.transport.set_status(PlaybackState::Playing);
        self.publish_state(old, PlaybackState::Playing);
    }

    /// Pause playback, keeping the position for an exact resume.
    pub fn pause(&mut self) {
        if self.session.is_none() || self.transport.status() != PlaybackState::Playing {
            return;
        }
        self.audio_expected.store(false, Ordering::Release);
        let old = self.transport.set_status(PlaybackState::Paused);
        self.publish_state(old, PlaybackState::Paused);
    }

    /// Stop playback and reset the position to frame 0.
    ///
    /// The reset position is published before this method returns, so the
    /// marker snaps back without waiting for the streaming loop.
    pub fn stop(&mut self) {
        let Some(session) = &self.session else {
            return;
        };

        self.audio_expected.store(false, Ordering::Release);
        let old = self.transport.set_status(PlaybackState::Stopped);
        {
            let mut source = lock_source(&session.source);
            if let Err(e) = source.seek(0) {
                warn!("failed to rewind on stop: {}", e);
            }
            self.transport.set_position(0);
        }
        session.flush.request();

        self.publish_state(old, PlaybackState::Stopped);
        self.events.emit_lossy(PlayerEvent::position(0));
    }

    /// Reposition playback, clamping into `[0, frame_count]`.
    ///
    /// Valid in any state, including while playing: the cursor moves under
    /// the same lock the streaming loop reads with, and buffered stale
    /// audio is flushed, so the next audible chunk starts at the new
    /// position. Returns the clamped frame.
    pub fn seek(&mut self, position_frames: u64) -> Result<u64> {
        let Some(session) = &self.session else {
            return Ok(0);
        };

        let clamped = {
            let mut source = lock_source(&session.source);
            let clamped = source.seek(position_frames)?;
            self.transport.set_position(clamped);
            clamped
        };
        session.flush.request();

        self.events.emit_lossy(PlayerEvent::position(clamped));
        debug!("seek to frame {}", clamped);
        Ok(clamped)
    }

    /// Set the repeat flag; takes effect at the next end-of-file.
    pub fn set_repeat(&self, repeat: bool) {
        self.transport.set_repeat(repeat);
    }

    pub fn repeat(&self) -> bool {
        self.transport.repeat()
    }

    /// Current playback position in frames (lock-free).
    pub fn position(&self) -> u64 {
        self.transport.position()
    }

    pub fn status(&self) -> PlaybackState {
        self.transport.status()
    }

    /// Whether a file is currently open for playback.
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Frame count of the open source, 0 when nothing is open.
    pub fn frame_count(&self) -> u64 {
        self.session.as_ref().map(|s| s.frame_count).unwrap_or(0)
    }

    fn publish_state(&self, old_state: PlaybackState, new_state: PlaybackState) {
        if old_state != new_state {
            self.events
                .emit_lossy(PlayerEvent::state_change(old_state, new_state));
        }
    }
}

impl Default for PlaybackEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.close();
    }
}

enum Step {
    Chunk(Vec<AudioFrame>),
    EndOfFile,
    Failed(String),
}

enum WriteOutcome {
    Written,
    Shutdown,
    DeviceFailed,
}

/// State captured by the streaming thread.
struct StreamWorker {
    source: Arc<Mutex<WavSource>>,
    producer: AudioProducer,
    transport: Arc<SharedTransport>,
    events: EventBus,
    shutdown: Arc<AtomicBool>,
    device_error: Arc<AtomicBool>,
    failed: Arc<AtomicBool>,
    audio_expected: Arc<AtomicBool>,
    frame_count: u64,
    chunk_frames: usize,
    idle_poll: Duration,
}

impl StreamWorker {
    fn run(mut self) {
        debug!("streaming loop started");

        loop {
            if self.shutdown.load(Ordering::Acquire) {
                break;
            }
            if self.device_error.swap(false, Ordering::SeqCst) {
                self.fail("output device reported a stream error");
                break;
            }
            if self.transport.status() != PlaybackState::Playing {
                thread::sleep(self.idle_poll);
                continue;
            }

            // Read one chunk with the cursor and position locked together,
            // so a concurrent seek is either fully before or fully after
            // this read.
            let step = {
                let mut source = lock_source(&self.source);
                match source.read_chunk(self.chunk_frames) {
                    Err(e) => Step::Failed(format!("source read failed: {}", e)),
                    Ok(frames) => {
                        if frames.len() < self.chunk_frames
                            || source.position() >= self.frame_count
                        {
                            match source.seek(0) {
                                Ok(_) => {
                                    self.transport.set_position(0);
                                    Step::EndOfFile
                                }
                                Err(e) => {
                                    Step::Failed(format!("rewind at end of file failed: {}", e))
                                }
                            }
                        } else {
                            self.transport.set_position(source.position());
                            Step::Chunk(frames)
                        }
                    }
                }
            };

            match step {
                Step::Failed(message) => {
                    self.fail(&message);
                    break;
                }
                Step::EndOfFile => self.handle_end_of_file(),
                Step::Chunk(frames) => match self.write_frames(frames) {
                    WriteOutcome::Written => {
                        // Re-read the shared position: a seek or stop may
                        // have moved it while this chunk was blocking
                        self.events
                            .emit_lossy(PlayerEvent::position(self.transport.position()));
                    }
                    WriteOutcome::Shutdown => break,
                    WriteOutcome::DeviceFailed => {
                        self.fail("output device reported a stream error");
                        break;
                    }
                },
            }
        }

        debug!("streaming loop exited");
    }

    fn handle_end_of_file(&self) {
        // An empty source cannot repeat; it would spin on zero-frame reads
        let repeat = self.transport.repeat() && self.frame_count > 0;
        let new_status = if repeat {
            PlaybackState::Playing
        } else {
            PlaybackState::Stopped
        };
        let old_status = self.transport.set_status(new_status);

        if repeat {
            debug!("end of file, repeating");
        } else {
            self.audio_expected.store(false, Ordering::Release);
            info!("end of file, stopping");
        }

        // Published even when repeat keeps the status Playing, so the
        // hosting UI can refresh its play/pause control
        self.events
            .emit_lossy(PlayerEvent::state_change(old_status, new_status));
        self.events.emit_lossy(PlayerEvent::position(0));
    }

    /// Push a chunk into the ring buffer.
    ///
    /// This is the loop's blocking device write: the buffer drains at
    /// real-time rate, so waiting for space paces the loop at roughly one
    /// chunk duration per iteration.
    fn write_frames(&mut self, frames: Vec<AudioFrame>) -> WriteOutcome {
        for frame in frames {
            loop {
                if self.shutdown.load(Ordering::Acquire) {
                    return WriteOutcome::Shutdown;
                }
                if self.device_error.swap(false, Ordering::SeqCst) {
                    return WriteOutcome::DeviceFailed;
                }
                if self.producer.push(frame) {
                    break;
                }
                thread::sleep(Duration::from_millis(1));
            }
        }
        WriteOutcome::Written
    }

    fn fail(&self, message: &str) {
        error!("streaming loop failure: {}", message);
        self.failed.store(true, Ordering::Release);
        self.audio_expected.store(false, Ordering::Release);

        let old = self.transport.set_status(PlaybackState::Stopped);
        if old != PlaybackState::Stopped {
            self.events
                .emit_lossy(PlayerEvent::state_change(old, PlaybackState::Stopped));
        }
        self.events.emit_lossy(PlayerEvent::error(message));
    }
}
