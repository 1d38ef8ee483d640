//! The audio I/O session: construction, lifecycle entry points, teardown.
//!
//! ## Usage
//!
//! ```ignore
//! let config = SessionConfig::default()
//!     .with_sample_rate(48_000)
//!     .with_block_frames(192)
//!     .with_capture(CaptureConfig::default())
//!     .with_latency_frames(384);
//!
//! // Duplex: the render context processes captured audio in place.
//! let session = Session::new(config, platform, |buf: &mut [i16], _frames, _rate| {
//!     for s in buf.iter_mut() {
//!         *s /= 2;
//!     }
//!     true
//! })?;
//!
//! // From the application's lifecycle hooks:
//! session.on_background();
//! session.on_foreground();
//! ```
//!
//! Queues are started at the end of [`Session::new`]. Dropping the session
//! stops them, waits out the configured drain delay so no hardware callback
//! is still in flight, closes the platform and finally frees the ring.

use std::sync::{Arc, Weak};

use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::io::{Engine, IoMode};
use crate::lifecycle::Directions;
use crate::platform::{AudioPlatform, IoCallbacks};
use crate::process::ProcessBlock;
use crate::ring::{FrameRing, RingGeometry};
use crate::stats::IoStatsSnapshot;

/// One configured audio engine instance.
///
/// Exclusively owns the ring buffer and the silence/pause bookkeeping; the
/// platform only ever sees [`QueueBlock`](crate::QueueBlock) handles.
pub struct Session<P: AudioPlatform, F: ProcessBlock + 'static> {
    engine: Arc<Engine<P, F>>,
    config: SessionConfig,
}

impl<P: AudioPlatform, F: ProcessBlock + 'static> Session<P, F> {
    /// Configure the platform, prime its queues and start them.
    ///
    /// A direction the platform fails to open is logged and left out; the
    /// session runs with whatever remains (possibly nothing, see
    /// [`IoMode::Idle`]).
    pub fn new(config: SessionConfig, platform: P, processor: F) -> Result<Self, SessionError> {
        config.validate()?;

        let geometry = RingGeometry::new(config.block_frames, config.latency_frames);
        let format = config.stream_format();

        let engine = Arc::new_cyclic(|weak: &Weak<Engine<P, F>>| {
            let callbacks: Weak<dyn IoCallbacks> = weak.clone();
            let mut directions = Directions::default();

            if let Some(capture) = &config.capture {
                let preset = capture.effective_preset();
                match platform.open_capture(format, preset, callbacks.clone()) {
                    Ok(()) => directions.capture = true,
                    Err(err) => warn!(error = %err, "capture stream unavailable, continuing without it"),
                }
            }
            if let Some(playback) = &config.playback {
                match platform.open_playback(format, playback.category, callbacks) {
                    Ok(()) => directions.playback = true,
                    Err(err) => warn!(error = %err, "playback stream unavailable, continuing without it"),
                }
            }

            Engine::new(
                platform,
                FrameRing::new(geometry),
                directions,
                config.sample_rate,
                processor,
            )
        });

        let ring = &engine.ring;
        if engine.directions.capture {
            engine.platform.enqueue_capture(ring.block(ring.write_index()));
        }
        if engine.directions.playback {
            engine.platform.enqueue_render(ring.silence());
        }

        let mode = engine.mode();
        if mode == IoMode::Idle {
            warn!("no audio direction could be opened; session is idle");
        }
        info!(
            sample_rate = config.sample_rate,
            block_frames = geometry.block_frames,
            latency_frames = geometry.latency_frames,
            slots = geometry.slot_count,
            ?mode,
            "audio session opened"
        );

        engine.lifecycle.start_queues(&engine.platform, engine.directions);
        Ok(Session { engine, config })
    }

    /// Start the hardware queues. No-op if already started.
    pub fn start(&self) {
        if self
            .engine
            .lifecycle
            .start_queues(&self.engine.platform, self.engine.directions)
        {
            debug!("audio queues started");
        }
    }

    /// Stop the hardware queues. No-op if already stopped.
    pub fn stop(&self) {
        if self
            .engine
            .lifecycle
            .stop_queues(&self.engine.platform, self.engine.directions)
        {
            debug!("audio queues stopped");
        }
    }

    /// The application became visible: mark foreground and (re)start the queues.
    pub fn on_foreground(&self) {
        self.engine.lifecycle.set_foreground(true);
        debug!("session in foreground");
        self.start();
    }

    /// The application went to the background.
    ///
    /// Queues keep running; they are stopped later by the silence policy once
    /// the user callback has produced more than a second of silence.
    pub fn on_background(&self) {
        self.engine.lifecycle.set_foreground(false);
        debug!("session in background");
    }

    pub fn is_started(&self) -> bool {
        self.engine.lifecycle.is_started()
    }

    pub fn is_foreground(&self) -> bool {
        self.engine.lifecycle.is_foreground()
    }

    pub fn has_capture(&self) -> bool {
        self.engine.directions.capture
    }

    pub fn has_playback(&self) -> bool {
        self.engine.directions.playback
    }

    pub fn mode(&self) -> IoMode {
        self.engine.mode()
    }

    pub fn geometry(&self) -> RingGeometry {
        *self.engine.ring.geometry()
    }

    pub fn ring(&self) -> &FrameRing {
        &self.engine.ring
    }

    /// Consecutive silent frames produced by the user callback.
    pub fn silence_frames(&self) -> usize {
        self.engine.lifecycle.silence_frames()
    }

    pub fn stats(&self) -> IoStatsSnapshot {
        self.engine.stats.snapshot()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn platform(&self) -> &P {
        &self.engine.platform
    }
}

impl<P: AudioPlatform, F: ProcessBlock + 'static> Drop for Session<P, F> {
    fn drop(&mut self) {
        self.stop();
        if !self.config.drain_delay.is_zero() {
            std::thread::sleep(self.config.drain_delay);
        }
        self.engine.platform.close();
        debug!("audio session closed");
    }
}
