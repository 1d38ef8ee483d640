//! Hardware callback handlers.
//!
//! The platform calls [`IoCallbacks::capture_complete`] once per filled
//! capture block and [`IoCallbacks::render_request`] once per render block it
//! needs. Both handlers touch only the ring, its indices, the lifecycle flags
//! and the stats counters; neither blocks, allocates nor logs.
//!
//! ## Who drives the user callback
//!
//! | [`IoMode`] | Capture handler | Render handler |
//! |------------|-----------------|----------------|
//! | `CaptureOnly` | advances write, delivers `read` slot, advances read | not called |
//! | `PlaybackOnly` | not called | generates into `write` slot, plays `read` slot |
//! | `Duplex` | advances write only | processes `read` slot in place and plays it |
//!
//! Duplex is pull-driven: captured data only ever reaches the user callback
//! through the render handler.

pub mod capture;
pub mod render;

use core::cell::UnsafeCell;

use crate::lifecycle::{Directions, Lifecycle};
use crate::platform::{AudioPlatform, IoCallbacks};
use crate::process::ProcessBlock;
use crate::ring::FrameRing;
use crate::stats::IoStats;


#[cfg(test)]
mod proptests;

/// Operating mode, derived from the directions that actually opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoMode {
    CaptureOnly,
    PlaybackOnly,
    Duplex,
    /// No direction could be opened; the session never delivers audio.
    Idle,
}

impl From<Directions> for IoMode {
    fn from(dirs: Directions) -> Self {
        match (dirs.capture, dirs.playback) {
            (true, true) => IoMode::Duplex,
            (true, false) => IoMode::CaptureOnly,
            (false, true) => IoMode::PlaybackOnly,
            (false, false) => IoMode::Idle,
        }
    }
}

/// State shared between the session and the platform's hardware contexts.
pub(crate) struct Engine<P, F> {
    pub(crate) platform: P,
    pub(crate) ring: FrameRing,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) stats: IoStats,
    pub(crate) directions: Directions,
    pub(crate) sample_rate: u32,
    processor: UnsafeCell<F>,
}

// SAFETY: Everything but `processor` is Sync on its own. The processor is
// only reached through `deliver`, which is called from exactly one hardware
// context per mode (capture context in CaptureOnly, render context otherwise),
// and the platform never re-enters a callback concurrently with itself.
unsafe impl<P: Sync, F: Send> Sync for Engine<P, F> {}

impl<P: AudioPlatform, F: ProcessBlock> Engine<P, F> {
    pub(crate) fn new(
        platform: P,
        ring: FrameRing,
        directions: Directions,
        sample_rate: u32,
        processor: F,
    ) -> Self {
        Engine {
            platform,
            ring,
            lifecycle: Lifecycle::new(),
            stats: IoStats::default(),
            directions,
            sample_rate,
            processor: UnsafeCell::new(processor),
        }
    }

    pub(crate) fn mode(&self) -> IoMode {
        self.directions.into()
    }

    /// Run the user callback on slot `index`.
    ///
    /// # Safety
    ///
    /// The caller must be the mode's delivery context and own slot `index`.
    unsafe fn deliver(&self, index: usize) -> bool {
        let frames = self.ring.geometry().block_frames;
        let buffer = self.ring.block_mut(index);
        let processor = &mut *self.processor.get();
        self.stats.delivery();
        processor.process(buffer, frames, self.sample_rate)
    }

    /// Run the user callback on slot `index`; zero the slot and count silence
    /// if it produced nothing.
    ///
    /// # Safety
    ///
    /// As for [`deliver`](Self::deliver).
    unsafe fn deliver_or_silence(&self, index: usize) {
        if self.deliver(index) {
            self.lifecycle.clear_silence();
        } else {
            self.ring.block_mut(index).fill(0);
            self.lifecycle.add_silence(self.ring.geometry().block_frames);
            self.stats.silent_block();
        }
    }
}

impl<P, F> IoCallbacks for Engine<P, F>
where
    P: AudioPlatform,
    F: ProcessBlock,
{
    fn capture_complete(&self) {
        self.on_capture_complete();
    }

    fn render_request(&self) {
        self.on_render_request();
    }
}
