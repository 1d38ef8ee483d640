//! In-memory platform subsystem.
//!
//! [`SimPlatform`] stands in for the OS audio queues: the caller plays the
//! part of the hardware by pushing captured blocks with
//! [`capture_block`](SimPlatform::capture_block) and pulling rendered blocks
//! with [`render_block`](SimPlatform::render_block). Each call consumes the
//! block currently enqueued for that direction and fires the matching
//! callback, exactly like a one-deep hardware buffer queue.
//!
//! It records everything the session asks of it (running state, transitions,
//! every render submission) so tests can assert on the session's behaviour.
//! Internally it takes a short lock per call; it is a test double, not a
//! realtime implementation.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::config::{RecordingPreset, StreamCategory, StreamFormat};
use crate::error::PlatformError;
use crate::platform::{AudioPlatform, IoCallbacks};
use crate::ring::QueueBlock;

#[derive(Default)]
struct SimState {
    callbacks: Option<Weak<dyn IoCallbacks>>,
    format: Option<StreamFormat>,
    preset: Option<RecordingPreset>,
    category: Option<StreamCategory>,
    capture_open: bool,
    playback_open: bool,
    capture_running: bool,
    playback_running: bool,
    capture_pending: Option<QueueBlock>,
    render_pending: Option<QueueBlock>,
    transitions: usize,
    render_history: Vec<Option<usize>>,
    closed: bool,
}

/// Simulated two-queue audio device.
#[derive(Default)]
pub struct SimPlatform {
    state: Mutex<SimState>,
    capture_failure: Option<PlatformError>,
    playback_failure: Option<PlatformError>,
}

impl SimPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `open_capture` fail with `err`.
    pub fn with_capture_failure(mut self, err: PlatformError) -> Self {
        self.capture_failure = Some(err);
        self
    }

    /// Make `open_playback` fail with `err`.
    pub fn with_playback_failure(mut self, err: PlatformError) -> Self {
        self.playback_failure = Some(err);
        self
    }

    /// Deliver one hardware capture block.
    ///
    /// Copies `samples` into the pending capture block (truncating or leaving
    /// the tail untouched if lengths differ) and fires `capture_complete`.
    /// Returns `false` without doing anything if capture is stopped or nothing
    /// is enqueued.
    pub fn capture_block(&self, samples: &[i16]) -> bool {
        let (block, callbacks) = {
            let mut state = self.state.lock();
            if !state.capture_running {
                return false;
            }
            let Some(block) = state.capture_pending.take() else {
                return false;
            };
            (block, state.callbacks.clone())
        };

        // SAFETY: the block was handed over by `enqueue_capture` and the
        // session only touches it again after `capture_complete`.
        let dst = unsafe { block.as_mut_slice() };
        let n = dst.len().min(samples.len());
        dst[..n].copy_from_slice(&samples[..n]);

        fire(callbacks, |cb| cb.capture_complete());
        true
    }

    /// Consume one hardware render block.
    ///
    /// Copies the pending render block into `out` and fires `render_request`.
    /// Returns `false` without doing anything if playback is stopped or
    /// nothing is enqueued.
    pub fn render_block(&self, out: &mut [i16]) -> bool {
        let (block, callbacks) = {
            let mut state = self.state.lock();
            if !state.playback_running {
                return false;
            }
            let Some(block) = state.render_pending.take() else {
                return false;
            };
            (block, state.callbacks.clone())
        };

        // SAFETY: render blocks are not written by the session until the
        // next render request, which has not been fired yet.
        let src = unsafe { block.as_slice() };
        let n = src.len().min(out.len());
        out[..n].copy_from_slice(&src[..n]);

        fire(callbacks, |cb| cb.render_request());
        true
    }

    pub fn pending_capture(&self) -> Option<QueueBlock> {
        self.state.lock().capture_pending
    }

    pub fn pending_render(&self) -> Option<QueueBlock> {
        self.state.lock().render_pending
    }

    pub fn is_capture_running(&self) -> bool {
        self.state.lock().capture_running
    }

    pub fn is_playback_running(&self) -> bool {
        self.state.lock().playback_running
    }

    pub fn is_capture_open(&self) -> bool {
        self.state.lock().capture_open
    }

    pub fn is_playback_open(&self) -> bool {
        self.state.lock().playback_open
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Number of `set_*_running` calls received.
    pub fn transitions(&self) -> usize {
        self.state.lock().transitions
    }

    /// Slot of every block handed to the render queue, `None` for silence.
    pub fn render_history(&self) -> Vec<Option<usize>> {
        self.state.lock().render_history.clone()
    }

    pub fn format(&self) -> Option<StreamFormat> {
        self.state.lock().format
    }

    pub fn preset(&self) -> Option<RecordingPreset> {
        self.state.lock().preset
    }

    pub fn category(&self) -> Option<StreamCategory> {
        self.state.lock().category
    }
}

fn fire(callbacks: Option<Weak<dyn IoCallbacks>>, f: impl FnOnce(&dyn IoCallbacks)) {
    let callbacks: Option<Arc<dyn IoCallbacks>> = callbacks.and_then(|weak| weak.upgrade());
    if let Some(callbacks) = callbacks {
        f(callbacks.as_ref());
    }
}

impl AudioPlatform for SimPlatform {
    fn open_capture(
        &self,
        format: StreamFormat,
        preset: RecordingPreset,
        callbacks: Weak<dyn IoCallbacks>,
    ) -> Result<(), PlatformError> {
        if let Some(err) = &self.capture_failure {
            return Err(err.clone());
        }
        let mut state = self.state.lock();
        state.format = Some(format);
        state.preset = Some(preset);
        state.capture_open = true;
        state.callbacks = Some(callbacks);
        Ok(())
    }

    fn open_playback(
        &self,
        format: StreamFormat,
        category: Option<StreamCategory>,
        callbacks: Weak<dyn IoCallbacks>,
    ) -> Result<(), PlatformError> {
        if let Some(err) = &self.playback_failure {
            return Err(err.clone());
        }
        let mut state = self.state.lock();
        state.format = Some(format);
        state.category = category;
        state.playback_open = true;
        state.callbacks = Some(callbacks);
        Ok(())
    }

    fn enqueue_capture(&self, block: QueueBlock) {
        self.state.lock().capture_pending = Some(block);
    }

    fn enqueue_render(&self, block: QueueBlock) {
        let mut state = self.state.lock();
        state.render_history.push(block.slot());
        state.render_pending = Some(block);
    }

    fn set_capture_running(&self, running: bool) {
        let mut state = self.state.lock();
        state.capture_running = running;
        state.transitions += 1;
    }

    fn set_playback_running(&self, running: bool) {
        let mut state = self.state.lock();
        state.playback_running = running;
        state.transitions += 1;
    }

    fn close(&self) {
        let mut state = self.state.lock();
        state.capture_running = false;
        state.playback_running = false;
        state.capture_pending = None;
        state.render_pending = None;
        state.callbacks = None;
        state.closed = true;
    }
}
