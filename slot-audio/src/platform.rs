//! The seam to the operating system's audio subsystem.
//!
//! A platform owns two hardware buffer queues (capture and render) and the
//! execution contexts that service them. The session configures it once,
//! hands it a [`Weak`] reference to its [`IoCallbacks`], primes each queue
//! with one block, and from then on the platform calls back exactly once per
//! completed hardware block.
//!
//! ```text
//!   Platform capture ctx ──► IoCallbacks::capture_complete ──► enqueue_capture(next slot)
//!   Platform render ctx  ──► IoCallbacks::render_request   ──► enqueue_render(slot | silence)
//!   App thread           ──► Session::start/stop           ──► set_*_running
//! ```
//!
//! Device selection, format negotiation and teardown of OS handles live
//! entirely behind this trait.

use std::sync::Weak;

use crate::config::{RecordingPreset, StreamCategory, StreamFormat};
use crate::error::PlatformError;
use crate::ring::QueueBlock;

/// Entry points the platform invokes from its hardware contexts.
///
/// Each method is called from one context at a time; the platform never
/// re-enters a callback concurrently with itself.
pub trait IoCallbacks: Send + Sync {
    /// One capture block has been filled into the most recently enqueued capture block.
    fn capture_complete(&self);

    /// The render queue needs its next block.
    fn render_request(&self);
}

/// Platform audio subsystem consumed by a [`Session`](crate::Session).
///
/// All methods take `&self`: the enqueue and running-state methods are called
/// from hardware callback contexts as well as from the application thread.
/// `enqueue_*` and `set_*_running` must not block.
pub trait AudioPlatform: Send + Sync + 'static {
    /// Create and configure the capture queue.
    fn open_capture(
        &self,
        format: StreamFormat,
        preset: RecordingPreset,
        callbacks: Weak<dyn IoCallbacks>,
    ) -> Result<(), PlatformError>;

    /// Create and configure the render queue.
    fn open_playback(
        &self,
        format: StreamFormat,
        category: Option<StreamCategory>,
        callbacks: Weak<dyn IoCallbacks>,
    ) -> Result<(), PlatformError>;

    /// Hand a block to the capture queue; hardware fills it and then calls
    /// [`IoCallbacks::capture_complete`].
    fn enqueue_capture(&self, block: QueueBlock);

    /// Hand a block to the render queue; hardware plays it and then calls
    /// [`IoCallbacks::render_request`]. The block is read-only.
    fn enqueue_render(&self, block: QueueBlock);

    /// Set the capture stream's recording state.
    fn set_capture_running(&self, running: bool);

    /// Set the render stream's play state.
    fn set_playback_running(&self, running: bool);

    /// Destroy the queues and release OS handles. Called once, after the drain delay.
    fn close(&self);
}

/// Lets the application keep its own handle on a platform the session owns.
impl<T: AudioPlatform> AudioPlatform for std::sync::Arc<T> {
    fn open_capture(
        &self,
        format: StreamFormat,
        preset: RecordingPreset,
        callbacks: Weak<dyn IoCallbacks>,
    ) -> Result<(), PlatformError> {
        (**self).open_capture(format, preset, callbacks)
    }

    fn open_playback(
        &self,
        format: StreamFormat,
        category: Option<StreamCategory>,
        callbacks: Weak<dyn IoCallbacks>,
    ) -> Result<(), PlatformError> {
        (**self).open_playback(format, category, callbacks)
    }

    fn enqueue_capture(&self, block: QueueBlock) {
        (**self).enqueue_capture(block)
    }

    fn enqueue_render(&self, block: QueueBlock) {
        (**self).enqueue_render(block)
    }

    fn set_capture_running(&self, running: bool) {
        (**self).set_capture_running(running)
    }

    fn set_playback_running(&self, running: bool) {
        (**self).set_playback_running(running)
    }

    fn close(&self) {
        (**self).close()
    }
}
