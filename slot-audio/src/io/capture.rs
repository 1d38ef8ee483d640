//! Capture block completion.
//!
//! The capture queue always holds the slot at `write_index`. When the
//! hardware finishes filling it, this handler publishes that slot by
//! advancing `write_index` and re-arms the queue with the slot now at
//! `write_index`, so the hardware fills the ring one slot at a time:
//!
//! ```text
//!   before:  [..][ filled ◄w ][ next ][..]      queue: filled
//!   after:   [..][ filled    ][ next ◄w ][..]   queue: next
//! ```
//!
//! With no playback direction the handler also drives delivery: once the
//! buffered slots reach the latency target, each completion hands exactly one
//! slot (the one at `read_index`) to the user callback.

use crate::platform::AudioPlatform;
use crate::process::ProcessBlock;

use super::Engine;

impl<P: AudioPlatform, F: ProcessBlock> Engine<P, F> {
    pub(crate) fn on_capture_complete(&self) {
        let ring = &self.ring;
        self.stats.capture_block();

        let write = ring.advance(ring.write_index());
        ring.publish_write(write);
        self.platform.enqueue_capture(ring.block(write));

        // Duplex delivery belongs to the render handler.
        if self.directions.playback {
            return;
        }

        let read = ring.read_index();
        if ring.geometry().latency_met(ring.available(write, read)) {
            // SAFETY: capture-only mode, so this is the delivery context and
            // the sole owner of `read_index`; the slot at `read` differs from
            // the one the hardware is filling because available >= 1.
            unsafe {
                self.deliver(read);
            }
            ring.publish_read(ring.advance(read));
        }
    }
}
