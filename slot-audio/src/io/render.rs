//! Render block requests.
//!
//! Every request ends with exactly one block handed to the render queue:
//! either a ring slot or the shared silence block. Which slot, and who fills
//! it, depends on the mode.
//!
//! **Duplex.** The slot at `read_index` holds captured audio. Once enough is
//! buffered to meet the latency target, the user callback processes it in
//! place and it is played. Otherwise this is an underrun: silence is played
//! and `read_index` stays put, so the shortfall heals as capture catches up.
//!
//! **Playback only.** The handler produces eagerly: the user callback fills
//! the slot at `write_index`, which is then published. If the ring still holds
//! less than the latency target of generated audio, silence is played instead
//! and the generated slot waits in the ring for a later cycle.
//!
//! In both modes a callback that reports no output gets its slot zeroed and
//! counted toward the background silence policy, which stops the queues after
//! more than one second of silence while the application is backgrounded.

use crate::platform::AudioPlatform;
use crate::process::ProcessBlock;

use super::Engine;

impl<P: AudioPlatform, F: ProcessBlock> Engine<P, F> {
    pub(crate) fn on_render_request(&self) {
        let ring = &self.ring;
        let geometry = ring.geometry();
        self.stats.render_block();

        let read = ring.read_index();
        let write = ring.write_index();
        let available = ring.available(write, read);

        let output = if self.directions.capture {
            if geometry.latency_met(available) {
                // SAFETY: duplex mode, so this is the delivery context and the
                // sole owner of `read_index`; available >= 1 keeps `read` clear
                // of the slot being captured into.
                unsafe { self.deliver_or_silence(read) };
                Some(read)
            } else {
                None
            }
        } else {
            // SAFETY: playback-only mode, so this context owns both indices
            // and every slot outside the one last handed to the render queue.
            unsafe { self.deliver_or_silence(write) };
            ring.publish_write(ring.advance(write));

            if (available + 1) * geometry.block_frames < geometry.latency_frames {
                None
            } else {
                Some(read)
            }
        };

        let block = match output {
            Some(slot) => {
                ring.publish_read(ring.advance(slot));
                ring.block(slot)
            }
            None => {
                self.stats.underrun();
                ring.silence()
            }
        };
        self.platform.enqueue_render(block);

        if self.lifecycle.suspend_due(self.sample_rate) {
            self.stats.auto_suspend();
            self.lifecycle.stop_queues(&self.platform, self.directions);
        }
    }
}
