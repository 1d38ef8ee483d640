//! Effect units and the adapter that chains one behind a processor.
//!
//! An [`Effect`] works on interleaved stereo `f32` frames. [`WithEffect`]
//! wraps any [`ProcessBlock`] and runs the effect on its output:
//!
//! ```text
//!   ring slot (i16) ─► inner.process ─► i16→f32 ─► effect.process ─► f32→i16 ─► ring slot
//! ```
//!
//! Scratch buffers are allocated once, in [`WithEffect::new`]. A block larger
//! than the scratch is processed in scratch-sized pieces, so the hardware
//! context never allocates.

use crate::constants::CHANNELS;
use crate::convert::{f32_to_i16, i16_to_f32};
use crate::process::ProcessBlock;

/// A stereo effect unit.
pub trait Effect: Send {
    fn enable(&mut self, enabled: bool);

    fn is_enabled(&self) -> bool;

    /// Called before the first block and whenever the stream rate changes.
    fn set_sample_rate(&mut self, sample_rate: u32);

    /// Clear internal state (delay lines, envelopes).
    fn reset(&mut self);

    /// Process `frames` interleaved stereo frames from `input` into `output`.
    ///
    /// Returns `true` if `output` holds audible signal. An effect with a tail
    /// may return `true` for silent input.
    fn process(&mut self, input: &[f32], output: &mut [f32], frames: usize) -> bool;
}

/// A [`ProcessBlock`] that runs `inner` and then the effect `effect`.
pub struct WithEffect<F, E> {
    inner: F,
    effect: E,
    input: Box<[f32]>,
    output: Box<[f32]>,
    sample_rate: Option<u32>,
}

impl<F: ProcessBlock, E: Effect> WithEffect<F, E> {
    /// Chain `effect` after `inner`, with scratch for `block_frames` frames.
    pub fn new(inner: F, effect: E, block_frames: usize) -> Self {
        let samples = block_frames.max(1) * CHANNELS;
        WithEffect {
            inner,
            effect,
            input: vec![0.0; samples].into_boxed_slice(),
            output: vec![0.0; samples].into_boxed_slice(),
            sample_rate: None,
        }
    }

    pub fn effect(&self) -> &E {
        &self.effect
    }

    pub fn effect_mut(&mut self) -> &mut E {
        &mut self.effect
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    pub fn into_parts(self) -> (F, E) {
        (self.inner, self.effect)
    }

    fn run_effect(&mut self, buffer: &mut [i16]) -> bool {
        let mut audible = false;
        for chunk in buffer.chunks_mut(self.input.len()) {
            let n = chunk.len();
            let input = &mut self.input[..n];
            let output = &mut self.output[..n];
            i16_to_f32(input, chunk);
            audible |= self.effect.process(input, output, n / CHANNELS);
            f32_to_i16(chunk, output);
        }
        audible
    }
}

impl<F: ProcessBlock, E: Effect> ProcessBlock for WithEffect<F, E> {
    fn process(&mut self, buffer: &mut [i16], frames: usize, sample_rate: u32) -> bool {
        if self.sample_rate != Some(sample_rate) {
            self.effect.set_sample_rate(sample_rate);
            self.sample_rate = Some(sample_rate);
        }

        let produced = self.inner.process(buffer, frames, sample_rate);
        if !self.effect.is_enabled() {
            return produced;
        }
        if !produced {
            // Feed the tail with silence, not with stale slot contents.
            buffer.fill(0);
        }
        let audible = self.run_effect(buffer);
        produced || audible
    }
}
