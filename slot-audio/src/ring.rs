//! Fixed-capacity slot ring shared by the capture and render handlers.
//!
//! The ring is one flat arena of `slot_count` slots, each `slot_step` samples
//! long (one hardware block plus [`SLOT_HEADROOM_FRAMES`] of guard space,
//! interleaved stereo). Slots are only ever addressed by index through
//! [`FrameRing::block`]; no call site computes offsets itself.
//!
//! ```text
//!  read_index            write_index
//!      │                      │
//!  ┌───▼──┬──────┬──────┬─────▼┬──────┬─────┐
//!  │ s0   │ s1   │ s2   │ s3   │ ...  │ sN-1│   N = slot_count
//!  └──────┴──────┴──────┴──────┴──────┴─────┘
//!   ◄──── available = 3 ────►
//! ```
//!
//! # Index discipline
//!
//! `write_index` and `read_index` are atomics with a single writer each at any
//! time. Which context owns which index depends on the session mode:
//!
//! | Mode | `write_index` owner | `read_index` owner |
//! |------|---------------------|--------------------|
//! | capture only | capture handler | capture handler |
//! | playback only | render handler | render handler |
//! | duplex | capture handler | render handler |
//!
//! The owner publishes with `Release`; the other side observes with `Acquire`.
//! The number of unread slots is always recomputed from both indices.

use core::cell::UnsafeCell;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::constants::{BYTES_PER_SAMPLE, CHANNELS, MIN_SLOT_COUNT, SLOT_HEADROOM_FRAMES};

/// Slot sizing derived from the block size and the requested latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingGeometry {
    /// Frames per hardware block.
    pub block_frames: usize,
    /// Effective latency target, never below one block.
    pub latency_frames: usize,
    /// Number of slots in the ring.
    pub slot_count: usize,
    /// Samples per slot, headroom included.
    pub slot_step: usize,
}

impl RingGeometry {
    /// Apply the sizing policy.
    ///
    /// Twice the minimal slot count absorbs a full cycle of producer/consumer
    /// phase jitter; [`MIN_SLOT_COUNT`] keeps tiny latencies from starving the ring.
    pub fn new(block_frames: usize, requested_latency_frames: usize) -> Self {
        debug_assert!(block_frames > 0, "block size must be non-zero");
        let latency_frames = requested_latency_frames.max(block_frames);
        let slot_count = ((latency_frames / block_frames) * 2).max(MIN_SLOT_COUNT);
        RingGeometry {
            block_frames,
            latency_frames,
            slot_count,
            slot_step: (block_frames + SLOT_HEADROOM_FRAMES) * CHANNELS,
        }
    }

    /// [`new`](Self::new) with overflow checks, including the arena length.
    ///
    /// Returns `None` if `block_frames` is zero or any size would overflow `usize`.
    pub fn checked(block_frames: usize, requested_latency_frames: usize) -> Option<Self> {
        if block_frames == 0 {
            return None;
        }
        let latency_frames = requested_latency_frames.max(block_frames);
        let slot_count = (latency_frames / block_frames)
            .checked_mul(2)?
            .max(MIN_SLOT_COUNT);
        let slot_step = block_frames
            .checked_add(SLOT_HEADROOM_FRAMES)?
            .checked_mul(CHANNELS)?;
        slot_count.checked_mul(slot_step)?;
        Some(RingGeometry {
            block_frames,
            latency_frames,
            slot_count,
            slot_step,
        })
    }

    /// Samples in one hardware block.
    pub fn block_samples(&self) -> usize {
        self.block_frames * CHANNELS
    }

    /// Whether `available` buffered slots satisfy the latency target.
    pub fn latency_met(&self, available: usize) -> bool {
        available * self.block_frames >= self.latency_frames
    }
}

/// Number of unread slots between two indices, normalized into `[0, slot_count)`.
pub fn wrapped_available(write_index: usize, read_index: usize, slot_count: usize) -> usize {
    if write_index >= read_index {
        write_index - read_index
    } else {
        write_index + slot_count - read_index
    }
}

/// Handle to one block of ring memory (or the silence block) handed to the platform.
///
/// Covers exactly one hardware block (`block_frames * 2` samples), not the slot
/// headroom. The handle stays valid for as long as the owning
/// [`Session`](crate::Session) is alive; sessions stop their queues and wait
/// out a drain delay before the memory is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueBlock {
    ptr: NonNull<i16>,
    len: usize,
    slot: Option<usize>,
}

// SAFETY: A QueueBlock is an address plus a length. Access to the memory
// behind it is governed by the unsafe accessors below and the queue protocol.
unsafe impl Send for QueueBlock {}
unsafe impl Sync for QueueBlock {}

impl QueueBlock {
    /// Ring slot this block belongs to, `None` for the silence block.
    pub fn slot(&self) -> Option<usize> {
        self.slot
    }

    pub fn is_silence(&self) -> bool {
        self.slot.is_none()
    }

    /// Length in samples.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn frames(&self) -> usize {
        self.len / CHANNELS
    }

    /// Length in bytes of the 16-bit wire format.
    pub fn byte_len(&self) -> usize {
        self.len * BYTES_PER_SAMPLE
    }

    /// View the block as samples.
    ///
    /// # Safety
    ///
    /// The owning session must still be alive, and no other context may be
    /// writing this block for the lifetime of the returned slice.
    pub unsafe fn as_slice<'a>(&self) -> &'a [i16] {
        core::slice::from_raw_parts(self.ptr.as_ptr(), self.len)
    }

    /// Mutable view, for a platform filling a capture block.
    ///
    /// # Safety
    ///
    /// As for [`as_slice`](Self::as_slice), and the block must have been handed
    /// over through a capture enqueue. Render blocks (and the silence block in
    /// particular) are read-only.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn as_mut_slice<'a>(&self) -> &'a mut [i16] {
        core::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len)
    }
}

/// The slot arena, the pre-zeroed silence block and the two ring indices.
///
/// Nothing allocates after [`FrameRing::new`].
pub struct FrameRing {
    geometry: RingGeometry,
    arena: Box<[UnsafeCell<i16>]>,
    silence: Box<[UnsafeCell<i16>]>,
    write_index: AtomicUsize,
    read_index: AtomicUsize,
}

// SAFETY: The indices are atomics with one writer each (see the module docs).
// Slot memory is touched by at most one context at a time: the producer side
// only writes the slot at `write_index`, the consumer side only reads or
// processes the slot at `read_index`, and the two differ whenever the consumer
// is allowed to proceed.
unsafe impl Sync for FrameRing {}

impl FrameRing {
    pub fn new(geometry: RingGeometry) -> Self {
        let zeroed = |len: usize| -> Box<[UnsafeCell<i16>]> {
            (0..len).map(|_| UnsafeCell::new(0)).collect()
        };
        FrameRing {
            arena: zeroed(geometry.slot_count * geometry.slot_step),
            silence: zeroed(geometry.slot_step),
            geometry,
            write_index: AtomicUsize::new(0),
            read_index: AtomicUsize::new(0),
        }
    }

    pub fn geometry(&self) -> &RingGeometry {
        &self.geometry
    }

    pub fn slot_count(&self) -> usize {
        self.geometry.slot_count
    }

    /// Next index after `index`, wrapping at the slot count.
    #[inline]
    pub fn advance(&self, index: usize) -> usize {
        if index + 1 < self.geometry.slot_count {
            index + 1
        } else {
            0
        }
    }

    #[inline]
    pub fn available(&self, write_index: usize, read_index: usize) -> usize {
        wrapped_available(write_index, read_index, self.geometry.slot_count)
    }

    #[inline]
    pub fn write_index(&self) -> usize {
        self.write_index.load(Ordering::Acquire)
    }

    #[inline]
    pub fn read_index(&self) -> usize {
        self.read_index.load(Ordering::Acquire)
    }

    /// Slots currently holding unread data.
    pub fn buffered(&self) -> usize {
        self.available(self.write_index(), self.read_index())
    }

    /// Publish a new write position. Only the current `write_index` owner may call this.
    #[inline]
    pub(crate) fn publish_write(&self, index: usize) {
        self.write_index.store(index, Ordering::Release);
    }

    /// Publish a new read position. Only the current `read_index` owner may call this.
    #[inline]
    pub(crate) fn publish_read(&self, index: usize) {
        self.read_index.store(index, Ordering::Release);
    }

    /// Handle to the block stored in slot `index`.
    ///
    /// # Panics
    ///
    /// If `index` is not below the slot count.
    pub fn block(&self, index: usize) -> QueueBlock {
        assert!(index < self.geometry.slot_count, "slot index out of range");
        // SAFETY: index * slot_step + block_samples <= arena length because
        // index < slot_count and block_samples < slot_step.
        let cell = unsafe { self.arena.as_ptr().add(index * self.geometry.slot_step) };
        let ptr = UnsafeCell::raw_get(cell);
        QueueBlock {
            // SAFETY: derived from a live boxed slice, never null.
            ptr: unsafe { NonNull::new_unchecked(ptr) },
            len: self.geometry.block_samples(),
            slot: Some(index),
        }
    }

    /// Handle to the shared, always-zero silence block.
    pub fn silence(&self) -> QueueBlock {
        let ptr = UnsafeCell::raw_get(self.silence.as_ptr());
        QueueBlock {
            // SAFETY: derived from a live boxed slice, never null.
            ptr: unsafe { NonNull::new_unchecked(ptr) },
            len: self.geometry.block_samples(),
            slot: None,
        }
    }

    /// Mutable samples of slot `index`.
    ///
    /// # Safety
    ///
    /// The caller must be the context that owns slot `index` right now (see
    /// the index discipline), and must not hold another reference into it.
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn block_mut(&self, index: usize) -> &mut [i16] {
        self.block(index).as_mut_slice()
    }

    /// Read-only samples of slot `index`.
    ///
    /// # Safety
    ///
    /// No context may be writing slot `index` while the slice is alive.
    pub unsafe fn block_samples(&self, index: usize) -> &[i16] {
        self.block(index).as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn geometry_one_block_latency() {
        let g = RingGeometry::new(256, 256);
        assert_eq!(g.latency_frames, 256);
        assert_eq!(g.slot_count, 16);
        assert_eq!(g.slot_step, (256 + 64) * 2);
        assert_eq!(g.block_samples(), 512);
        assert!(g.latency_met(1));
        assert!(!g.latency_met(0));
    }

    #[test]
    fn geometry_non_multiple_latency() {
        let g = RingGeometry::new(256, 1000);
        assert_eq!(g.latency_frames, 1000);
        assert_eq!(g.slot_count, 16);
        assert!(!g.latency_met(3));
        assert!(g.latency_met(4));
    }

    #[test]
    fn geometry_small_latency_raised_to_one_block() {
        let g = RingGeometry::new(480, 10);
        assert_eq!(g.latency_frames, 480);
        assert_eq!(g.slot_count, 16);
    }

    #[test]
    fn geometry_large_latency_doubles_slots() {
        let g = RingGeometry::new(256, 4096);
        assert_eq!(g.slot_count, 32);
    }

    #[test]
    fn available_across_wraparound() {
        let ring = FrameRing::new(RingGeometry::new(64, 64));
        let n = ring.slot_count();
        assert_eq!(ring.available(2, n - 1), 3);
        assert_eq!(ring.available(5, 5), 0);
        assert_eq!(ring.available(0, 1), n - 1);
        assert_eq!(ring.available(7, 3), 4);
    }

    #[test]
    fn advance_wraps_at_slot_count() {
        let ring = FrameRing::new(RingGeometry::new(64, 64));
        let n = ring.slot_count();
        assert_eq!(ring.advance(0), 1);
        assert_eq!(ring.advance(n - 2), n - 1);
        assert_eq!(ring.advance(n - 1), 0);
    }

    #[test]
    fn new_ring_starts_empty_and_zeroed() {
        let ring = FrameRing::new(RingGeometry::new(32, 32));
        assert_eq!(ring.write_index(), 0);
        assert_eq!(ring.read_index(), 0);
        assert_eq!(ring.buffered(), 0);
        for slot in 0..ring.slot_count() {
            let samples = unsafe { ring.block_samples(slot) };
            assert!(samples.iter().all(|&s| s == 0));
        }
        let silence = ring.silence();
        assert!(silence.is_silence());
        assert!(unsafe { silence.as_slice() }.iter().all(|&s| s == 0));
    }

    #[test]
    fn blocks_are_distinct_and_sized_to_one_hardware_block() {
        let ring = FrameRing::new(RingGeometry::new(32, 32));
        for slot in 0..ring.slot_count() {
            unsafe { ring.block_mut(slot) }.fill(slot as i16 + 1);
        }
        for slot in 0..ring.slot_count() {
            let block = ring.block(slot);
            assert_eq!(block.slot(), Some(slot));
            assert_eq!(block.len(), 64);
            assert_eq!(block.frames(), 32);
            assert_eq!(block.byte_len(), 128);
            assert!(unsafe { block.as_slice() }.iter().all(|&s| s == slot as i16 + 1));
        }
        assert_ne!(ring.block(0), ring.block(1));
        assert_ne!(ring.block(0), ring.silence());
    }

    #[test]
    #[should_panic(expected = "slot index out of range")]
    fn block_rejects_out_of_range_index() {
        let ring = FrameRing::new(RingGeometry::new(32, 32));
        let _ = ring.block(ring.slot_count());
    }

    #[test]
    fn published_indices_are_observed() {
        let ring = FrameRing::new(RingGeometry::new(32, 32));
        ring.publish_write(5);
        ring.publish_read(2);
        assert_eq!(ring.buffered(), 3);
    }

    #[test]
    fn checked_geometry_rejects_overflow() {
        assert_eq!(RingGeometry::checked(256, 1000), Some(RingGeometry::new(256, 1000)));
        assert_eq!(RingGeometry::checked(0, 256), None);
        assert_eq!(RingGeometry::checked(1, usize::MAX), None);
        assert_eq!(RingGeometry::checked(usize::MAX, 0), None);
        assert_eq!(RingGeometry::checked(usize::MAX / 4, 0), None);
    }

    proptest! {
        #[test]
        fn available_always_in_range(
            block_frames in 1usize..2048,
            latency in 0usize..5_000,
            steps in proptest::collection::vec(any::<bool>(), 0..400),
        ) {
            let ring = FrameRing::new(RingGeometry::new(block_frames, latency));
            let n = ring.slot_count();
            let (mut w, mut r) = (0usize, 0usize);
            let mut expected = 0usize;
            for produce in steps {
                if produce {
                    // Keep the producer from lapping the consumer.
                    if expected + 1 < n {
                        w = ring.advance(w);
                        expected += 1;
                    }
                } else if expected > 0 {
                    r = ring.advance(r);
                    expected -= 1;
                }
                let available = ring.available(w, r);
                prop_assert!(available < n);
                prop_assert_eq!(available, expected);
            }
        }

        #[test]
        fn geometry_policy_holds(block_frames in 1usize..4096, latency in 0usize..100_000) {
            let g = RingGeometry::new(block_frames, latency);
            prop_assert!(g.latency_frames >= block_frames);
            prop_assert!(g.slot_count >= MIN_SLOT_COUNT);
            prop_assert!(g.slot_count >= 2 * (g.latency_frames / block_frames));
            prop_assert!(g.slot_step > g.block_samples());
        }
    }
}
