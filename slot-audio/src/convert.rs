//! Sample format conversion between the ring's `i16` blocks and `f32`.
//!
//! Ring blocks are interleaved stereo `i16` (`[L0, R0, L1, R1, ...]`). Effect
//! units work on the same interleaving in `f32`, normalized to `[-1.0, 1.0)`.
//!
//! ## Scaling
//!
//! `i16 -> f32` divides by 32768, so `i16::MIN` maps to exactly `-1.0`.
//! `f32 -> i16` multiplies by 32768, rounds to nearest and saturates, so
//! out-of-range input clips instead of wrapping.

const SCALE: f32 = 32768.0;

/// Convert `src` into normalized floats.
///
/// # Panics
///
/// Debug-asserts that both slices have the same length.
pub fn i16_to_f32(dest: &mut [f32], src: &[i16]) {
    debug_assert_eq!(dest.len(), src.len());

    for (d, &s) in dest.iter_mut().zip(src) {
        *d = s as f32 / SCALE;
    }
}

/// Convert normalized floats back to `i16`, saturating at the range limits.
///
/// NaN converts to silence.
///
/// # Panics
///
/// Debug-asserts that both slices have the same length.
pub fn f32_to_i16(dest: &mut [i16], src: &[f32]) {
    debug_assert_eq!(dest.len(), src.len());

    for (d, &s) in dest.iter_mut().zip(src) {
        // `as` saturates and maps NaN to 0.
        *d = (s * SCALE).round() as i16;
    }
}

/// Split an interleaved stereo buffer into separate left/right channels.
///
/// # Panics
///
/// Debug-asserts that `src` holds exactly `left.len()` frames.
pub fn deinterleave(src: &[i16], left: &mut [i16], right: &mut [i16]) {
    debug_assert_eq!(src.len(), left.len() * 2);
    debug_assert_eq!(left.len(), right.len());

    for (i, frame) in src.chunks_exact(2).enumerate() {
        left[i] = frame[0];
        right[i] = frame[1];
    }
}

/// Merge separate left/right channels into an interleaved stereo buffer.
///
/// # Panics
///
/// Debug-asserts that `dest` holds exactly `left.len()` frames.
pub fn interleave(dest: &mut [i16], left: &[i16], right: &[i16]) {
    debug_assert_eq!(dest.len(), left.len() * 2);
    debug_assert_eq!(left.len(), right.len());

    for (i, frame) in dest.chunks_exact_mut(2).enumerate() {
        frame[0] = left[i];
        frame[1] = right[i];
    }
}
