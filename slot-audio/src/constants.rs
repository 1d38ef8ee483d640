use core::time::Duration;

/// Interleaved channels per frame (stereo).
pub const CHANNELS: usize = 2;

/// Extra frames of guard space after each block in a ring slot.
pub const SLOT_HEADROOM_FRAMES: usize = 64;

/// Lower bound on the number of ring slots, whatever the requested latency.
pub const MIN_SLOT_COUNT: usize = 16;

/// Bytes per sample in the hardware format (signed 16-bit little-endian).
pub const BYTES_PER_SAMPLE: usize = 2;

/// How long teardown waits after stopping the queues before releasing the platform.
pub const DEFAULT_DRAIN_DELAY: Duration = Duration::from_millis(200);
