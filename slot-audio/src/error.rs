//! Error types for session construction and the platform seam.
//!
//! Runtime conditions inside the hardware callbacks (underrun, a silent user
//! callback, a redundant start or stop) are not errors and never show up here.

use thiserror::Error;

/// Configuration rejected by [`Session::new`](crate::Session::new).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("sample rate must be non-zero")]
    InvalidSampleRate,

    #[error("block size must be at least one frame")]
    InvalidBlockSize,

    #[error("neither capture nor playback was requested")]
    NoDirections,

    #[error("block size or latency too large to size the ring")]
    InvalidLatency,
}

/// Failure reported by an [`AudioPlatform`](crate::AudioPlatform) while opening a stream direction.
///
/// The session logs it and carries on without that direction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("stream configuration rejected: {0}")]
    Configuration(String),

    #[error("platform error code {0}")]
    Code(i32),
}

/// Failure reading or writing a PCM container file.
#[cfg(feature = "wav")]
#[derive(Error, Debug)]
pub enum PcmError {
    #[error(transparent)]
    Wav(#[from] hound::Error),

    #[error("unsupported sample format: {bits} bits {format}")]
    UnsupportedFormat { bits: u16, format: &'static str },

    #[error("channel count must be non-zero")]
    NoChannels,

    #[error("{samples} samples is not a whole number of {channels}-channel frames")]
    PartialFrame { samples: usize, channels: u16 },
}
