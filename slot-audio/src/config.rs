//! Constructor-time configuration.
//!
//! A [`SessionConfig`] is consumed once by [`Session::new`](crate::Session::new);
//! nothing here can be changed while the session runs.
//!
//! ```ignore
//! let config = SessionConfig::default()
//!     .with_sample_rate(44_100)
//!     .with_block_frames(256)
//!     .with_capture(CaptureConfig::default())
//!     .with_latency_frames(1024);
//! ```

use core::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::constants::{CHANNELS, DEFAULT_DRAIN_DELAY};
use crate::error::SessionError;
use crate::ring::RingGeometry;

/// Recording preset applied to the capture stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RecordingPreset {
    Generic,
    Camcorder,
    /// Tuned for recognition: no AGC or noise suppression, so the lowest latency.
    VoiceRecognition,
    VoiceCommunication,
    Unprocessed,
}

/// Output stream category (routing and volume group) for the playback stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StreamCategory {
    Voice,
    System,
    Ring,
    Media,
    Alarm,
    Notification,
}

/// Capture direction settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CaptureConfig {
    /// `None` selects [`RecordingPreset::VoiceRecognition`].
    pub preset: Option<RecordingPreset>,
}

impl CaptureConfig {
    pub fn with_preset(preset: RecordingPreset) -> Self {
        Self { preset: Some(preset) }
    }

    /// The preset the platform is actually asked for.
    pub fn effective_preset(&self) -> RecordingPreset {
        self.preset.unwrap_or(RecordingPreset::VoiceRecognition)
    }
}

/// Playback direction settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlaybackConfig {
    /// `None` leaves the platform default untouched.
    pub category: Option<StreamCategory>,
}

impl PlaybackConfig {
    pub fn with_category(category: StreamCategory) -> Self {
        Self {
            category: Some(category),
        }
    }
}

/// Wire format handed to the platform for each opened direction.
///
/// Always interleaved stereo, signed 16-bit little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub block_frames: usize,
}

impl StreamFormat {
    /// Samples (not frames) in one hardware block.
    pub fn block_samples(&self) -> usize {
        self.block_frames * self.channels as usize
    }
}

/// Everything a [`Session`](crate::Session) needs at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SessionConfig {
    pub sample_rate: u32,
    /// Hardware block size in frames.
    pub block_frames: usize,
    pub capture: Option<CaptureConfig>,
    pub playback: Option<PlaybackConfig>,
    /// Requested end-to-end latency in frames; raised to one block if smaller.
    pub latency_frames: usize,
    /// Pause between stopping the queues and releasing the platform on drop.
    pub drain_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            block_frames: 256,
            capture: None,
            playback: Some(PlaybackConfig::default()),
            latency_frames: 256,
            drain_delay: DEFAULT_DRAIN_DELAY,
        }
    }
}

impl SessionConfig {
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_block_frames(mut self, block_frames: usize) -> Self {
        self.block_frames = block_frames;
        self
    }

    pub fn with_capture(mut self, capture: CaptureConfig) -> Self {
        self.capture = Some(capture);
        self
    }

    pub fn without_capture(mut self) -> Self {
        self.capture = None;
        self
    }

    pub fn with_playback(mut self, playback: PlaybackConfig) -> Self {
        self.playback = Some(playback);
        self
    }

    pub fn without_playback(mut self) -> Self {
        self.playback = None;
        self
    }

    pub fn with_latency_frames(mut self, latency_frames: usize) -> Self {
        self.latency_frames = latency_frames;
        self
    }

    pub fn with_drain_delay(mut self, drain_delay: Duration) -> Self {
        self.drain_delay = drain_delay;
        self
    }

    pub fn stream_format(&self) -> StreamFormat {
        StreamFormat {
            sample_rate: self.sample_rate,
            channels: CHANNELS as u16,
            block_frames: self.block_frames,
        }
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if self.sample_rate == 0 {
            return Err(SessionError::InvalidSampleRate);
        }
        if self.block_frames == 0 {
            return Err(SessionError::InvalidBlockSize);
        }
        if self.capture.is_none() && self.playback.is_none() {
            return Err(SessionError::NoDirections);
        }
        if RingGeometry::checked(self.block_frames, self.latency_frames).is_none() {
            return Err(SessionError::InvalidLatency);
        }
        Ok(())
    }
}
