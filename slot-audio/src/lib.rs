//! # slot-audio
//!
//! An audio I/O engine that bridges the operating system's capture and render
//! hardware callbacks to a single user processing routine, through a
//! fixed-capacity, lock-free ring of sample slots.
//!
//! The application supplies one [`ProcessBlock`] and asks for capture,
//! playback or both. Depending on which directions actually open, the user
//! routine either consumes captured audio, generates output, or transforms
//! captured audio into output in place. A configurable latency target decides
//! how many blocks are buffered before audio flows.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Memory | [`ring`] | Slot arena, sizing policy, `write_index`/`read_index` |
//! | Handlers | [`io`] | Capture completion and render request handlers |
//! | Control | [`lifecycle`] / [`session`] | Start/stop, foreground/background, teardown |
//! | Seams | [`platform`] / [`process`] | OS audio subsystem and user callback traits |
//! | Effects | [`effect`] / [`convert`] | Float effect units chained after the user routine |
//! | Support | [`stats`] / [`sim`] / [`wav`] | Counters, in-memory platform, PCM files |
//!
//! ## Quick start
//!
//! ```ignore
//! use slot_audio::{CaptureConfig, Session, SessionConfig, SimPlatform};
//!
//! let config = SessionConfig::default()
//!     .with_sample_rate(48_000)
//!     .with_block_frames(240)
//!     .with_capture(CaptureConfig::default())
//!     .with_latency_frames(480);
//!
//! // Duplex passthrough at half volume.
//! let session = Session::new(config, SimPlatform::new(), |buf: &mut [i16], _frames, _rate| {
//!     buf.iter_mut().for_each(|s| *s /= 2);
//!     true
//! })?;
//!
//! // Application lifecycle hooks:
//! session.on_background();
//! session.on_foreground();
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `wav` | yes | [`wav`] module (16-bit PCM files via `hound`) |
//! | `serde` | no | `Serialize`/`Deserialize` on config and stats types |
//!
//! ## Audio parameters
//!
//! - **Sample format:** `i16`, interleaved stereo ([`constants::CHANNELS`])
//! - **Slot headroom:** [`constants::SLOT_HEADROOM_FRAMES`] frames per slot
//! - **Minimum ring size:** [`constants::MIN_SLOT_COUNT`] slots

pub mod constants;
pub mod config;
pub mod error;
pub mod ring;
pub mod process;
pub mod platform;
pub mod lifecycle;
pub mod io;
pub mod stats;
pub mod session;
pub mod effect;
pub mod convert;
pub mod sim;

#[cfg(feature = "wav")]
pub mod wav;

pub use config::{
    CaptureConfig, PlaybackConfig, RecordingPreset, SessionConfig, StreamCategory, StreamFormat,
};
pub use effect::{Effect, WithEffect};
pub use error::{PlatformError, SessionError};
pub use io::IoMode;
pub use platform::{AudioPlatform, IoCallbacks};
pub use process::ProcessBlock;
pub use ring::{FrameRing, QueueBlock, RingGeometry};
pub use session::Session;
pub use sim::SimPlatform;
pub use stats::IoStatsSnapshot;

#[cfg(feature = "wav")]
pub use error::PcmError;
