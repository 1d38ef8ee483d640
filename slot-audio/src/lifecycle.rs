//! Started/foreground state and the background silence policy.
//!
//! ```text
//!            start() / construction / on_foreground()
//!   Stopped ─────────────────────────────────────────► Started
//!      ▲                                                  │
//!      └────── stop() / drop / background silence ────────┘
//! ```
//!
//! Both transitions are idempotent: the `started` flag is swapped atomically
//! and only the caller that actually flips it touches the hardware. The flags
//! are shared between the render context and the application thread.
//!
//! A stop from the render context can race a start from the application
//! thread. Whoever flips the flag applies it to the hardware and then re-reads
//! it; if it changed in the meantime the new value is applied again. The last
//! platform call therefore always matches the final value of `started`.

use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::platform::AudioPlatform;

/// Which hardware directions a session actually opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Directions {
    pub capture: bool,
    pub playback: bool,
}

impl Directions {
    pub fn any(&self) -> bool {
        self.capture || self.playback
    }
}

#[derive(Debug)]
pub struct Lifecycle {
    started: AtomicBool,
    foreground: AtomicBool,
    silence_frames: AtomicUsize,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    /// Stopped, in the foreground, with no silence counted.
    pub const fn new() -> Self {
        Lifecycle {
            started: AtomicBool::new(false),
            foreground: AtomicBool::new(true),
            silence_frames: AtomicUsize::new(0),
        }
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub fn is_foreground(&self) -> bool {
        self.foreground.load(Ordering::Acquire)
    }

    pub fn set_foreground(&self, foreground: bool) {
        self.foreground.store(foreground, Ordering::Release);
    }

    /// Start both queues unless already started. Returns `true` on a real transition.
    pub fn start_queues<P: AudioPlatform + ?Sized>(&self, platform: &P, dirs: Directions) -> bool {
        if self.started.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.apply(platform, dirs);
        true
    }

    /// Stop both queues unless already stopped. Returns `true` on a real transition.
    pub fn stop_queues<P: AudioPlatform + ?Sized>(&self, platform: &P, dirs: Directions) -> bool {
        if !self.started.swap(false, Ordering::AcqRel) {
            return false;
        }
        self.apply(platform, dirs);
        true
    }

    /// Drive the hardware to the current `started` value until it stops changing.
    fn apply<P: AudioPlatform + ?Sized>(&self, platform: &P, dirs: Directions) {
        let mut running = self.started.load(Ordering::Acquire);
        loop {
            if running {
                if dirs.capture {
                    platform.set_capture_running(true);
                }
                if dirs.playback {
                    platform.set_playback_running(true);
                }
            } else {
                if dirs.playback {
                    platform.set_playback_running(false);
                }
                if dirs.capture {
                    platform.set_capture_running(false);
                }
            }

            let now = self.started.load(Ordering::Acquire);
            if now == running {
                return;
            }
            running = now;
        }
    }

    /// Consecutive silent frames produced by the user callback.
    pub fn silence_frames(&self) -> usize {
        self.silence_frames.load(Ordering::Acquire)
    }

    pub(crate) fn add_silence(&self, frames: usize) {
        let current = self.silence_frames.load(Ordering::Relaxed);
        self.silence_frames
            .store(current.saturating_add(frames), Ordering::Release);
    }

    pub(crate) fn clear_silence(&self) {
        self.silence_frames.store(0, Ordering::Release);
    }

    /// Whether the background silence policy fires now.
    ///
    /// True when backgrounded with more than one second of silence counted;
    /// the counter is reset when it fires. Never fires in the foreground.
    pub(crate) fn suspend_due(&self, sample_rate: u32) -> bool {
        if self.is_foreground() {
            return false;
        }
        if self.silence_frames.load(Ordering::Relaxed) as u64 > u64::from(sample_rate) {
            self.clear_silence();
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RecordingPreset, StreamCategory, StreamFormat};
    use crate::error::PlatformError;
    use crate::platform::IoCallbacks;
    use crate::ring::QueueBlock;
    use crate::sim::SimPlatform;
    use std::sync::{Arc, Weak};

    const BOTH: Directions = Directions {
        capture: true,
        playback: true,
    };

    #[test]
    fn new_is_stopped_in_foreground() {
        let lc = Lifecycle::new();
        assert!(!lc.is_started());
        assert!(lc.is_foreground());
        assert_eq!(lc.silence_frames(), 0);
    }

    #[test]
    fn start_is_idempotent() {
        let platform = SimPlatform::new();
        let lc = Lifecycle::new();
        assert!(lc.start_queues(&platform, BOTH));
        assert!(!lc.start_queues(&platform, BOTH));
        assert!(lc.is_started());
        // One transition per direction.
        assert_eq!(platform.transitions(), 2);
        assert!(platform.is_capture_running());
        assert!(platform.is_playback_running());
    }

    #[test]
    fn stop_is_idempotent() {
        let platform = SimPlatform::new();
        let lc = Lifecycle::new();
        assert!(!lc.stop_queues(&platform, BOTH));
        assert_eq!(platform.transitions(), 0);

        lc.start_queues(&platform, BOTH);
        assert!(lc.stop_queues(&platform, BOTH));
        assert!(!lc.stop_queues(&platform, BOTH));
        assert_eq!(platform.transitions(), 4);
        assert!(!platform.is_capture_running());
        assert!(!platform.is_playback_running());
    }

    #[test]
    fn only_opened_directions_are_touched() {
        let platform = SimPlatform::new();
        let lc = Lifecycle::new();
        let playback_only = Directions {
            capture: false,
            playback: true,
        };
        lc.start_queues(&platform, playback_only);
        assert!(!platform.is_capture_running());
        assert!(platform.is_playback_running());
        assert_eq!(platform.transitions(), 1);
    }

    #[test]
    fn suspend_never_fires_in_foreground() {
        let lc = Lifecycle::new();
        lc.add_silence(1_000_000);
        assert!(!lc.suspend_due(44_100));
        assert_eq!(lc.silence_frames(), 1_000_000);
    }

    #[test]
    fn suspend_fires_past_one_second_in_background() {
        let lc = Lifecycle::new();
        lc.set_foreground(false);
        lc.add_silence(44_100);
        // Exactly one second is not enough.
        assert!(!lc.suspend_due(44_100));
        lc.add_silence(1);
        assert!(lc.suspend_due(44_100));
        assert_eq!(lc.silence_frames(), 0);
        assert!(!lc.suspend_due(44_100));
    }

    /// Calls back into the lifecycle from inside `set_playback_running(false)`,
    /// the way an application-thread start lands between a stop's flag swap
    /// and its hardware calls.
    struct Interleaving {
        lc: Arc<Lifecycle>,
        start_during_stop: AtomicBool,
        capture: AtomicBool,
        playback: AtomicBool,
    }

    impl Interleaving {
        fn new(lc: Arc<Lifecycle>) -> Self {
            Interleaving {
                lc,
                start_during_stop: AtomicBool::new(false),
                capture: AtomicBool::new(false),
                playback: AtomicBool::new(false),
            }
        }
    }

    impl AudioPlatform for Interleaving {
        fn open_capture(
            &self,
            _: StreamFormat,
            _: RecordingPreset,
            _: Weak<dyn IoCallbacks>,
        ) -> Result<(), PlatformError> {
            Ok(())
        }

        fn open_playback(
            &self,
            _: StreamFormat,
            _: Option<StreamCategory>,
            _: Weak<dyn IoCallbacks>,
        ) -> Result<(), PlatformError> {
            Ok(())
        }

        fn enqueue_capture(&self, _: QueueBlock) {}

        fn enqueue_render(&self, _: QueueBlock) {}

        fn set_capture_running(&self, running: bool) {
            self.capture.store(running, Ordering::SeqCst);
        }

        fn set_playback_running(&self, running: bool) {
            if !running && self.start_during_stop.swap(false, Ordering::SeqCst) {
                assert!(self.lc.start_queues(self, BOTH));
            }
            self.playback.store(running, Ordering::SeqCst);
        }

        fn close(&self) {}
    }

    #[test]
    fn start_racing_a_stop_leaves_hardware_running() {
        let lc = Arc::new(Lifecycle::new());
        let platform = Interleaving::new(lc.clone());
        assert!(lc.start_queues(&platform, BOTH));

        platform.start_during_stop.store(true, Ordering::SeqCst);
        assert!(lc.stop_queues(&platform, BOTH));

        assert!(lc.is_started());
        assert!(platform.playback.load(Ordering::SeqCst));
        assert!(platform.capture.load(Ordering::SeqCst));

        // Still controllable afterwards.
        assert!(!lc.start_queues(&platform, BOTH));
        assert!(lc.stop_queues(&platform, BOTH));
        assert!(!platform.playback.load(Ordering::SeqCst));
        assert!(!platform.capture.load(Ordering::SeqCst));
        assert!(lc.start_queues(&platform, BOTH));
        assert!(platform.playback.load(Ordering::SeqCst));
    }

    #[test]
    fn concurrent_start_stop_settles_on_flag() {
        let platform = SimPlatform::new();
        let lc = Lifecycle::new();
        std::thread::scope(|scope| {
            scope.spawn(|| {
                for _ in 0..2_000 {
                    lc.stop_queues(&platform, BOTH);
                }
            });
            scope.spawn(|| {
                for _ in 0..2_000 {
                    lc.start_queues(&platform, BOTH);
                }
            });
        });
        assert_eq!(platform.is_playback_running(), lc.is_started());
        assert_eq!(platform.is_capture_running(), lc.is_started());
    }

    #[test]
    fn audio_clears_silence() {
        let lc = Lifecycle::new();
        lc.add_silence(512);
        lc.clear_silence();
        assert_eq!(lc.silence_frames(), 0);
    }
}
