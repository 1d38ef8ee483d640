//! Lock-free I/O counters.
//!
//! The handlers never log; these counters are how their events become
//! visible to the application thread.

use core::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Default)]
pub struct IoStats {
    capture_blocks: AtomicU64,
    render_blocks: AtomicU64,
    deliveries: AtomicU64,
    underruns: AtomicU64,
    silent_blocks: AtomicU64,
    auto_suspends: AtomicU64,
}

/// Point-in-time copy of [`IoStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IoStatsSnapshot {
    /// Capture callbacks serviced.
    pub capture_blocks: u64,
    /// Render callbacks serviced.
    pub render_blocks: u64,
    /// User callback invocations.
    pub deliveries: u64,
    /// Render cycles that played the silence block.
    pub underruns: u64,
    /// Blocks the user callback reported as silent.
    pub silent_blocks: u64,
    /// Times the background silence policy stopped the queues.
    pub auto_suspends: u64,
}

impl IoStats {
    pub(crate) fn capture_block(&self) {
        self.capture_blocks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn render_block(&self) {
        self.render_blocks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn delivery(&self) {
        self.deliveries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn underrun(&self) {
        self.underruns.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn silent_block(&self) {
        self.silent_blocks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn auto_suspend(&self) {
        self.auto_suspends.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> IoStatsSnapshot {
        IoStatsSnapshot {
            capture_blocks: self.capture_blocks.load(Ordering::Relaxed),
            render_blocks: self.render_blocks.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            underruns: self.underruns.load(Ordering::Relaxed),
            silent_blocks: self.silent_blocks.load(Ordering::Relaxed),
            auto_suspends: self.auto_suspends.load(Ordering::Relaxed),
        }
    }
}
