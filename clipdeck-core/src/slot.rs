//! Most-recent-wins hand-off between the extractor and the dispatcher.
//!
//! The pending index and the "selected clip is playing" gate live in one
//! atomic word, so the gate check and the store in `offer` cannot be split
//! by the dispatcher changing mode. Neither side ever waits on the other.

use std::sync::atomic::{AtomicU64, Ordering};

/// No index pending, not playing.
const EMPTY: u64 = u64::MAX;
/// A selected clip is playing. Nothing can be pending.
const PLAYING: u64 = u64::MAX - 1;

/// Result of offering an index through the playback gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    Accepted,
    /// A selected clip is playing; the index was discarded.
    Dropped,
}

/// Holds `EMPTY`, `PLAYING`, or a pending `u32` index.
#[derive(Debug)]
pub struct PendingIndexSlot {
    word: AtomicU64,
}

impl PendingIndexSlot {
    pub fn new() -> Self {
        Self {
            word: AtomicU64::new(EMPTY),
        }
    }

    /// Producer side. Replaces any value not yet taken, unless a selected
    /// clip is playing.
    pub fn offer(&self, index: u32) -> Offer {
        let res = self
            .word
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                (cur != PLAYING).then_some(u64::from(index))
            });
        match res {
            Ok(_) => Offer::Accepted,
            Err(_) => Offer::Dropped,
        }
    }

    /// Consumer side. Never blocks; always `None` while playing.
    pub fn take(&self) -> Option<u32> {
        self.word
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                (cur != PLAYING && cur != EMPTY).then_some(EMPTY)
            })
            .ok()
            .map(|v| v as u32)
    }

    pub fn is_playing(&self) -> bool {
        self.word.load(Ordering::Acquire) == PLAYING
    }

    /// Raising the gate discards whatever is pending. Lowering it leaves the
    /// slot empty, or untouched if the gate was already down.
    pub fn set_playing(&self, playing: bool) {
        if playing {
            self.word.store(PLAYING, Ordering::Release);
        } else {
            let _ = self
                .word
                .compare_exchange(PLAYING, EMPTY, Ordering::AcqRel, Ordering::Acquire);
        }
    }
}

impl Default for PendingIndexSlot {
    fn default() -> Self {
        Self::new()
    }
}
