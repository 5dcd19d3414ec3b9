//! Seam to the external media player.
//!
//! The dispatcher owns exactly one player and one quit signal; neither is
//! ever shared with the extractor.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("cannot open {}: {reason}", path.display())]
    Open { path: PathBuf, reason: String },

    #[error("no clip is open")]
    NotOpen,

    #[error("seek failed: {0}")]
    Seek(String),

    #[error("playback failed: {0}")]
    Playback(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStep {
    Frame,
    EndOfStream,
}

/// Decoded audio for the current video frame. Only its presence matters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioFrame {
    pub pts: f64,
}

/// The external decoder/renderer: open, read next frame, seek, release.
pub trait MediaPlayer: Send {
    fn open(&mut self, path: &Path) -> Result<(), MediaError>;

    /// Advance and present one video frame.
    fn read_frame(&mut self) -> Result<FrameStep, MediaError>;

    /// Audio matching the last video frame, if the decoder has one ready.
    fn read_audio(&mut self) -> Option<AudioFrame>;

    fn seek_start(&mut self) -> Result<(), MediaError>;

    fn release(&mut self);
}

/// Operator-initiated stop, polled once per frame.
pub trait QuitSignal: Send {
    fn quit_requested(&mut self) -> bool;
}

impl QuitSignal for Arc<AtomicBool> {
    fn quit_requested(&mut self) -> bool {
        self.load(Ordering::Acquire)
    }
}
