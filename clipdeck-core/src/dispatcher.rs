//! Playback dispatcher.
//!
//! Two states. `Background` loops clip 0 and checks the slot every tick.
//! `PlayingSelected` plays one clip to its end and ignores the slot; the
//! extractor drops new presses while it lasts. Every failure path lands
//! back in `Background`.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::catalog::{CatalogError, ClipCatalog};
use crate::media::{FrameStep, MediaError, MediaPlayer, QuitSignal};
use crate::slot::PendingIndexSlot;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Media(#[from] MediaError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Background,
    PlayingSelected { index: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackState {
    pub mode: Mode,
    pub current_clip: u32,
}

impl PlaybackState {
    fn background() -> Self {
        Self {
            mode: Mode::Background,
            current_clip: ClipCatalog::BACKGROUND_INDEX,
        }
    }
}

/// What changed during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    None,
    /// Selected clip opened; now `PlayingSelected`.
    Selected { index: u32 },
    /// Selected clip reached its end; back to the background loop.
    Finished { index: u32 },
    /// Background clip wrapped around.
    Looped,
    /// Selecting `index` failed; still (or again) in the background loop.
    Fallback { index: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Continue(Transition),
    Quit,
}

pub struct Dispatcher<P, Q> {
    catalog: ClipCatalog,
    slot: Arc<PendingIndexSlot>,
    player: P,
    quit: Q,
    state: PlaybackState,
    background_open: bool,
    background_failures: u32,
}

impl<P, Q> std::fmt::Debug for Dispatcher<P, Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("state", &self.state)
            .field("background_open", &self.background_open)
            .finish()
    }
}

impl<P: MediaPlayer, Q: QuitSignal> Dispatcher<P, Q> {
    /// Opens the background clip. Failing to open it at startup is an error.
    pub fn start(
        catalog: ClipCatalog,
        slot: Arc<PendingIndexSlot>,
        mut player: P,
        quit: Q,
    ) -> Result<Self, DispatchError> {
        player.open(catalog.background())?;
        slot.set_playing(false);
        tracing::info!(background = %catalog.background().display(), "Background loop started");

        Ok(Self {
            catalog,
            slot,
            player,
            quit,
            state: PlaybackState::background(),
            background_open: true,
            background_failures: 0,
        })
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    /// Run until quit, sleeping `poll_interval` between ticks.
    pub fn run(&mut self, poll_interval: Duration) {
        loop {
            match self.tick() {
                Tick::Quit => break,
                Tick::Continue(Transition::None) => {}
                Tick::Continue(t) => tracing::debug!(?t, "Playback transition"),
            }
            std::thread::sleep(poll_interval);
        }
    }

    /// One step of the control loop.
    pub fn tick(&mut self) -> Tick {
        if self.quit.quit_requested() {
            self.player.release();
            self.slot.set_playing(false);
            tracing::info!("Quit requested; player released");
            return Tick::Quit;
        }

        if self.state.mode == Mode::Background {
            if let Some(index) = self.slot.take() {
                return Tick::Continue(self.select(index));
            }
            if !self.background_open {
                self.restore_background();
                if !self.background_open {
                    return Tick::Continue(Transition::None);
                }
            }
        }

        Tick::Continue(self.step())
    }

    fn select(&mut self, index: u32) -> Transition {
        match self.open_selection(index) {
            Ok(()) => {
                // Also drops anything offered while the clip was opening.
                self.slot.set_playing(true);
                self.state = PlaybackState {
                    mode: Mode::PlayingSelected { index },
                    current_clip: index,
                };
                tracing::info!(index, "Playing selected clip");
                Transition::Selected { index }
            }
            Err(e) => {
                tracing::warn!(index, error = %e, "Selection failed; staying on background loop");
                if !self.background_open {
                    self.restore_background();
                }
                Transition::Fallback { index }
            }
        }
    }

    fn open_selection(&mut self, index: u32) -> Result<(), DispatchError> {
        let path = self.catalog.selection(index)?.to_path_buf();
        self.player.release();
        self.background_open = false;
        self.player.open(&path)?;
        Ok(())
    }

    fn step(&mut self) -> Transition {
        match self.player.read_frame() {
            Ok(FrameStep::Frame) => {
                // Best-effort sync: a missing audio frame never holds video back.
                let _ = self.player.read_audio();
                Transition::None
            }
            Ok(FrameStep::EndOfStream) => self.end_of_stream(),
            Err(e) => {
                tracing::warn!(error = %e, "Frame read failed; treating as end of stream");
                self.end_of_stream()
            }
        }
    }

    fn end_of_stream(&mut self) -> Transition {
        match self.state.mode {
            Mode::PlayingSelected { index } => {
                tracing::info!(index, "Selected clip finished");
                self.restore_background();
                Transition::Finished { index }
            }
            Mode::Background => {
                if let Err(e) = self.player.seek_start() {
                    tracing::warn!(error = %e, "Rewind failed; reopening background clip");
                    self.restore_background();
                }
                Transition::Looped
            }
        }
    }

    /// Release whatever is open and go back to looping clip 0.
    fn restore_background(&mut self) {
        self.player.release();
        self.slot.set_playing(false);
        self.state = PlaybackState::background();

        match self.player.open(self.catalog.background()) {
            Ok(()) => {
                self.background_open = true;
                self.background_failures = 0;
            }
            Err(e) => {
                self.background_open = false;
                self.background_failures += 1;
                if self.background_failures == 1 {
                    tracing::error!(error = %e, "Background clip unavailable; will keep retrying");
                } else {
                    tracing::trace!(attempt = self.background_failures, "Background retry failed");
                }
            }
        }
    }
}
