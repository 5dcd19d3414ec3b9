pub mod catalog;
pub mod dispatcher;
pub mod engine;
pub mod extractor;
pub mod media;
pub mod slot;

// Re-export the main struct so users can just use `clipdeck_core::ClipdeckEngine`
pub use engine::ClipdeckEngine;

pub use catalog::{CatalogError, ClipCatalog};
pub use dispatcher::{DispatchError, Dispatcher, Mode, PlaybackState, Tick, Transition};
pub use extractor::{parse_index, run_extractor, LineReader};
pub use media::{AudioFrame, FrameStep, MediaError, MediaPlayer, QuitSignal};
pub use slot::{Offer, PendingIndexSlot};
