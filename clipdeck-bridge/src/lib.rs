//! # Clipdeck Bridge
//!
//! Wires the console, the extractor and the dispatcher into one process.

pub mod config;
pub mod player;
pub mod quit;
pub mod util;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use clipdeck_core::{ClipdeckEngine, Dispatcher};

use crate::config::BridgeConfig;
use crate::player::ProcessPlayer;

/// Runs until the operator quits. Losing the console is not fatal: the
/// background loop keeps playing, it just never gets another selection.
pub async fn run(config: BridgeConfig) -> Result<()> {
    let catalog = config.clips.to_catalog().context("Invalid clip list")?;
    let player = ProcessPlayer::new(&config.player)?;

    let engine = ClipdeckEngine::start(&config.console.to_console_config()).await?;

    let quit = Arc::new(AtomicBool::new(false));
    let _ctrl_c = quit::spawn_ctrl_c(quit.clone());
    let keys = quit::spawn_key_listener(quit.clone());

    let mut dispatcher = Dispatcher::start(catalog, engine.slot.clone(), player, quit.clone())
        .context("Failed to start the background loop")?;

    let poll = config.poll_interval();
    tokio::task::spawn_blocking(move || dispatcher.run(poll))
        .await
        .context("Dispatcher thread panicked")?;

    if engine.extractor_finished() {
        tracing::debug!("Extractor had already stopped");
    }
    engine.shutdown();

    quit.store(true, Ordering::Release);
    let _ = keys.join();

    tracing::info!("Clipdeck stopped");
    Ok(())
}
