use anyhow::Result;
use clap::Parser;

use clipdeck_bridge::config::{BridgeConfig, Cli};
use clipdeck_bridge::util;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = BridgeConfig::load(&cli)?;

    util::init_tracing(&config.log_level);
    util::install_panic_hook();

    tracing::info!(
        host = %config.console.host,
        port = config.console.port,
        clips = config.clips.selections.len(),
        "=== Clipdeck Starting ==="
    );

    clipdeck_bridge::run(config).await
}
