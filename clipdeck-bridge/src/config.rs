//! Bridge configuration.
//!
//! Layered the usual way: built-in defaults, then the JSON file (if any),
//! then command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use clipdeck_core::{CatalogError, ClipCatalog};
use clipdeck_io::ConsoleConfig;
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug, Default)]
#[command(name = "clipdeck")]
#[command(about = "Play the clip for the last button held on the board")]
pub struct Cli {
    /// Config file (default: <config dir>/clipdeck/config.json)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Console host
    #[arg(long)]
    pub host: Option<String>,

    /// Console port
    #[arg(long)]
    pub port: Option<u16>,

    /// Console password
    #[arg(long)]
    pub password: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long)]
    pub log_level: Option<String>,

    /// Reject upgrade responses that are not `101`
    #[arg(long)]
    pub strict_handshake: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleSection {
    pub host: String,
    pub port: u16,
    pub password: String,
    pub strict_handshake: bool,
}

impl Default for ConsoleSection {
    fn default() -> Self {
        let c = ConsoleConfig::default();
        Self {
            host: c.host,
            port: c.port,
            password: c.password,
            strict_handshake: c.strict_handshake,
        }
    }
}

impl ConsoleSection {
    pub fn to_console_config(&self) -> ConsoleConfig {
        ConsoleConfig {
            host: self.host.clone(),
            port: self.port,
            password: self.password.clone(),
            strict_handshake: self.strict_handshake,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipsSection {
    pub background: PathBuf,
    pub selections: Vec<PathBuf>,
}

impl Default for ClipsSection {
    fn default() -> Self {
        Self {
            background: PathBuf::from("vid/windows-shut.mp4"),
            selections: ["daniela", "nicolo", "rossanna", "yvone"]
                .iter()
                .map(|name| PathBuf::from(format!("vid/{name}.mp4")))
                .collect(),
        }
    }
}

impl ClipsSection {
    pub fn to_catalog(&self) -> Result<ClipCatalog, CatalogError> {
        ClipCatalog::new(self.background.clone(), self.selections.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSection {
    pub program: String,
    /// Passed before the clip path.
    pub args: Vec<String>,
}

impl Default for PlayerSection {
    fn default() -> Self {
        Self {
            program: "ffplay".to_string(),
            args: vec![
                "-autoexit".to_string(),
                "-loglevel".to_string(),
                "quiet".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub console: ConsoleSection,
    pub clips: ClipsSection,
    pub poll_interval_ms: u64,
    pub player: PlayerSection,
    pub log_level: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            console: ConsoleSection::default(),
            clips: ClipsSection::default(),
            poll_interval_ms: 20,
            player: PlayerSection::default(),
            log_level: "info".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Resolve the config for this invocation.
    ///
    /// A missing default file means defaults; a missing `--config` file is an error.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => match default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(host) = &cli.host {
            self.console.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.console.port = port;
        }
        if let Some(password) = &cli.password {
            self.console.password = password.clone();
        }
        if let Some(level) = &cli.log_level {
            self.log_level = level.clone();
        }
        if cli.strict_handshake {
            self.console.strict_handshake = true;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.console.host.is_empty() {
            bail!("console.host is empty");
        }
        if self.console.port == 0 {
            bail!("console.port must be non-zero");
        }
        if self.poll_interval_ms == 0 {
            bail!("poll_interval_ms must be at least 1");
        }
        if self.player.program.is_empty() {
            bail!("player.program is empty");
        }
        self.clips.to_catalog().context("Invalid clip list")?;
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// `<config dir>/clipdeck/config.json`, when the platform has a config dir.
pub fn default_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.config_dir().join("clipdeck").join("config.json"))
}
