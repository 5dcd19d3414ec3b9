use std::sync::Arc;

use anyhow::{Context, Result};
use clipdeck_io::{ConsoleConfig, ConsoleError, ConsoleSession, ShellVersion};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinHandle;

use crate::extractor::{run_extractor, LineReader};
use crate::slot::PendingIndexSlot;

/// The console side of clipdeck: one session, one extractor task, and the
/// slot the dispatcher reads from.
#[derive(Debug)]
pub struct ClipdeckEngine {
    pub slot: Arc<PendingIndexSlot>,
    pub version: Option<ShellVersion>,
    extractor: JoinHandle<ConsoleError>,
}

impl ClipdeckEngine {
    /// Connects, logs in, asks for the shell version and starts extracting.
    /// Only the connection itself can fail.
    pub async fn start(config: &ConsoleConfig) -> Result<Self> {
        // 1. Connect + upgrade + login
        let mut session = ConsoleSession::connect(config)
            .await
            .context("Failed to open console session")?;

        // 2. Version query. Informational only; a failure here closes the
        // session and the extractor reports it.
        let version = match session.get_version().await {
            Ok(version) => {
                tracing::info!(%version, "Console connected");
                Some(version)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Console did not answer the version request");
                None
            }
        };

        // 3. Hand the session to the extractor
        let mut engine = Self::from_session(session);
        engine.version = version;
        Ok(engine)
    }

    /// Start extracting from an already authenticated session.
    pub fn from_session<S>(session: ConsoleSession<S>) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let slot = Arc::new(PendingIndexSlot::new());
        let extractor = tokio::spawn(run_extractor(LineReader::new(session), slot.clone()));

        Self {
            slot,
            version: None,
            extractor,
        }
    }

    pub fn extractor_finished(&self) -> bool {
        self.extractor.is_finished()
    }

    /// Wait for the extractor to end and return the error that ended it.
    pub async fn join_extractor(self) -> Result<ConsoleError> {
        self.extractor.await.context("Extractor task panicked")
    }

    pub fn shutdown(&self) {
        self.extractor.abort();
    }
}
