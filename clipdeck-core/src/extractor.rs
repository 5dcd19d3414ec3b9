//! Scrapes button indices out of the console's shell output.

use std::sync::Arc;

use bytes::BytesMut;
use clipdeck_io::{ConsoleError, ConsoleSession};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::slot::{Offer, PendingIndexSlot};

/// Longest partial line kept while waiting for a newline.
pub const MAX_LINE_LEN: usize = 4096;

/// Reassembles `\n`-terminated lines from console frames.
///
/// Finite per connection: once the session fails every call returns an error.
#[derive(Debug)]
pub struct LineReader<S> {
    session: ConsoleSession<S>,
    buf: BytesMut,
    /// Inside an overlong line; drop everything up to its `\n`.
    discarding: bool,
}

impl<S> LineReader<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(session: ConsoleSession<S>) -> Self {
        Self {
            session,
            buf: BytesMut::new(),
            discarding: false,
        }
    }

    /// Next complete line, without its `\r\n`. Invalid UTF-8 is replaced.
    pub async fn next_line(&mut self) -> Result<String, ConsoleError> {
        loop {
            if let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
                let raw = self.buf.split_to(pos + 1);
                if self.discarding {
                    self.discarding = false;
                    continue;
                }
                let line = String::from_utf8_lossy(&raw);
                return Ok(line.trim_end_matches(['\r', '\n']).to_string());
            }

            if self.buf.len() > MAX_LINE_LEN {
                if !self.discarding {
                    tracing::warn!(len = self.buf.len(), "Discarding overlong console line");
                }
                self.buf.clear();
                self.discarding = true;
            }

            let chunk = self.session.read_chunk(true).await?;
            self.buf.extend_from_slice(&chunk);
        }
    }

    pub fn into_session(self) -> ConsoleSession<S> {
        self.session
    }
}

/// The trimmed second `:`-separated field of `line`, as an index.
pub fn parse_index(line: &str) -> Option<u32> {
    line.split(':').nth(1)?.trim().parse().ok()
}

/// Parse one line and offer its index, if it has one.
pub fn extract_line(line: &str, slot: &PendingIndexSlot) -> Option<Offer> {
    let Some(index) = parse_index(line) else {
        tracing::trace!(%line, "No index on console line");
        return None;
    };

    let offer = slot.offer(index);
    match offer {
        Offer::Accepted => tracing::debug!(index, "Index queued"),
        Offer::Dropped => tracing::debug!(index, "Index dropped while a clip is playing"),
    }
    Some(offer)
}

/// Extractor loop. Runs until the console fails and returns that error.
pub async fn run_extractor<S>(mut lines: LineReader<S>, slot: Arc<PendingIndexSlot>) -> ConsoleError
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    tracing::info!("Extractor started");
    loop {
        match lines.next_line().await {
            Ok(line) => {
                extract_line(&line, &slot);
            }
            Err(e) => {
                tracing::error!(error = %e, "Console transport failed; no further selections");
                return e;
            }
        }
    }
}
