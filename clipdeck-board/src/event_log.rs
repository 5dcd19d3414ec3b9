//! Append-only press log.
//!
//! One record per line, `"<unix timestamp>,<index>\n"`. Records are only
//! ever appended; nothing here rewrites or truncates the file.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::ButtonEvent;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("event log {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("event log unavailable: {0}")]
    Unavailable(String),
}

/// Somewhere accepted presses are recorded.
pub trait EventSink {
    fn append(&mut self, event: &ButtonEvent) -> Result<(), LogError>;
}

#[derive(Debug, Clone)]
pub struct FileEventLog {
    path: PathBuf,
}

impl FileEventLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every well-formed record, oldest first. A missing file is an empty log.
    pub fn entries(&self) -> Result<Vec<ButtonEvent>, LogError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(self.io_error(source)),
        };
        Ok(text.lines().filter_map(ButtonEvent::parse_log_line).collect())
    }

    /// Most recent record, if any.
    pub fn latest(&self) -> Result<Option<ButtonEvent>, LogError> {
        Ok(self.entries()?.pop())
    }

    fn io_error(&self, source: std::io::Error) -> LogError {
        LogError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl EventSink for FileEventLog {
    fn append(&mut self, event: &ButtonEvent) -> Result<(), LogError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        file.write_all(event.log_line().as_bytes())
            .map_err(|e| self.io_error(e))
    }
}
