//! # Clipdeck Board
//!
//! The button side of clipdeck.
//! Scans the input lines, filters out taps shorter than the hold time,
//! records each accepted press and prints a status line the player scrapes
//! from the remote console.
//!
//! Pin access is behind [`scanner::InputBank`] so the state machine runs the
//! same on the device and in host tests.

pub mod debounce;
pub mod event_log;
pub mod scanner;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use debounce::{HoldFilter, Observation};
pub use event_log::{EventSink, FileEventLog, LogError};
pub use scanner::{Clock, Indicator, InputBank, ScanOutcome, Scanner, SystemClock};

/// How often the inputs are sampled.
pub const POLL_PERIOD: Duration = Duration::from_millis(50);

/// How long a line must stay active before the press counts.
pub const HOLD_DURATION: Duration = Duration::from_secs(1);

/// Prefix of the console line printed for every accepted press.
pub const STATUS_MARKER: &str = "Logged video index";

/// Default log file on the device filesystem.
pub const DEFAULT_LOG_FILE: &str = "keypresses.dat";

/// One accepted button press. `index` is 1-based in scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonEvent {
    pub index: u32,
    pub observed_at: i64,
}

impl ButtonEvent {
    /// `"<unix timestamp>,<index>\n"`
    pub fn log_line(&self) -> String {
        format!("{},{}\n", self.observed_at, self.index)
    }

    /// `"Logged video index: <index>\n"`
    pub fn status_line(&self) -> String {
        format!("{}: {}\n", STATUS_MARKER, self.index)
    }

    pub fn parse_log_line(line: &str) -> Option<Self> {
        let (ts, index) = line.trim().split_once(',')?;
        Some(Self {
            observed_at: ts.trim().parse().ok()?,
            index: index.trim().parse().ok()?,
        })
    }
}
