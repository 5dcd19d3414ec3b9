use std::io::Write;
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::debounce::{HoldFilter, Observation};
use crate::event_log::EventSink;
use crate::{ButtonEvent, HOLD_DURATION};

/// The button inputs, in scan order.
pub trait InputBank {
    fn line_count(&self) -> usize;
    fn is_active(&mut self, line: usize) -> bool;
}

/// Status LED.
pub trait Indicator {
    fn set(&mut self, on: bool);
}

/// Monotonic time for the hold timer, wall time for the log.
pub trait Clock {
    fn elapsed(&self) -> Duration;
    fn unix_now(&self) -> i64;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }

    fn unix_now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

struct NoIndicator;

impl Indicator for NoIndicator {
    fn set(&mut self, _on: bool) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    Idle,
    Holding,
    Emitted(ButtonEvent),
}

/// The scan loop: inputs in, log records and status lines out.
pub struct Scanner<I> {
    inputs: I,
    filter: HoldFilter,
    log: Box<dyn EventSink + Send>,
    console: Box<dyn Write + Send>,
    indicator: Box<dyn Indicator + Send>,
    clock: Box<dyn Clock + Send>,
}

impl<I> std::fmt::Debug for Scanner<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("filter", &self.filter)
            .field("log", &"Box<dyn EventSink + Send>")
            .field("console", &"Box<dyn Write + Send>")
            .finish()
    }
}

impl<I: InputBank> Scanner<I> {
    pub fn new(
        inputs: I,
        log: Box<dyn EventSink + Send>,
        console: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            inputs,
            filter: HoldFilter::new(HOLD_DURATION),
            log,
            console,
            indicator: Box::new(NoIndicator),
            clock: Box::new(SystemClock::new()),
        }
    }

    pub fn with_hold(mut self, hold: Duration) -> Self {
        self.filter = HoldFilter::new(hold);
        self
    }

    pub fn with_indicator(mut self, indicator: Box<dyn Indicator + Send>) -> Self {
        self.indicator = indicator;
        self
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock + Send>) -> Self {
        self.clock = clock;
        self
    }

    /// One pass over the inputs.
    pub fn scan_once(&mut self) -> ScanOutcome {
        let now = self.clock.elapsed();
        let active = self.first_active();

        match self.filter.observe(active, now) {
            Observation::Idle => {
                self.indicator.set(false);
                ScanOutcome::Idle
            }
            Observation::Holding { .. } => ScanOutcome::Holding,
            Observation::Accepted { line } => {
                let event = ButtonEvent {
                    index: line as u32 + 1,
                    observed_at: self.clock.unix_now(),
                };
                self.emit(&event);
                ScanOutcome::Emitted(event)
            }
        }
    }

    /// Scan forever. Failures inside a pass are logged, never propagated.
    pub fn run(&mut self, period: Duration) -> ! {
        tracing::info!(
            lines = self.inputs.line_count(),
            hold_ms = self.filter.hold().as_millis() as u64,
            "Button scan started"
        );
        loop {
            self.scan_once();
            std::thread::sleep(period);
        }
    }

    fn first_active(&mut self) -> Option<usize> {
        (0..self.inputs.line_count()).find(|&line| self.inputs.is_active(line))
    }

    fn emit(&mut self, event: &ButtonEvent) {
        self.indicator.set(true);

        if let Err(e) = self.log.append(event) {
            tracing::warn!(index = event.index, error = %e, "Event log append failed; continuing");
        }

        let line = event.status_line();
        let written = self
            .console
            .write_all(line.as_bytes())
            .and_then(|_| self.console.flush());
        if let Err(e) = written {
            tracing::warn!(index = event.index, error = %e, "Status line write failed");
        }

        tracing::info!(index = event.index, "Button press accepted");
    }
}
