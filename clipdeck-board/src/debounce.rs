use std::time::Duration;

/// What the filter concluded from one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// Nothing is pressed.
    Idle,
    /// A line is pressed but has not qualified yet, or already fired.
    Holding { line: usize },
    /// The line just crossed the hold threshold.
    Accepted { line: usize },
}

#[derive(Debug, Clone, Copy)]
struct Hold {
    line: usize,
    since: Duration,
    fired: bool,
}

/// Hold-duration filter over the first active line in scan order.
///
/// A press fires exactly once; the line has to be released (or another line
/// has to take over) before it can fire again.
#[derive(Debug, Clone)]
pub struct HoldFilter {
    hold: Duration,
    current: Option<Hold>,
}

impl HoldFilter {
    pub fn new(hold: Duration) -> Self {
        Self {
            hold,
            current: None,
        }
    }

    pub fn hold(&self) -> Duration {
        self.hold
    }

    /// Feed the first active line (if any) and the monotonic time of the scan.
    pub fn observe(&mut self, active: Option<usize>, now: Duration) -> Observation {
        let Some(line) = active else {
            self.current = None;
            return Observation::Idle;
        };

        // A different line taking over restarts the timer.
        if self.current.is_some_and(|h| h.line != line) {
            self.current = None;
        }
        let hold = self.current.get_or_insert(Hold {
            line,
            since: now,
            fired: false,
        });

        if !hold.fired && now.saturating_sub(hold.since) >= self.hold {
            hold.fired = true;
            Observation::Accepted { line }
        } else {
            Observation::Holding { line }
        }
    }
}
