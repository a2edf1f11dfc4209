//! Tamper monitor for the unlocked dwell.
//!
//! Escalation is driven by the *absence* of fresh motion pulses: every pulse
//! restarts the quiet timer, and only a sustained quiet interval raises a
//! [`TamperEvent::Warning`] and then a [`TamperEvent::Alarm`]. Both are
//! latched, so each fires at most once per dwell.
//!
//! ```
//! use bikelock_controller::tamper::{TamperEvent, TamperMonitor};
//! use std::time::Duration;
//! use tokio::time::Instant;
//!
//! let start = Instant::now();
//! let mut monitor = TamperMonitor::new(Duration::from_secs(15), Duration::from_secs(20), start);
//!
//! assert_eq!(monitor.poll(false, start + Duration::from_secs(10)), TamperEvent::None);
//! assert_eq!(monitor.poll(false, start + Duration::from_secs(15)), TamperEvent::Warning);
//! assert_eq!(monitor.poll(false, start + Duration::from_secs(20)), TamperEvent::Alarm);
//! ```

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;

/// Outcome of one tamper poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TamperEvent {
    #[default]
    None,
    /// Quiet for the warning threshold; notify the remote controller.
    Warning,
    /// Quiet for the alarm threshold; sound the alarm and relock.
    Alarm,
}

impl fmt::Display for TamperEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TamperEvent::None => "none",
            TamperEvent::Warning => "warning",
            TamperEvent::Alarm => "alarm",
        };
        write!(f, "{s}")
    }
}

/// Accumulated motion state for the current dwell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TamperWindow {
    pub pulse_count: u32,
    pub last_pulse_at: Instant,
    pub warning_sent: bool,
    pub alarm_raised: bool,
}

impl TamperWindow {
    fn empty(now: Instant) -> Self {
        Self {
            pulse_count: 0,
            last_pulse_at: now,
            warning_sent: false,
            alarm_raised: false,
        }
    }
}

/// Two-threshold dwell monitor.
#[derive(Debug, Clone)]
pub struct TamperMonitor {
    window: TamperWindow,
    last_seen_count: u32,
    warn_threshold: Duration,
    alarm_threshold: Duration,
}

impl TamperMonitor {
    pub fn new(warn_threshold: Duration, alarm_threshold: Duration, now: Instant) -> Self {
        Self {
            window: TamperWindow::empty(now),
            last_seen_count: 0,
            warn_threshold,
            alarm_threshold,
        }
    }

    /// Feed one motion sample taken at `now`.
    pub fn poll(&mut self, motion: bool, now: Instant) -> TamperEvent {
        if motion {
            self.window.pulse_count = self.window.pulse_count.wrapping_add(1);
            self.window.last_pulse_at = now;
        }

        let quiet = self.window.pulse_count == self.last_seen_count;
        self.last_seen_count = self.window.pulse_count;
        if !quiet {
            return TamperEvent::None;
        }

        let idle = now.saturating_duration_since(self.window.last_pulse_at);
        if idle >= self.alarm_threshold && !self.window.alarm_raised {
            // An alarm supersedes any warning still due in this dwell.
            self.window.alarm_raised = true;
            self.window.warning_sent = true;
            debug!(?idle, "Tamper alarm threshold reached");
            TamperEvent::Alarm
        } else if idle >= self.warn_threshold && !self.window.warning_sent {
            self.window.warning_sent = true;
            debug!(?idle, "Tamper warning threshold reached");
            TamperEvent::Warning
        } else {
            TamperEvent::None
        }
    }

    /// Start a fresh dwell at `now`.
    pub fn reset(&mut self, now: Instant) {
        self.window = TamperWindow::empty(now);
        self.last_seen_count = 0;
    }

    pub fn window(&self) -> &TamperWindow {
        &self.window
    }

    /// Time since the last motion pulse, or since the last reset.
    pub fn quiet_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.window.last_pulse_at)
    }
}
