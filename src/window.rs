/// Analysis window handling.
///
/// A window bounds a scan twice: by post count (`max_messages`, the pagination
/// cap) and by age (`window_days`, the early-stop cutoff measured back from
/// "now" at scan start).
use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Immutable scan bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisWindow {
    max_messages: usize,
    window_days: u32,
}

impl AnalysisWindow {
    /// Build a window; both bounds must be positive.
    pub fn new(max_messages: usize, window_days: u32) -> Result<Self> {
        if max_messages == 0 {
            return Err(anyhow!("max_messages must be a positive integer"));
        }
        if window_days == 0 {
            return Err(anyhow!("window_days must be a positive integer"));
        }
        Ok(Self {
            max_messages,
            window_days,
        })
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    pub fn window_days(&self) -> u32 {
        self.window_days
    }

    /// Oldest instant still inside the window.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(i64::from(self.window_days))
    }

    /// Closed interval at the cutoff: a post exactly `window_days` old is kept.
    pub fn contains(&self, cutoff: DateTime<Utc>, ts: DateTime<Utc>) -> bool {
        ts >= cutoff
    }
}
