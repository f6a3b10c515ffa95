use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Half-open window `[start_ts, end_ts)` in epoch millis used when the
/// caller loads occurrences for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSpan {
    start_ts: i64,
    end_ts: i64,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Provided timespan start_ts: {0} and end_ts: {1} is invalid. The end must be after the start.")]
pub struct InvalidTimeSpanError(pub i64, pub i64);

impl TimeSpan {
    pub fn new(start_ts: i64, end_ts: i64) -> Result<Self, InvalidTimeSpanError> {
        if end_ts <= start_ts {
            return Err(InvalidTimeSpanError(start_ts, end_ts));
        }
        Ok(Self { start_ts, end_ts })
    }

    pub fn start(&self) -> i64 {
        self.start_ts
    }

    pub fn end(&self) -> i64 {
        self.end_ts
    }

    /// Whether a block `[start_ts, end_ts)` overlaps this window. Zero length
    /// blocks count when their instant falls inside the window.
    pub fn overlaps(&self, start_ts: i64, end_ts: i64) -> bool {
        let end_ts = end_ts.max(start_ts);
        if start_ts == end_ts {
            return start_ts >= self.start_ts && start_ts < self.end_ts;
        }
        start_ts < self.end_ts && end_ts > self.start_ts
    }

    pub fn as_datetime(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((
            DateTime::from_timestamp_millis(self.start_ts)?,
            DateTime::from_timestamp_millis(self.end_ts)?,
        ))
    }
}
