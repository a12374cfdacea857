use chrono::{DateTime, Utc};

use crate::CoreError;

/// Returns the current wall-clock time as milliseconds since Unix epoch.
pub fn physical_now() -> i64 {
    Utc::now().timestamp_millis()
}

/// Converts stored epoch milliseconds back to a UTC timestamp.
pub fn from_millis(ms: i64) -> Result<DateTime<Utc>, CoreError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| CoreError::Clock(format!("timestamp out of range: {ms}")))
}

/// A clock that hands out strictly increasing millisecond timestamps for log
/// entries, so one writer never stamps two entries alike.
pub struct LogClock {
    last_ms: i64,
}

impl LogClock {
    pub fn new() -> Self {
        Self { last_ms: 0 }
    }

    /// Generate the next monotonically increasing timestamp.
    pub fn tick(&mut self) -> Result<DateTime<Utc>, CoreError> {
        let now = physical_now();
        let ms = if now > self.last_ms {
            now
        } else {
            self.last_ms + 1
        };
        self.last_ms = ms;
        from_millis(ms)
    }

    /// Never hand out a timestamp at or before `seen`. Used when a store
    /// already holds entries written by another clock.
    pub fn observe(&mut self, seen: DateTime<Utc>) {
        self.last_ms = self.last_ms.max(seen.timestamp_millis());
    }
}

impl Default for LogClock {
    fn default() -> Self {
        Self::new()
    }
}
