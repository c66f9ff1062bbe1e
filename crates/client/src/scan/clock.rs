//! Receipt clock for scan timestamps.

use chrono::Utc;

/// Milliseconds since the Unix epoch from the wall clock.
pub fn wall_clock_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Stamps scans at receipt time. Never issues a timestamp lower than the
/// previous one, even if the wall clock steps backwards.
#[derive(Debug, Clone)]
pub struct ReceiptClock {
    source: fn() -> i64,
    last: i64,
}

impl Default for ReceiptClock {
    fn default() -> Self {
        Self::new(wall_clock_millis)
    }
}

impl ReceiptClock {
    pub fn new(source: fn() -> i64) -> Self {
        Self {
            source,
            last: i64::MIN,
        }
    }

    pub fn now(&mut self) -> i64 {
        self.last = self.last.max((self.source)());
        self.last
    }
}
