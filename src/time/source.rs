//! Time source abstraction for real and pinned time.
//!
//! The reconciliation engine never reads the clock itself; every evaluation
//! receives its `now` explicitly. Only the CLI and the monitor loop ask a
//! [`TimeSource`] for the current instant, which lets `--at` and the tests run
//! the whole pipeline at a chosen moment.

use chrono::{Duration as ChronoDuration, NaiveDateTime, Utc};
use chrono_tz::Tz;
use std::sync::Mutex;
use std::time::Duration as StdDuration;

use crate::events::Instant;
use crate::time::local_date::resolve_local;

/// Trait for abstracting time operations
pub trait TimeSource: Send + Sync {
    /// Get the current instant
    fn now(&self) -> Instant;

    /// Sleep for the specified duration (or pretend to)
    fn sleep(&self, duration: StdDuration);

    /// Whether this source is pinned rather than following the system clock
    fn is_fixed(&self) -> bool;
}

/// Real-time implementation that uses actual system time
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> Instant {
        Utc::now()
    }

    fn sleep(&self, duration: StdDuration) {
        std::thread::sleep(duration);
    }

    fn is_fixed(&self) -> bool {
        false
    }
}

/// Time source pinned to a chosen instant.
///
/// Sleeping advances the pinned instant by exactly the requested duration
/// without blocking, so a monitor loop driven by it fast-forwards.
pub struct FixedTimeSource {
    current: Mutex<Instant>,
}

impl FixedTimeSource {
    pub fn new(start: Instant) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> Instant {
        match self.current.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn sleep(&self, duration: StdDuration) {
        let step = ChronoDuration::milliseconds(duration.as_millis() as i64);
        match self.current.lock() {
            Ok(mut guard) => *guard += step,
            Err(poisoned) => *poisoned.into_inner() += step,
        }
    }

    fn is_fixed(&self) -> bool {
        true
    }
}

/// Parse a wall-clock string "YYYY-MM-DD HH:MM:SS" in the given timezone.
///
/// Also accepts RFC 3339 input with an explicit offset, which bypasses the
/// timezone entirely.
pub fn parse_datetime_in_tz(s: &str, tz: Tz) -> Result<Instant, String> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s.trim()) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%dT%H:%M:%S"))
        .map_err(|e| format!("Invalid datetime format: {e}. Use YYYY-MM-DD HH:MM:SS"))?;

    Ok(resolve_local(tz, naive).with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_source_advances_on_sleep() {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let source = FixedTimeSource::new(start);
        assert_eq!(source.now(), start);

        source.sleep(StdDuration::from_secs(90));
        assert_eq!(source.now(), start + ChronoDuration::seconds(90));
        assert!(source.is_fixed());
    }

    #[test]
    fn test_parse_datetime_in_tz() {
        let tz: Tz = "America/New_York".parse().unwrap();
        let parsed = parse_datetime_in_tz("2025-06-01 08:00:00", tz).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap());

        let explicit = parse_datetime_in_tz("2025-06-01T08:00:00Z", tz).unwrap();
        assert_eq!(explicit, Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap());

        assert!(parse_datetime_in_tz("yesterday", tz).is_err());
    }
}
