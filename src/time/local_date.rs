//! Calendar days bound to an IANA timezone.
//!
//! A [`LocalDate`] is only a query key: "the events of 2025-06-01 as seen from
//! America/New_York". Turning it into instants, or moving an instant by whole
//! calendar days, always goes through the observer's timezone so that DST
//! transitions shift wall-clock times exactly once.

use chrono::{
    DateTime, Days, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone,
    Utc,
};
use chrono_tz::Tz;
use std::fmt;

use crate::events::Instant;

/// A calendar date in a specific timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalDate {
    date: NaiveDate,
    tz: Tz,
}

impl LocalDate {
    pub fn new(date: NaiveDate, tz: Tz) -> Self {
        Self { date, tz }
    }

    /// The local date on which `instant` falls in `tz`.
    pub fn containing(instant: Instant, tz: Tz) -> Self {
        Self {
            date: instant.with_timezone(&tz).date_naive(),
            tz,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// Move by whole calendar days; saturates at the ends of chrono's range.
    pub fn offset_days(&self, days: i64) -> Self {
        let moved = if days >= 0 {
            self.date.checked_add_days(Days::new(days as u64))
        } else {
            self.date.checked_sub_days(Days::new(days.unsigned_abs()))
        };
        Self {
            date: moved.unwrap_or(self.date),
            tz: self.tz,
        }
    }

    pub fn succ(&self) -> Self {
        self.offset_days(1)
    }

    pub fn pred(&self) -> Self {
        self.offset_days(-1)
    }

    /// First instant of this local day.
    ///
    /// When local midnight does not exist (a DST gap starting at 00:00) the
    /// day starts at the first valid wall-clock time after the gap.
    pub fn start(&self) -> Instant {
        resolve_local(self.tz, self.date.and_time(NaiveTime::MIN)).with_timezone(&Utc)
    }

    /// First instant of the following local day (exclusive end of this one).
    pub fn end(&self) -> Instant {
        self.succ().start()
    }

    pub fn contains(&self, instant: Instant) -> bool {
        instant >= self.start() && instant < self.end()
    }

    /// `YYYY-MM-DD`, the form providers take as a query parameter.
    pub fn iso(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for LocalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.iso(), self.tz)
    }
}

/// Resolve a wall-clock time in `tz` to a single instant.
///
/// Ambiguous times (DST fall-back) take the earlier instant; non-existent
/// times (DST spring-forward) are pushed past the gap.
pub fn resolve_local(tz: Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            let shifted = naive + Duration::hours(1);
            tz.from_local_datetime(&shifted)
                .earliest()
                .unwrap_or_else(|| tz.from_utc_datetime(&naive))
        }
    }
}

/// Add whole calendar days to an instant in the observer's timezone.
///
/// The local time-of-day is preserved, so across a DST change the elapsed
/// time is 23 or 25 hours rather than 24. If the same wall-clock time is
/// ambiguous on the target day the offset of the original instant wins; if it
/// does not exist the instant moves by `24 × days` elapsed hours instead.
pub fn add_local_days(instant: Instant, days: i64, tz: Tz) -> Instant {
    let local = instant.with_timezone(&tz);
    let naive = local.naive_local();
    let target = if days >= 0 {
        naive.checked_add_days(Days::new(days as u64))
    } else {
        naive.checked_sub_days(Days::new(days.unsigned_abs()))
    };

    let Some(target) = target else {
        return instant;
    };

    match tz.from_local_datetime(&target) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(first, second) => {
            let original_offset = local.offset().fix();
            if second.offset().fix() == original_offset {
                second.with_timezone(&Utc)
            } else {
                first.with_timezone(&Utc)
            }
        }
        LocalResult::None => instant + Duration::days(days),
    }
}
