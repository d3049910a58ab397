//! Night-boundary correction for provider event sets.
//!
//! Providers report the events that fall on one calendar day, so a set that
//! belongs to the night after the rise can show up earlier in the day than the
//! rise. Pairing them requires moving the set forward one calendar day.

use chrono_tz::Tz;

use crate::events::{CelestialEventSet, Instant};
use crate::time::add_local_days;

/// Moves a set that does not follow its rise onto the next calendar day.
#[derive(Debug, Clone, Copy)]
pub struct NightBoundaryNormalizer {
    tz: Tz,
}

impl NightBoundaryNormalizer {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Corrected set for a (rise, set) pair.
    ///
    /// A set after its rise is returned untouched, so applying this twice is
    /// the same as applying it once. A set that is still not after the rise
    /// once moved a calendar day forward is not a same-day pair and is
    /// dropped.
    pub fn normalize_set(&self, rise: Option<Instant>, set: Option<Instant>) -> Option<Instant> {
        match (rise, set) {
            (Some(rise), Some(set)) if set <= rise => {
                let moved = add_local_days(set, 1, self.tz);
                if moved > rise {
                    Some(moved)
                } else {
                    log_debug!("dropping set {set} that cannot follow rise {rise}");
                    None
                }
            }
            (_, set) => set,
        }
    }

    pub fn apply(&self, events: CelestialEventSet) -> CelestialEventSet {
        let set = self.normalize_set(events.rise, events.set);
        CelestialEventSet { set, ..events }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use chrono_tz::America::New_York;

    fn ny(y: i32, m: u32, d: u32, h: u32, min: u32) -> Instant {
        New_York
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_early_set_moves_to_next_day() {
        let normalizer = NightBoundaryNormalizer::new(New_York);
        let rise = ny(2025, 7, 10, 14, 2);
        let set = ny(2025, 7, 10, 2, 41);

        let corrected = normalizer.normalize_set(Some(rise), Some(set)).unwrap();
        assert_eq!(corrected, ny(2025, 7, 11, 2, 41));
        assert!(corrected > rise);
        assert_eq!(normalizer.normalize_set(Some(rise), Some(corrected)), Some(corrected));
    }

    #[test]
    fn test_equal_set_moves_forward() {
        let normalizer = NightBoundaryNormalizer::new(New_York);
        let rise = ny(2025, 7, 10, 9, 0);
        let corrected = normalizer.normalize_set(Some(rise), Some(rise)).unwrap();
        assert_eq!(corrected - rise, Duration::hours(24));
    }

    #[test]
    fn test_later_set_untouched() {
        let normalizer = NightBoundaryNormalizer::new(New_York);
        let rise = ny(2025, 7, 10, 6, 0);
        let set = ny(2025, 7, 10, 6, 1);
        assert_eq!(normalizer.normalize_set(Some(rise), Some(set)), Some(set));
    }

    #[test]
    fn test_set_more_than_a_day_after_rise_untouched() {
        // Circumpolar stretch: the reported set is 30 hours after the rise
        let normalizer = NightBoundaryNormalizer::new(New_York);
        let rise = ny(2025, 7, 10, 6, 0);
        let set = ny(2025, 7, 11, 12, 0);

        assert_eq!(normalizer.normalize_set(Some(rise), Some(set)), Some(ny(2025, 7, 11, 12, 0)));
        assert_eq!(set - rise, Duration::hours(30));
    }

    #[test]
    fn test_missing_half_passes_through() {
        let normalizer = NightBoundaryNormalizer::new(New_York);
        let set = ny(2025, 7, 10, 2, 41);
        assert_eq!(normalizer.normalize_set(None, Some(set)), Some(set));
        assert_eq!(normalizer.normalize_set(Some(set), None), None);
    }

    #[test]
    fn test_correction_across_spring_forward_keeps_wall_clock() {
        let normalizer = NightBoundaryNormalizer::new(New_York);
        let rise = ny(2025, 3, 8, 23, 30);
        let set = ny(2025, 3, 8, 4, 15);

        let corrected = normalizer.normalize_set(Some(rise), Some(set)).unwrap();
        assert_eq!(corrected, ny(2025, 3, 9, 4, 15));
        assert_eq!(corrected - set, Duration::hours(23));
    }

    #[test]
    fn test_set_more_than_a_day_early_is_dropped() {
        let normalizer = NightBoundaryNormalizer::new(New_York);
        let rise = ny(2025, 7, 10, 20, 0);
        let set = ny(2025, 7, 9, 8, 0);
        assert_eq!(normalizer.normalize_set(Some(rise), Some(set)), None);
    }

    #[test]
    fn test_apply_keeps_other_fields() {
        let normalizer = NightBoundaryNormalizer::new(New_York);
        let events = CelestialEventSet {
            rise: Some(ny(2025, 7, 10, 14, 2)),
            set: Some(ny(2025, 7, 10, 2, 41)),
            high_culmination: Some(ny(2025, 7, 10, 19, 30)),
            low_culmination: None,
            phase_label: Some("Waxing Gibbous".to_string()),
        };
        let normalized = normalizer.apply(events.clone());
        assert_eq!(normalized.set, Some(ny(2025, 7, 11, 2, 41)));
        assert_eq!(normalized.rise, events.rise);
        assert_eq!(normalized.high_culmination, events.high_culmination);
        assert_eq!(normalized.phase_label, events.phase_label);
    }
}
