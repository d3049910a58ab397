use chrono::{Days, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use proptest::prelude::*;
use skyarc::reconcile::NightBoundaryNormalizer;
use skyarc::time::resolve_local;

fn timezone_strategy() -> impl Strategy<Value = Tz> {
    prop_oneof![
        Just(chrono_tz::America::New_York),
        Just(chrono_tz::Europe::Berlin),
        Just(chrono_tz::Australia::Sydney),
        Just(chrono_tz::Asia::Kolkata),
        Just(chrono_tz::America::Santiago),
        Just(chrono_tz::UTC),
    ]
}

/// A calendar day plus two minutes-of-day with `set <= rise`.
fn same_day_strategy() -> impl Strategy<Value = (NaiveDate, u32, u32)> {
    (0u64..3650, 0u32..1440).prop_flat_map(|(offset, rise)| {
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + Days::new(offset);
        (Just(date), Just(rise), 0..=rise)
    })
}

fn at(tz: Tz, date: NaiveDate, minute_of_day: u32) -> chrono::DateTime<chrono::Utc> {
    let time = NaiveTime::from_hms_opt(minute_of_day / 60, minute_of_day % 60, 0).unwrap();
    resolve_local(tz, date.and_time(time)).with_timezone(&chrono::Utc)
}

proptest! {
    /// A set reported before its rise moves to the following calendar day and
    /// ends up after the rise.
    #[test]
    fn prop_corrected_set_follows_rise(
        tz in timezone_strategy(),
        (date, rise_minute, set_minute) in same_day_strategy(),
    ) {
        let rise = at(tz, date, rise_minute);
        let set = at(tz, date, set_minute);
        // Wall times inside a spring-forward gap resolve past it
        prop_assume!(set <= rise);

        let normalizer = NightBoundaryNormalizer::new(tz);
        let corrected = normalizer.normalize_set(Some(rise), Some(set));

        prop_assert!(corrected.is_some());
        let corrected = corrected.unwrap();
        prop_assert!(corrected > rise);

        let set_day = set.with_timezone(&tz).date_naive();
        let corrected_day = corrected.with_timezone(&tz).date_naive();
        prop_assert_eq!(corrected_day, set_day + Days::new(1));
    }

    /// Normalizing an already normalized pair changes nothing.
    #[test]
    fn prop_normalization_is_idempotent(
        tz in timezone_strategy(),
        (date, rise_minute, set_minute) in same_day_strategy(),
        swap in any::<bool>(),
    ) {
        let (first, second) = (at(tz, date, rise_minute), at(tz, date, set_minute));
        let (rise, set) = if swap { (second, first) } else { (first, second) };

        let normalizer = NightBoundaryNormalizer::new(tz);
        let once = normalizer.normalize_set(Some(rise), Some(set));
        let twice = normalizer.normalize_set(Some(rise), once);
        prop_assert_eq!(once, twice);
    }

    /// A set without a rise, or a rise without a set, passes through.
    #[test]
    fn prop_unpaired_events_pass_through(
        tz in timezone_strategy(),
        (date, minute, _) in same_day_strategy(),
    ) {
        let instant = at(tz, date, minute);
        let normalizer = NightBoundaryNormalizer::new(tz);
        prop_assert_eq!(normalizer.normalize_set(None, Some(instant)), Some(instant));
        prop_assert_eq!(normalizer.normalize_set(Some(instant), None), None);
    }
}
