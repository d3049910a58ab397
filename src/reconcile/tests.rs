use super::*;
use crate::provider::MockEventProvider;
use crate::time::resolve_local;
use chrono::{NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::America::New_York;
use std::sync::{Arc, Mutex};

/// Rises at 08:00 and sets at 20:00 local time every day.
struct SyntheticProvider {
    source: SourceKind,
    tz: Tz,
    queried: Mutex<Vec<NaiveDate>>,
}

impl SyntheticProvider {
    fn new(source: SourceKind) -> Self {
        Self {
            source,
            tz: New_York,
            queried: Mutex::new(Vec::new()),
        }
    }

    fn queried(&self) -> Vec<NaiveDate> {
        self.queried.lock().unwrap().clone()
    }
}

fn local(date: NaiveDate, hour: u32) -> Instant {
    resolve_local(New_York, date.and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap()))
        .with_timezone(&Utc)
}

impl EventProvider for SyntheticProvider {
    fn source(&self) -> SourceKind {
        self.source
    }

    fn fetch_events(
        &self,
        _coords: Coordinates,
        date: LocalDate,
        _body: BodyKind,
    ) -> Result<CelestialEventSet, ProviderError> {
        self.queried.lock().unwrap().push(date.date());
        Ok(CelestialEventSet {
            rise: Some(local(date.date(), 8)),
            set: Some(local(date.date(), 20)),
            ..Default::default()
        })
    }

    fn fetch_instant(
        &self,
        _coords: Coordinates,
        at: Instant,
        _body: BodyKind,
    ) -> Result<InstantSnapshot, ProviderError> {
        let hour = at.with_timezone(&self.tz).hour();
        Ok(InstantSnapshot {
            altitude_deg: if (8..20).contains(&hour) { 30.0 } else { -30.0 },
            azimuth_deg: 180.0,
            illuminated_fraction: 0.5,
            phase_label: Some("First Quarter".to_string()),
            distance_km: None,
        })
    }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
}

fn coords() -> Coordinates {
    Coordinates::new(36.8529, -75.978).unwrap()
}

fn mock(source: SourceKind) -> MockEventProvider {
    let mut provider = MockEventProvider::new();
    provider.expect_source().return_const(source);
    provider
}

#[test]
fn test_above_horizon_shows_todays_rise_and_set() {
    let provider = SyntheticProvider::new(SourceKind::Almanac);
    let result = Reconciler::new(coords(), New_York, BodyKind::Moon)
        .source(&provider)
        .evaluate(local(day(10), 12));

    let view = result.view(SourceKind::Almanac).unwrap();
    assert_eq!(view.horizon, Some(HorizonState::Above));
    assert_eq!(view.rise, Some(local(day(10), 8)));
    assert_eq!(view.set, Some(local(day(10), 20)));
    assert_eq!(view.high_culmination, Some(local(day(10), 14)));
    assert_eq!(view.low_culmination, None);
    assert_eq!(view.phase_label.as_deref(), Some("First Quarter"));
    assert!(view.issue.is_none());

    // The prior day is compared for the rise; today's set needs no next day
    assert_eq!(provider.queried(), vec![day(10), day(9)]);
}

#[test]
fn test_below_horizon_after_set_shows_next_rise() {
    let provider = SyntheticProvider::new(SourceKind::Almanac);
    let result = Reconciler::new(coords(), New_York, BodyKind::Moon)
        .source(&provider)
        .evaluate(local(day(10), 22));

    let view = result.view(SourceKind::Almanac).unwrap();
    assert_eq!(view.horizon, Some(HorizonState::Below));
    assert_eq!(view.set, Some(local(day(10), 20)));
    assert_eq!(view.rise, Some(local(day(11), 8)));
    assert_eq!(view.low_culmination, Some(local(day(11), 2)));
    assert_eq!(view.high_culmination, None);
    assert_eq!(provider.queried(), vec![day(10), day(11), day(9)]);
}

#[test]
fn test_below_horizon_before_rise_shows_prior_set() {
    let provider = SyntheticProvider::new(SourceKind::Almanac);
    let result = Reconciler::new(coords(), New_York, BodyKind::Moon)
        .source(&provider)
        .evaluate(local(day(10), 3));

    let view = result.view(SourceKind::Almanac).unwrap();
    assert_eq!(view.horizon, Some(HorizonState::Below));
    assert_eq!(view.rise, Some(local(day(10), 8)));
    assert_eq!(view.set, Some(local(day(9), 20)));
    assert_eq!(provider.queried(), vec![day(10), day(9)]);
}

/// Mock whose events come from a per-date table, recording every queried date.
fn tabled(
    altitude_deg: f64,
    table: fn(NaiveDate) -> CelestialEventSet,
) -> (MockEventProvider, Arc<Mutex<Vec<NaiveDate>>>) {
    let queried = Arc::new(Mutex::new(Vec::new()));
    let log = queried.clone();
    let mut provider = mock(SourceKind::Service);
    provider.expect_fetch_events().returning(move |_, date, _| {
        log.lock().unwrap().push(date.date());
        Ok(table(date.date()))
    });
    provider.expect_fetch_instant().returning(move |_, _, _| {
        Ok(InstantSnapshot {
            altitude_deg,
            azimuth_deg: 90.0,
            illuminated_fraction: 0.3,
            phase_label: None,
            distance_km: None,
        })
    });
    (provider, queried)
}

#[test]
fn test_below_horizon_set_is_latest_across_days() {
    // Day 9's 10:00 set is moved onto day 10 and beats day 10's own 09:00 set
    let (provider, _) = tabled(-12.0, |date| {
        if date == day(9) {
            CelestialEventSet {
                rise: Some(local(day(9), 21)),
                set: Some(local(day(9), 10)),
                ..Default::default()
            }
        } else if date == day(10) {
            CelestialEventSet {
                set: Some(local(day(10), 9)),
                ..Default::default()
            }
        } else {
            CelestialEventSet::default()
        }
    });

    let result = Reconciler::new(coords(), New_York, BodyKind::Moon)
        .source(&provider)
        .evaluate(local(day(10), 12));

    let view = &result.views[0];
    assert_eq!(view.horizon, Some(HorizonState::Below));
    assert_eq!(view.set, Some(Utc.with_ymd_and_hms(2025, 6, 10, 14, 0, 0).unwrap()));
    assert_eq!(view.rise, None);
}

#[test]
fn test_above_horizon_takes_next_day_set_when_today_has_none() {
    let (provider, queried) = tabled(20.0, |date| CelestialEventSet {
        rise: Some(local(date, 8)),
        set: (date != day(10)).then(|| local(date, 20)),
        ..Default::default()
    });

    let result = Reconciler::new(coords(), New_York, BodyKind::Moon)
        .source(&provider)
        .evaluate(local(day(10), 12));

    let view = &result.views[0];
    assert_eq!(view.rise, Some(local(day(10), 8)));
    assert_eq!(view.set, Some(local(day(11), 20)));
    assert_eq!(*queried.lock().unwrap(), vec![day(10), day(9), day(11)]);
}

#[test]
fn test_above_horizon_takes_next_day_set_when_todays_has_passed() {
    let (provider, queried) = tabled(20.0, |date| CelestialEventSet {
        rise: Some(local(date, 8)),
        set: Some(local(date, 11)),
        ..Default::default()
    });

    let result = Reconciler::new(coords(), New_York, BodyKind::Moon)
        .source(&provider)
        .evaluate(local(day(10), 12));

    assert_eq!(result.views[0].set, Some(local(day(11), 11)));
    assert_eq!(*queried.lock().unwrap(), vec![day(10), day(9), day(11)]);
}

#[test]
fn test_identical_inputs_serialize_identically() {
    let provider = SyntheticProvider::new(SourceKind::Almanac);
    let reconciler = Reconciler::new(coords(), New_York, BodyKind::Moon).source(&provider);
    let now = local(day(10), 22);

    let first = serde_json::to_string(&reconciler.evaluate(now)).unwrap();
    let second = serde_json::to_string(&reconciler.evaluate(now)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_failed_source_leaves_other_fully_computed() {
    let healthy = SyntheticProvider::new(SourceKind::Almanac);
    let mut broken = mock(SourceKind::Service);
    broken
        .expect_fetch_events()
        .returning(|_, _, _| Err(ProviderError::unavailable(SourceKind::Service, "timed out")));
    broken
        .expect_fetch_instant()
        .returning(|_, _, _| Err(ProviderError::unavailable(SourceKind::Service, "timed out")));

    let result = Reconciler::new(coords(), New_York, BodyKind::Moon)
        .source(&healthy)
        .source(&broken)
        .evaluate(local(day(10), 12));

    let service = result.view(SourceKind::Service).unwrap();
    assert!(!service.is_available());
    assert!(service.rise.is_none() && service.set.is_none());

    let almanac = result.view(SourceKind::Almanac).unwrap();
    assert_eq!(almanac.rise, Some(local(day(10), 8)));
    assert_eq!(almanac.set, Some(local(day(10), 20)));

    let merged = result.merged().unwrap();
    assert_eq!(merged.source, SourceKind::Almanac);
    assert_eq!(merged.rise, almanac.rise);
}

#[test]
fn test_failed_altitude_query_returns_unfiltered_primary_day() {
    let mut provider = mock(SourceKind::Service);
    provider.expect_fetch_events().times(1).returning(|_, date, _| {
        Ok(CelestialEventSet {
            rise: Some(local(date.date(), 14)),
            set: Some(local(date.date(), 2)),
            ..Default::default()
        })
    });
    provider
        .expect_fetch_instant()
        .returning(|_, _, _| Err(ProviderError::unavailable(SourceKind::Service, "502")));

    let result = Reconciler::new(coords(), New_York, BodyKind::Moon)
        .source(&provider)
        .evaluate(local(day(10), 12));

    let view = &result.views[0];
    assert!(matches!(view.issue, Some(SourceIssue::AmbiguousHorizonState(_))));
    assert_eq!(view.horizon, None);
    assert_eq!(view.rise, Some(local(day(10), 14)));
    // Still normalized onto the following night
    assert_eq!(view.set, Some(local(day(11), 2)));
}

#[test]
fn test_rise_search_stops_at_configured_horizon() {
    let mut provider = mock(SourceKind::Almanac);
    // Today, the three following days and the prior day, each fetched once
    provider
        .expect_fetch_events()
        .times(5)
        .returning(|_, _, _| Ok(CelestialEventSet::default()));
    provider.expect_fetch_instant().returning(|_, _, _| {
        Ok(InstantSnapshot {
            altitude_deg: -10.0,
            azimuth_deg: 0.0,
            illuminated_fraction: 0.0,
            phase_label: None,
            distance_km: None,
        })
    });

    let result = Reconciler::new(coords(), New_York, BodyKind::Moon)
        .rise_search_days(3)
        .source(&provider)
        .evaluate(local(day(10), 12));

    let view = &result.views[0];
    assert_eq!(view.horizon, Some(HorizonState::Below));
    assert_eq!(view.rise, None);
    assert_eq!(view.set, None);
    assert_eq!(view.low_culmination, None);
}

#[test]
fn test_provider_culmination_passes_through() {
    let mut provider = mock(SourceKind::Service);
    provider.expect_fetch_events().returning(|_, date, _| {
        Ok(CelestialEventSet {
            rise: Some(local(date.date(), 8)),
            set: Some(local(date.date(), 20)),
            high_culmination: Some(local(date.date(), 13)),
            low_culmination: Some(local(date.date(), 1)),
            phase_label: Some("Waxing Gibbous".to_string()),
        })
    });
    provider.expect_fetch_instant().returning(|_, _, _| {
        Ok(InstantSnapshot {
            altitude_deg: 25.0,
            azimuth_deg: 140.0,
            illuminated_fraction: 0.8,
            phase_label: None,
            distance_km: None,
        })
    });

    let result = Reconciler::new(coords(), New_York, BodyKind::Moon)
        .source(&provider)
        .evaluate(local(day(10), 12));

    let view = &result.views[0];
    assert_eq!(view.high_culmination, Some(local(day(10), 13)));
    assert_eq!(view.low_culmination, Some(local(day(10), 1)));
    assert_eq!(view.phase_label.as_deref(), Some("Waxing Gibbous"));
}

#[test]
fn test_merged_view_fills_gaps_from_secondary() {
    let mut primary = mock(SourceKind::Almanac);
    primary.expect_fetch_events().returning(|_, date, _| {
        Ok(CelestialEventSet {
            set: Some(local(date.date(), 20)),
            ..Default::default()
        })
    });
    primary.expect_fetch_instant().returning(|_, _, _| {
        Ok(InstantSnapshot {
            altitude_deg: -5.0,
            azimuth_deg: 300.0,
            illuminated_fraction: 0.4,
            phase_label: None,
            distance_km: None,
        })
    });
    let secondary = SyntheticProvider::new(SourceKind::Service);

    let result = Reconciler::new(coords(), New_York, BodyKind::Moon)
        .source(&primary)
        .source(&secondary)
        .evaluate(local(day(10), 22));

    assert_eq!(result.view(SourceKind::Almanac).unwrap().rise, None);

    let merged = result.merged().unwrap();
    assert_eq!(merged.source, SourceKind::Almanac);
    assert_eq!(merged.set, Some(local(day(10), 20)));
    assert_eq!(merged.rise, Some(local(day(11), 8)));
    assert_eq!(merged.snapshot.unwrap().altitude_deg, -5.0);
}

#[test]
fn test_evaluation_across_fall_back_night() {
    // 2025-11-02 is 25 hours long in New York
    let provider = SyntheticProvider::new(SourceKind::Almanac);
    let now = New_York
        .with_ymd_and_hms(2025, 11, 1, 23, 0, 0)
        .unwrap()
        .with_timezone(&Utc);
    let result = Reconciler::new(coords(), New_York, BodyKind::Moon)
        .source(&provider)
        .evaluate(now);

    let view = &result.views[0];
    let next_rise = NaiveDate::from_ymd_opt(2025, 11, 2).unwrap();
    assert_eq!(view.rise, Some(local(next_rise, 8)));
    assert_eq!(view.low_culmination.unwrap() - view.set.unwrap(), chrono::Duration::minutes(390));
}
