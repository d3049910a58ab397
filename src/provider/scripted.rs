//! A deterministic provider for tests.
//!
//! The body rises and sets at the same local wall-clock times every day, sits
//! at +30° between them and at -30° otherwise. Twilight is a plain
//! dark / day / dark split at the same times. A shared switch makes every
//! query fail, and every event query is recorded.

use chrono::{NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::{EventProvider, ProviderError, TwilightProvider};
use crate::events::{BodyKind, CelestialEventSet, Coordinates, Instant, InstantSnapshot, SourceKind};
use crate::time::{LocalDate, resolve_local};
use crate::twilight::{TwilightPhase, TwilightReport, TwilightSegment};

pub struct ScriptedProvider {
    source: SourceKind,
    tz: Tz,
    rise: NaiveTime,
    set: NaiveTime,
    failing: Arc<AtomicBool>,
    queried: Mutex<Vec<NaiveDate>>,
}

impl ScriptedProvider {
    pub fn new(source: SourceKind, tz: Tz, rise: NaiveTime, set: NaiveTime) -> Self {
        Self {
            source,
            tz,
            rise,
            set,
            failing: Arc::new(AtomicBool::new(false)),
            queried: Mutex::new(Vec::new()),
        }
    }

    /// Setting the returned flag makes every following query fail.
    pub fn failure_switch(&self) -> Arc<AtomicBool> {
        self.failing.clone()
    }

    /// Dates passed to `fetch_events`, in call order.
    pub fn queried_dates(&self) -> Vec<NaiveDate> {
        match self.queried.lock() {
            Ok(dates) => dates.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn check(&self) -> Result<(), ProviderError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ProviderError::unavailable(self.source, "scripted outage"));
        }
        Ok(())
    }

    fn at(&self, date: NaiveDate, time: NaiveTime) -> Instant {
        resolve_local(self.tz, date.and_time(time)).with_timezone(&Utc)
    }

    fn is_up(&self, at: Instant) -> bool {
        let time = at.with_timezone(&self.tz).time();
        if self.rise < self.set {
            self.rise <= time && time < self.set
        } else {
            time >= self.rise || time < self.set
        }
    }
}

impl EventProvider for ScriptedProvider {
    fn source(&self) -> SourceKind {
        self.source
    }

    fn fetch_events(
        &self,
        _coords: Coordinates,
        date: LocalDate,
        _body: BodyKind,
    ) -> Result<CelestialEventSet, ProviderError> {
        if let Ok(mut queried) = self.queried.lock() {
            queried.push(date.date());
        }
        self.check()?;

        Ok(CelestialEventSet {
            rise: Some(self.at(date.date(), self.rise)),
            set: Some(self.at(date.date(), self.set)),
            ..Default::default()
        })
    }

    fn fetch_instant(
        &self,
        _coords: Coordinates,
        at: Instant,
        _body: BodyKind,
    ) -> Result<InstantSnapshot, ProviderError> {
        self.check()?;
        Ok(InstantSnapshot {
            altitude_deg: if self.is_up(at) { 30.0 } else { -30.0 },
            azimuth_deg: 180.0,
            illuminated_fraction: 0.5,
            phase_label: None,
            distance_km: None,
        })
    }
}

impl TwilightProvider for ScriptedProvider {
    fn fetch_twilight(
        &self,
        _coords: Coordinates,
        date: LocalDate,
        _reference: Instant,
    ) -> Result<TwilightReport, ProviderError> {
        self.check()?;
        let (rise, set) = (self.at(date.date(), self.rise), self.at(date.date(), self.set));
        let (first, second) = if rise < set { (rise, set) } else { (set, rise) };
        let middle = if rise < set { TwilightPhase::Day } else { TwilightPhase::Dark };
        let outer = if rise < set { TwilightPhase::Dark } else { TwilightPhase::Day };

        Ok(TwilightReport {
            segments: vec![
                TwilightSegment::new(outer, date.start(), first),
                TwilightSegment::new(middle, first, second),
                TwilightSegment::new(outer, second, date.end()),
            ],
            ..Default::default()
        })
    }
}
