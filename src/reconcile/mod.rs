//! Dual-source reconciliation of rise/set/culmination events.
//!
//! For each configured source the reconciler turns per-calendar-day event
//! sets into the single "current state" shown to the user:
//!
//! 1. The primary day's events and the instantaneous altitude are requested
//!    from every source at once and jointly awaited.
//! 2. The altitude decides the horizon state. Above the horizon the display
//!    shows the rise that already happened and the set still to come; below
//!    it, the set that already happened and the next rise.
//! 3. The event already passed is the latest one across today and the prior
//!    day, so the prior day is always fetched. The following days are only
//!    queried when today has no upcoming candidate. Those queries run in one
//!    worker per source and are memoized for the rest of the evaluation.
//!
//! Every result is a function of `now` and the provider data alone, so two
//! evaluations over the same data serialize to identical bytes.
//!
//! ## Module Structure
//!
//! - [`normalize`]: moves a set reported before its rise onto the next day
//! - [`fallback`]: the ordered "prefer A, else B, else computed" combinator

pub mod fallback;
pub mod normalize;

#[cfg(test)]
mod tests;

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::thread;

use crate::common::constants::{DEFAULT_RISE_SEARCH_DAYS, MAXIMUM_RISE_SEARCH_DAYS};
use crate::events::{
    BodyKind, CelestialEventSet, Coordinates, HorizonState, Instant, InstantSnapshot,
    ReconciledEventView, SourceIssue, SourceKind,
};
use crate::provider::{EventProvider, ProviderError};
use crate::time::LocalDate;

pub use fallback::Fallback;
pub use normalize::NightBoundaryNormalizer;

/// Views of every configured source at one instant, in configuration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub now: Instant,
    pub body: BodyKind,
    pub views: Vec<ReconciledEventView>,
}

impl Reconciliation {
    pub fn view(&self, source: SourceKind) -> Option<&ReconciledEventView> {
        self.views.iter().find(|view| view.source == source)
    }

    /// One display view preferring the first configured source per field.
    ///
    /// Only sources that agree with the preferred source's horizon state
    /// contribute, so an "above" rise is never mixed with a "below" set.
    pub fn merged(&self) -> Option<ReconciledEventView> {
        let base = self.views.iter().find(|view| view.is_available())?;
        let compatible: Vec<&ReconciledEventView> = self
            .views
            .iter()
            .filter(|view| view.is_available() && view.horizon == base.horizon)
            .collect();

        let pick = |field: fn(&ReconciledEventView) -> Option<Instant>| {
            compatible
                .iter()
                .fold(Fallback::new(), |chain, view| chain.or(field(*view)))
                .resolve()
        };

        Some(ReconciledEventView {
            source: base.source,
            horizon: base.horizon,
            rise: pick(|v| v.rise),
            set: pick(|v| v.set),
            high_culmination: pick(|v| v.high_culmination),
            low_culmination: pick(|v| v.low_culmination),
            phase_label: compatible
                .iter()
                .fold(Fallback::new(), |chain, view| chain.or(view.phase_label.clone()))
                .resolve(),
            snapshot: compatible
                .iter()
                .fold(Fallback::new(), |chain, view| chain.or(view.snapshot.clone()))
                .resolve(),
            issue: base.issue.clone(),
        })
    }
}

/// An event instant together with the local day whose event set reported it.
type Candidate = (LocalDate, Instant);

/// Lazily fetched, memoized, normalized event sets of one source.
struct DayLedger<'p> {
    provider: &'p dyn EventProvider,
    coords: Coordinates,
    body: BodyKind,
    normalizer: NightBoundaryNormalizer,
    days: RefCell<BTreeMap<NaiveDate, Option<CelestialEventSet>>>,
}

impl<'p> DayLedger<'p> {
    fn new(
        provider: &'p dyn EventProvider,
        coords: Coordinates,
        body: BodyKind,
        normalizer: NightBoundaryNormalizer,
        primary: (LocalDate, CelestialEventSet),
    ) -> Self {
        let mut days = BTreeMap::new();
        days.insert(primary.0.date(), Some(primary.1));
        Self {
            provider,
            coords,
            body,
            normalizer,
            days: RefCell::new(days),
        }
    }

    /// Events for `date`; a failed query counts as a day without events.
    fn events(&self, date: LocalDate) -> Option<CelestialEventSet> {
        if let Some(known) = self.days.borrow().get(&date.date()) {
            return known.clone();
        }

        let fetched = match self.provider.fetch_events(self.coords, date, self.body) {
            Ok(events) => Some(self.normalizer.apply(events)),
            Err(e) => {
                log_debug!("{e} (events for {date})");
                None
            }
        };
        self.days.borrow_mut().insert(date.date(), fetched.clone());
        fetched
    }

    fn field(
        &self,
        date: LocalDate,
        field: fn(&CelestialEventSet) -> Option<Instant>,
    ) -> Option<Candidate> {
        self.events(date)
            .as_ref()
            .and_then(field)
            .map(|instant| (date, instant))
    }

    fn rise(&self, date: LocalDate) -> Option<Candidate> {
        self.field(date, |e| e.rise)
    }

    fn set(&self, date: LocalDate) -> Option<Candidate> {
        self.field(date, |e| e.set)
    }
}

/// Selects the displayed events of every source for one observer.
pub struct Reconciler<'a> {
    coords: Coordinates,
    tz: Tz,
    body: BodyKind,
    rise_search_days: u32,
    sources: Vec<&'a dyn EventProvider>,
}

impl<'a> Reconciler<'a> {
    pub fn new(coords: Coordinates, tz: Tz, body: BodyKind) -> Self {
        Self {
            coords,
            tz,
            body,
            rise_search_days: DEFAULT_RISE_SEARCH_DAYS,
            sources: Vec::new(),
        }
    }

    /// Days after today searched for the next rise while below the horizon.
    pub fn rise_search_days(mut self, days: u32) -> Self {
        self.rise_search_days = days.clamp(1, MAXIMUM_RISE_SEARCH_DAYS);
        self
    }

    /// Add a source; earlier sources are preferred by [`Reconciliation::merged`].
    pub fn source(mut self, provider: &'a dyn EventProvider) -> Self {
        self.sources.push(provider);
        self
    }

    pub fn evaluate(&self, now: Instant) -> Reconciliation {
        let today = LocalDate::containing(now, self.tz);
        let (coords, body) = (self.coords, self.body);

        let primaries: Vec<PrimaryData> = thread::scope(|scope| {
            let pending: Vec<_> = self
                .sources
                .iter()
                .map(|provider| {
                    let events = scope.spawn(move || provider.fetch_events(coords, today, body));
                    let snapshot = scope.spawn(move || provider.fetch_instant(coords, now, body));
                    (provider.source(), events, snapshot)
                })
                .collect();

            pending
                .into_iter()
                .map(|(source, events, snapshot)| PrimaryData {
                    events: events.join().unwrap_or_else(|_| Err(panicked(source))),
                    snapshot: snapshot.join().unwrap_or_else(|_| Err(panicked(source))),
                })
                .collect()
        });

        let views = thread::scope(|scope| {
            let pending: Vec<_> = self
                .sources
                .iter()
                .zip(primaries)
                .map(|(provider, primary)| {
                    let worker = scope.spawn(move || self.select(*provider, today, now, primary));
                    (provider.source(), worker)
                })
                .collect();

            pending
                .into_iter()
                .map(|(source, worker)| {
                    worker.join().unwrap_or_else(|_| {
                        ReconciledEventView::unavailable(source, "event selection panicked")
                    })
                })
                .collect()
        });

        Reconciliation { now, body, views }
    }

    fn select(
        &self,
        provider: &dyn EventProvider,
        today: LocalDate,
        now: Instant,
        primary: PrimaryData,
    ) -> ReconciledEventView {
        let source = provider.source();
        let normalizer = NightBoundaryNormalizer::new(self.tz);

        let today_events = match primary.events {
            Ok(events) => normalizer.apply(events),
            Err(e) => {
                log_warning!("{e}");
                return ReconciledEventView::unavailable(source, e.to_string());
            }
        };

        let snapshot = match primary.snapshot {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log_warning!("{e}; showing {today} events without horizon selection");
                return ReconciledEventView {
                    source,
                    horizon: None,
                    rise: today_events.rise,
                    set: today_events.set,
                    high_culmination: today_events.high_culmination,
                    low_culmination: today_events.low_culmination,
                    phase_label: today_events.phase_label,
                    snapshot: None,
                    issue: Some(SourceIssue::AmbiguousHorizonState(e.to_string())),
                };
            }
        };

        let today_phase = today_events.phase_label.clone();
        let ledger = DayLedger::new(
            provider,
            self.coords,
            self.body,
            normalizer,
            (today, today_events),
        );

        let horizon = snapshot.horizon();
        let (rise, set) = match horizon {
            HorizonState::Above => {
                let rise = latest_until(now, [ledger.rise(today), ledger.rise(today.pred())]);
                // The prior day's set still counts when the normalizer moved
                // it into today
                let set = Fallback::new()
                    .then(|| earliest_from(now, [ledger.set(today), ledger.set(today.pred())]))
                    .then(|| ledger.set(today.succ()).filter(|(_, t)| *t >= now))
                    .resolve();
                (rise, set)
            }
            HorizonState::Below => {
                let rise = (0..=i64::from(self.rise_search_days))
                    .fold(Fallback::new(), |chain, offset| {
                        let ledger = &ledger;
                        chain.then(move || {
                            ledger
                                .rise(today.offset_days(offset))
                                .filter(|(_, t)| *t >= now)
                        })
                    })
                    .resolve();
                let set = latest_until(now, [ledger.set(today), ledger.set(today.pred())]);
                (rise, set)
            }
        };

        let culmination = |field: fn(&CelestialEventSet) -> Option<Instant>| {
            Fallback::new()
                .then(|| rise.and_then(|(day, _)| ledger.field(day, field)))
                .then(|| set.and_then(|(day, _)| ledger.field(day, field)))
                .resolve()
                .map(|(_, instant)| instant)
        };

        let (rise, set) = (rise.map(|(_, t)| t), set.map(|(_, t)| t));
        let midpoint = match (rise, set) {
            (Some(rise), Some(set)) => Some(if rise < set {
                (rise + (set - rise) / 2, true)
            } else {
                (set + (rise - set) / 2, false)
            }),
            _ => None,
        };

        // The arc between rise and set holds the upper transit, the gap
        // between set and rise the lower one
        let high_culmination = Fallback::new()
            .or(culmination(|e| e.high_culmination))
            .or(midpoint.filter(|(_, upper)| *upper).map(|(t, _)| t))
            .resolve();
        let low_culmination = Fallback::new()
            .or(culmination(|e| e.low_culmination))
            .or(midpoint.filter(|(_, upper)| !*upper).map(|(t, _)| t))
            .resolve();

        let phase_label = Fallback::new()
            .or(snapshot.phase_label.clone())
            .or(today_phase)
            .resolve();

        ReconciledEventView {
            source,
            horizon: Some(horizon),
            rise,
            set,
            high_culmination,
            low_culmination,
            phase_label,
            snapshot: Some(snapshot),
            issue: None,
        }
    }
}

struct PrimaryData {
    events: Result<CelestialEventSet, ProviderError>,
    snapshot: Result<InstantSnapshot, ProviderError>,
}

/// The latest candidate at or before `now`.
///
/// A prior day's set moved forward by the normalizer can land later than
/// today's own set, so both days are always compared.
fn latest_until<const N: usize>(now: Instant, candidates: [Option<Candidate>; N]) -> Option<Candidate> {
    candidates
        .into_iter()
        .flatten()
        .filter(|(_, t)| *t <= now)
        .max_by_key(|(_, t)| *t)
}

/// The earliest candidate at or after `now`.
fn earliest_from<const N: usize>(now: Instant, candidates: [Option<Candidate>; N]) -> Option<Candidate> {
    candidates
        .into_iter()
        .flatten()
        .filter(|(_, t)| *t >= now)
        .min_by_key(|(_, t)| *t)
}

fn panicked(source: SourceKind) -> ProviderError {
    ProviderError::unavailable(source, "query panicked")
}
