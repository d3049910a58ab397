//! One observer, one body, the configured sources: everything needed to answer
//! "what is the sky doing now".
//!
//! The engine owns the provider adapters built from configuration and runs
//! the reconciler and twilight segmenter over them. It never reads the clock;
//! callers pass `now`.

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::Serialize;

use crate::common::constants::DEFAULT_RISE_SEARCH_DAYS;
use crate::config::Config;
use crate::cycle::{CycleInputs, curve_height, cycle_position};
use crate::events::{BodyKind, Coordinates, Instant, InstantSnapshot, ReconciledEventView, SourceKind};
use crate::provider::{Provider, ProviderError, create_provider};
use crate::reconcile::{Reconciler, Reconciliation};
use crate::time::LocalDate;
use crate::twilight::{
    PhaseWeights, SunEvents, TwilightPhase, TwilightSegment, TwilightTimeline, WeightedBand,
};

/// Where the sky is observed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observer {
    pub coords: Coordinates,
    #[serde(serialize_with = "serialize_tz")]
    pub tz: Tz,
    pub label: String,
}

fn serialize_tz<S: serde::Serializer>(tz: &Tz, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(tz.name())
}

/// Position on the display curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CycleState {
    pub position: f64,
    pub height: f64,
}

impl CycleState {
    pub fn from_view(view: &ReconciledEventView, now: Instant) -> Self {
        let position = cycle_position(&CycleInputs::from_view(view), now);
        Self {
            position,
            height: curve_height(position),
        }
    }
}

/// Twilight of the current local day from the first source that had it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TwilightView {
    pub source: SourceKind,
    pub segments: Vec<TwilightSegment>,
    pub bands: Vec<WeightedBand>,
    pub position: f64,
    pub current_phase: Option<TwilightPhase>,
    pub next_transition: Option<Instant>,
    pub sun_events: SunEvents,
}

pub struct Engine {
    observer: Observer,
    body: BodyKind,
    rise_search_days: u32,
    weights: PhaseWeights,
    providers: Vec<Box<dyn Provider>>,
}

impl Engine {
    pub fn new(observer: Observer, body: BodyKind, providers: Vec<Box<dyn Provider>>) -> Self {
        Self {
            observer,
            body,
            rise_search_days: DEFAULT_RISE_SEARCH_DAYS,
            weights: PhaseWeights::default(),
            providers,
        }
    }

    /// Build the configured sources in preference order.
    pub fn from_config(config: &Config, observer: Observer, body: BodyKind) -> Result<Self> {
        let providers = config
            .sources()
            .into_iter()
            .map(|kind| {
                create_provider(kind, config)
                    .with_context(|| format!("Failed to set up the {kind} source"))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(observer, body, providers)
            .with_rise_search_days(config.rise_search_days())
            .with_weights(config.phase_weights()))
    }

    pub fn with_rise_search_days(mut self, days: u32) -> Self {
        self.rise_search_days = days;
        self
    }

    pub fn with_weights(mut self, weights: PhaseWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn observer(&self) -> &Observer {
        &self.observer
    }

    pub fn body(&self) -> BodyKind {
        self.body
    }

    pub fn sources(&self) -> Vec<SourceKind> {
        self.providers
            .iter()
            .map(|p| p.as_events().source())
            .collect()
    }

    /// Reconciled rise/set/culmination views of every source.
    pub fn evaluate(&self, now: Instant) -> Reconciliation {
        let reconciler = self.providers.iter().fold(
            Reconciler::new(self.observer.coords, self.observer.tz, self.body)
                .rise_search_days(self.rise_search_days),
            |reconciler, provider| reconciler.source(provider.as_events()),
        );
        reconciler.evaluate(now)
    }

    /// Instantaneous positions only, for the fast refresh cadence.
    pub fn snapshots(&self, now: Instant) -> Vec<(SourceKind, Result<InstantSnapshot, ProviderError>)> {
        self.providers
            .iter()
            .map(|provider| {
                let events = provider.as_events();
                (
                    events.source(),
                    events.fetch_instant(self.observer.coords, now, self.body),
                )
            })
            .collect()
    }

    /// Twilight timeline of today, preferring sources in configured order.
    pub fn twilight(&self, now: Instant) -> Result<TwilightView> {
        let today = LocalDate::containing(now, self.observer.tz);

        for provider in &self.providers {
            let source = provider.as_events().source();
            let report = match provider
                .as_twilight()
                .fetch_twilight(self.observer.coords, today, now)
            {
                Ok(report) => report,
                Err(e) => {
                    log_warning!("{e}");
                    continue;
                }
            };

            let timeline = match TwilightTimeline::new(report.segments, self.weights) {
                Ok(timeline) => timeline,
                Err(e) => {
                    log_warning!("{source} twilight rejected: {e}");
                    continue;
                }
            };

            let status = timeline.query(now);
            return Ok(TwilightView {
                source,
                segments: timeline.segments().to_vec(),
                bands: timeline.bands(),
                position: status.position,
                current_phase: report.current_phase.or(status.current_phase),
                next_transition: report.next_transition.or(status.next_transition),
                sun_events: report.sun_events,
            });
        }

        anyhow::bail!("No source could provide twilight for {today}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::AlmanacProvider;
    use chrono::{TimeZone, Utc};

    fn engine() -> Engine {
        let observer = Observer {
            coords: Coordinates::new(40.7128, -74.0060).unwrap(),
            tz: chrono_tz::America::New_York,
            label: "New York".to_string(),
        };
        Engine::new(observer, BodyKind::Sun, vec![Box::new(AlmanacProvider::new())])
    }

    #[test]
    fn test_sun_at_noon_is_above_with_todays_events() {
        let engine = engine();
        let now = Utc.with_ymd_and_hms(2025, 6, 21, 17, 0, 0).unwrap();
        let result = engine.evaluate(now);

        let view = result.view(SourceKind::Almanac).unwrap();
        assert_eq!(view.horizon, Some(crate::events::HorizonState::Above));
        assert!(view.rise.unwrap() < now && now < view.set.unwrap());

        let cycle = CycleState::from_view(view, now);
        assert!(cycle.position > 0.25 && cycle.position < 0.75);
        assert!(cycle.height > 0.0);
    }

    #[test]
    fn test_twilight_from_almanac() {
        let engine = engine();
        let now = Utc.with_ymd_and_hms(2025, 3, 20, 23, 0, 0).unwrap();
        let twilight = engine.twilight(now).unwrap();

        assert_eq!(twilight.source, SourceKind::Almanac);
        assert!(twilight.position > 0.5 && twilight.position < 1.0);
        assert!(twilight.current_phase.is_some());
        assert_eq!(twilight.bands.len(), twilight.segments.len());

        let sun = twilight.sun_events;
        assert!(sun.sunrise.unwrap() < now && now < sun.sunset.unwrap());
    }

    #[test]
    fn test_snapshots_cover_every_source() {
        let engine = engine();
        let now = Utc.with_ymd_and_hms(2025, 6, 21, 17, 0, 0).unwrap();
        let snapshots = engine.snapshots(now);
        assert_eq!(snapshots.len(), 1);
        assert!(snapshots[0].1.as_ref().unwrap().altitude_deg > 0.0);
    }
}
