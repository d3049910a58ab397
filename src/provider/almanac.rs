//! Locally computed almanac: the internal event and twilight source.
//!
//! Events are found by sampling the body's altitude (or hour angle) across the
//! requested local day and bisecting every state change. The Sun's rise and
//! set instants are then taken from the `sunrise` crate when it agrees with
//! the sampled crossing, which keeps solar times consistent with other tools
//! built on the same algorithm. Moon events and all twilight boundaries come
//! from the sampled search alone.

use chrono::Duration;
use sunrise::{SolarDay, SolarEvent};

use super::ephemeris::{self, body_position};
use super::search::find_discrete;
use super::{EventProvider, ProviderError, TwilightProvider};
use crate::common::constants::HORIZON_ALTITUDE;
use crate::events::{BodyKind, CelestialEventSet, Coordinates, Instant, InstantSnapshot, SourceKind};
use crate::time::LocalDate;
use crate::twilight::{SunEvents, TwilightPhase, TwilightReport, TwilightSegment};

/// The sampled crossing and the library value must agree this closely.
const SOLAR_AGREEMENT_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy, Default)]
pub struct AlmanacProvider;

impl AlmanacProvider {
    pub fn new() -> Self {
        Self
    }
}

fn altitude(body: BodyKind, coords: Coordinates, at: Instant) -> f64 {
    body_position(body, coords, at).horizontal.altitude_deg
}

/// Rise and set as the first upward and downward horizon crossings in the day.
fn horizon_crossings(
    body: BodyKind,
    coords: Coordinates,
    date: LocalDate,
) -> (Option<Instant>, Option<Instant>) {
    let crossings = find_discrete(date.start(), date.end(), |t| {
        (altitude(body, coords, t) > HORIZON_ALTITUDE) as i64
    });

    let rise = crossings.iter().find(|(_, up)| *up == 1).map(|(t, _)| *t);
    let set = crossings.iter().find(|(_, up)| *up == 0).map(|(t, _)| *t);
    (rise, set)
}

/// Upper and lower meridian transits in the day. The hour angle turns
/// non-negative (west of the meridian) at the upper transit.
fn culminations(
    body: BodyKind,
    coords: Coordinates,
    date: LocalDate,
) -> (Option<Instant>, Option<Instant>) {
    let transits = find_discrete(date.start(), date.end(), |t| {
        (body_position(body, coords, t).hour_angle_deg >= 0.0) as i64
    });

    let high = transits.iter().find(|(_, west)| *west == 1).map(|(t, _)| *t);
    let low = transits.iter().find(|(_, west)| *west == 0).map(|(t, _)| *t);
    (high, low)
}

/// Replace a sampled solar crossing with the `sunrise` crate's value for the
/// same event, if one lands inside the local day close to it.
fn refine_solar_event(
    coords: Coordinates,
    date: LocalDate,
    event: SolarEvent,
    sampled: Instant,
) -> Instant {
    let Some(coord) = sunrise::Coordinates::new(coords.latitude, coords.longitude) else {
        return sampled;
    };

    // The UTC date of a local-day event can be one day either side
    for offset in [0, -1, 1] {
        let utc_date = date.offset_days(offset).date();
        let candidate = SolarDay::new(coord, utc_date).event_time(event);
        if date.contains(candidate)
            && (candidate - sampled).abs() <= Duration::minutes(SOLAR_AGREEMENT_MINUTES)
        {
            return candidate;
        }
    }

    sampled
}

impl EventProvider for AlmanacProvider {
    fn source(&self) -> SourceKind {
        SourceKind::Almanac
    }

    fn fetch_events(
        &self,
        coords: Coordinates,
        date: LocalDate,
        body: BodyKind,
    ) -> Result<CelestialEventSet, ProviderError> {
        let (mut rise, mut set) = horizon_crossings(body, coords, date);
        let (high_culmination, low_culmination) = culminations(body, coords, date);

        if body == BodyKind::Sun {
            rise = rise.map(|t| refine_solar_event(coords, date, SolarEvent::Sunrise, t));
            set = set.map(|t| refine_solar_event(coords, date, SolarEvent::Sunset, t));
        }

        let phase_label = match body {
            BodyKind::Moon => {
                let midday = date.start() + (date.end() - date.start()) / 2;
                let position = body_position(body, coords, midday);
                Some(ephemeris::phase_name(position.phase_angle_deg).to_string())
            }
            BodyKind::Sun => None,
        };

        Ok(CelestialEventSet {
            rise,
            set,
            high_culmination,
            low_culmination,
            phase_label,
        })
    }

    fn fetch_instant(
        &self,
        coords: Coordinates,
        at: Instant,
        body: BodyKind,
    ) -> Result<InstantSnapshot, ProviderError> {
        let position = body_position(body, coords, at);
        let phase_label = match body {
            BodyKind::Moon => Some(ephemeris::phase_name(position.phase_angle_deg).to_string()),
            BodyKind::Sun => None,
        };

        Ok(InstantSnapshot {
            altitude_deg: position.horizontal.altitude_deg,
            azimuth_deg: position.horizontal.azimuth_deg,
            illuminated_fraction: position.illuminated_fraction,
            phase_label,
            distance_km: position.distance_km,
        })
    }
}

impl TwilightProvider for AlmanacProvider {
    fn fetch_twilight(
        &self,
        coords: Coordinates,
        date: LocalDate,
        reference: Instant,
    ) -> Result<TwilightReport, ProviderError> {
        let phase_at =
            |t: Instant| TwilightPhase::from_sun_altitude(altitude(BodyKind::Sun, coords, t));

        let (start, end) = (date.start(), date.end());
        let transitions = find_discrete(start, end, |t| phase_at(t).ordinal());

        let mut segments = Vec::with_capacity(transitions.len() + 1);
        let mut phase = phase_at(start);
        let mut segment_start = start;
        for (at, state) in &transitions {
            segments.push(TwilightSegment::new(phase, segment_start, *at));
            phase = TwilightPhase::from_ordinal(*state).unwrap_or_else(|| phase_at(*at));
            segment_start = *at;
        }
        segments.push(TwilightSegment::new(phase, segment_start, end));

        let next_transition = transitions
            .iter()
            .map(|(at, _)| *at)
            .find(|at| *at > reference);

        let sun = self.fetch_events(coords, date, BodyKind::Sun)?;

        Ok(TwilightReport {
            segments,
            current_phase: Some(phase_at(reference)),
            next_transition,
            sun_events: SunEvents {
                sunrise: sun.rise,
                sunset: sun.set,
            },
        })
    }
}
