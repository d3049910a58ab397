//! Client for the companion ephemeris web service (the external source).
//!
//! The service answers three JSON endpoints:
//!
//! - `GET /{body}/events?date_iso&lat&lon&elev&tz` with rise, set, high/low
//!   culmination and phase name for one local date
//! - `GET /{body}/now?datetime_iso&lat&lon&elev` with altitude, azimuth,
//!   illuminated fraction and distance at one instant
//! - `GET /twilight?date_iso&datetime_iso&lat&lon&tz` with the day's twilight
//!   segments, current phase, next transition and sunrise/sunset
//!
//! A body that cannot be decoded at all is an [`ProviderError::InvalidResponse`].
//! A single timestamp that cannot be parsed only blanks that field.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::{EventProvider, ProviderError, TwilightProvider};
use crate::events::{BodyKind, CelestialEventSet, Coordinates, Instant, InstantSnapshot, SourceKind};
use crate::time::LocalDate;
use crate::twilight::{SunEvents, TwilightPhase, TwilightReport, TwilightSegment};

/// Performs one GET request against the service and returns the body text.
///
/// Implementations own timeouts and map every transport failure or
/// non-success status to [`ProviderError::Unavailable`].
pub trait Transport: Send + Sync {
    fn get(&self, path: &str, query: &[(&str, String)]) -> Result<String, ProviderError>;
}

#[derive(Debug, Deserialize)]
struct EventsPayload {
    #[serde(default)]
    rise: Option<Value>,
    #[serde(default)]
    set: Option<Value>,
    #[serde(default, alias = "high_moon", alias = "high")]
    high_culmination: Option<Value>,
    #[serde(default, alias = "low_moon", alias = "low")]
    low_culmination: Option<Value>,
    #[serde(default)]
    phase_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NowPayload {
    alt_deg: f64,
    az_deg: f64,
    #[serde(default)]
    illum_frac: Option<f64>,
    #[serde(default)]
    phase_name: Option<String>,
    #[serde(default)]
    distance_km: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TwilightPayload {
    #[serde(default)]
    current_phase: Option<String>,
    #[serde(default)]
    next_transition_local: Option<Value>,
    #[serde(default)]
    segments: Vec<SegmentPayload>,
    #[serde(default)]
    sun_events: Option<SunEventsPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SunEventsPayload {
    #[serde(default)]
    sunrise_local: Option<Value>,
    #[serde(default)]
    sunset_local: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SegmentPayload {
    phase: String,
    start_local: Value,
    end_local: Value,
}

/// Parse an ISO-8601 timestamp. Offset-less values are taken as UTC.
pub fn parse_timestamp(text: &str) -> Option<Instant> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}

/// Decode one optional timestamp field, blanking it when malformed.
fn timestamp_field(field: &str, value: Option<&Value>) -> Option<Instant> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) if text.trim().is_empty() => None,
        Some(Value::String(text)) => {
            let parsed = parse_timestamp(text);
            if parsed.is_none() {
                log_warning!("service field '{field}' has an unreadable timestamp: {text}");
            }
            parsed
        }
        Some(other) => {
            log_warning!("service field '{field}' is not a timestamp: {other}");
            None
        }
    }
}

/// The external source, generic over how requests reach the service.
pub struct ServiceProvider<T: Transport> {
    transport: T,
    elevation_m: f64,
}

impl<T: Transport> ServiceProvider<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            elevation_m: 0.0,
        }
    }

    /// Observer height above sea level sent with body queries.
    pub fn with_elevation(mut self, metres: f64) -> Self {
        self.elevation_m = metres;
        self
    }

    fn get_json<P: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<P, ProviderError> {
        let body = self.transport.get(path, query)?;
        serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(SourceKind::Service, format!("{path}: {e}"))
        })
    }
}

fn location_query(coords: Coordinates) -> Vec<(&'static str, String)> {
    vec![
        ("lat", coords.latitude.to_string()),
        ("lon", coords.longitude.to_string()),
    ]
}

fn utc_iso(instant: Instant) -> String {
    instant.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

impl<T: Transport> EventProvider for ServiceProvider<T> {
    fn source(&self) -> SourceKind {
        SourceKind::Service
    }

    fn fetch_events(
        &self,
        coords: Coordinates,
        date: LocalDate,
        body: BodyKind,
    ) -> Result<CelestialEventSet, ProviderError> {
        let mut query = vec![("date_iso", date.iso())];
        query.extend(location_query(coords));
        query.push(("elev", self.elevation_m.to_string()));
        query.push(("tz", date.tz().name().to_string()));

        let payload: EventsPayload = self.get_json(&format!("/{}/events", body.as_str()), &query)?;

        Ok(CelestialEventSet {
            rise: timestamp_field("rise", payload.rise.as_ref()),
            set: timestamp_field("set", payload.set.as_ref()),
            high_culmination: timestamp_field("high_moon", payload.high_culmination.as_ref()),
            low_culmination: timestamp_field("low_moon", payload.low_culmination.as_ref()),
            phase_label: payload.phase_name.filter(|name| !name.trim().is_empty()),
        })
    }

    fn fetch_instant(
        &self,
        coords: Coordinates,
        at: Instant,
        body: BodyKind,
    ) -> Result<InstantSnapshot, ProviderError> {
        let mut query = vec![("datetime_iso", utc_iso(at))];
        query.extend(location_query(coords));
        query.push(("elev", self.elevation_m.to_string()));

        let payload: NowPayload = self.get_json(&format!("/{}/now", body.as_str()), &query)?;
        if !payload.alt_deg.is_finite() || !payload.az_deg.is_finite() {
            return Err(ProviderError::invalid_response(
                SourceKind::Service,
                "non-finite altitude or azimuth",
            ));
        }

        let illuminated_fraction = match body {
            BodyKind::Sun => payload.illum_frac.unwrap_or(1.0),
            BodyKind::Moon => payload.illum_frac.unwrap_or(0.0),
        };

        Ok(InstantSnapshot {
            altitude_deg: payload.alt_deg,
            azimuth_deg: payload.az_deg.rem_euclid(360.0),
            illuminated_fraction: illuminated_fraction.clamp(0.0, 1.0),
            phase_label: payload.phase_name,
            distance_km: payload.distance_km.filter(|km| km.is_finite() && *km > 0.0),
        })
    }
}

impl<T: Transport> TwilightProvider for ServiceProvider<T> {
    fn fetch_twilight(
        &self,
        coords: Coordinates,
        date: LocalDate,
        reference: Instant,
    ) -> Result<TwilightReport, ProviderError> {
        let mut query = vec![("date_iso", date.iso()), ("datetime_iso", utc_iso(reference))];
        query.extend(location_query(coords));
        query.push(("tz", date.tz().name().to_string()));

        let payload: TwilightPayload = self.get_json("/twilight", &query)?;

        let segments = payload
            .segments
            .iter()
            .filter_map(|segment| {
                let phase = match segment.phase.parse::<TwilightPhase>() {
                    Ok(phase) => phase,
                    Err(e) => {
                        log_warning!("dropping twilight segment: {e}");
                        return None;
                    }
                };
                let start = timestamp_field("startLocal", Some(&segment.start_local))?;
                let end = timestamp_field("endLocal", Some(&segment.end_local))?;
                Some(TwilightSegment::new(phase, start, end))
            })
            .collect();

        let current_phase = payload
            .current_phase
            .as_deref()
            .and_then(|name| name.parse::<TwilightPhase>().ok());

        let sun_events = payload
            .sun_events
            .map(|sun| SunEvents {
                sunrise: timestamp_field("sunriseLocal", sun.sunrise_local.as_ref()),
                sunset: timestamp_field("sunsetLocal", sun.sunset_local.as_ref()),
            })
            .unwrap_or_default();

        Ok(TwilightReport {
            segments,
            current_phase,
            next_transition: timestamp_field(
                "nextTransitionLocal",
                payload.next_transition_local.as_ref(),
            ),
            sun_events,
        })
    }
}
