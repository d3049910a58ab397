//! Observer location helpers: timezone inference and place labels.
//!
//! The timezone for a coordinate comes from the bundled timezone boundary
//! polygons of `tzf-rs`, so it works offline and matches the civil time
//! actually observed at the location rather than a longitude-based offset.
//!
//! [`resolve_place`] decides which location a run observes from: command-line
//! coordinates first, then the configuration file, then the place remembered
//! from the previous run.

use anyhow::{Context, Result};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use tzf_rs::DefaultFinder;

use crate::config::Config;
use crate::events::Coordinates;
use crate::store::{KeyValueStore, Place, load_last_place};


static FINDER: Lazy<DefaultFinder> = Lazy::new(DefaultFinder::new);

/// IANA timezone in force at `coords`.
///
/// Falls back to UTC when the boundary data has no usable answer.
pub fn timezone_for_coordinates(coords: Coordinates) -> Tz {
    let name = FINDER.get_tz_name(coords.longitude, coords.latitude);
    match name.parse::<Tz>() {
        Ok(tz) => tz,
        Err(_) => {
            log_warning!("No timezone found for {coords}; using UTC");
            Tz::UTC
        }
    }
}

/// An explicit timezone name if given, otherwise the one inferred from `coords`.
pub fn resolve_timezone(explicit: Option<&str>, coords: Coordinates) -> Result<Tz> {
    match explicit.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => parse_timezone(name),
        None => Ok(timezone_for_coordinates(coords)),
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("'{name}' is not an IANA timezone name"))
}

/// Human-readable place name derived from a timezone, e.g. "New York" for
/// `America/New_York`.
pub fn place_label(tz: Tz) -> String {
    let name = tz.name();
    name.rsplit('/')
        .next()
        .unwrap_or(name)
        .replace('_', " ")
}

/// Location given on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocationOverrides<'a> {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<&'a str>,
}

/// The place to observe from, with its timezone resolved to a valid IANA name.
pub fn resolve_place(
    overrides: LocationOverrides<'_>,
    config: &Config,
    store: &dyn KeyValueStore,
) -> Result<Place> {
    let (coords, fallback_tz) = match (overrides.latitude, overrides.longitude) {
        (Some(lat), Some(lon)) => (Coordinates::new(lat, lon)?, None),
        (None, None) => match config.coordinates()? {
            Some(coords) => (coords, config.timezone.clone()),
            None => match load_last_place(store)? {
                Some(place) => {
                    log_debug!("Using the last known place");
                    (place.coordinates()?, Some(place.timezone))
                }
                None => anyhow::bail!(
                    "No location configured: set latitude and longitude in skyarc.toml or pass --lat/--lon"
                ),
            },
        },
        _ => anyhow::bail!("--lat and --lon must be given together"),
    };

    let tz = resolve_timezone(overrides.timezone.or(fallback_tz.as_deref()), coords)?;
    Ok(Place {
        latitude: coords.latitude,
        longitude: coords.longitude,
        timezone: tz.name().to_string(),
        label: Some(place_label(tz)),
    })
}
