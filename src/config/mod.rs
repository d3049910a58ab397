//! Configuration for skyarc: TOML file, defaults and validation.
//!
//! The configuration lives in `skyarc.toml` inside `$XDG_CONFIG_HOME/skyarc/`
//! (or the directory given with `--config`). A commented default file is
//! written on first run.
//!
//! ```toml
//! #[Observer]
//! latitude = 36.852900          # Geographic latitude (-90 to 90)
//! longitude = -75.978000        # Geographic longitude (-180 to 180)
//! timezone = "America/New_York" # IANA timezone (inferred from coordinates when absent)
//! elevation = 0.0               # Metres above sea level, sent to the service
//! body = "moon"                 # Body to track: "moon" or "sun"
//!
//! #[Sources]
//! primary_source = "almanac"    # Preferred source: "almanac" or "service"
//! secondary_source = "service"  # Fallback source, or "none"
//! service_url = "http://127.0.0.1:8000"
//! service_timeout = 10          # Request timeout in seconds (1-120)
//! rise_search_days = 1          # Days searched for the next rise (1-14)
//!
//! #[Refresh]
//! snapshot_interval = 60        # Position refresh in seconds
//! twilight_interval = 600       # Twilight refresh in seconds
//! events_interval = 1800        # Rise/set refresh in seconds
//!
//! [twilight_weights]
//! dark = 1.0
//! civil = 2.0
//! ```
//!
//! Every key is optional. Accessors on [`Config`] apply the defaults from
//! [`crate::common::constants`], and [`validation::validate_config`] rejects
//! out-of-range values when the file is loaded.

pub mod builder;
pub mod loading;
pub mod validation;

use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

use crate::common::constants::*;
use crate::events::{BodyKind, Coordinates, SourceKind};
use crate::twilight::PhaseWeights;

pub use builder::create_default_config;
pub use loading::{get_config_path, get_custom_config_dir, load, load_from_path, set_config_dir};

#[cfg(test)]
mod tests;

/// Per-phase display weights as written in the `[twilight_weights]` table.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct TwilightWeightsConfig {
    pub dark: Option<f64>,
    pub astronomical: Option<f64>,
    pub nautical: Option<f64>,
    pub civil: Option<f64>,
    pub day: Option<f64>,
}

/// Settings loaded from `skyarc.toml`.
///
/// ## Configuration Categories
///
/// - **Observer**: `latitude`, `longitude`, `timezone`, `elevation`, `body`
/// - **Sources**: `primary_source`, `secondary_source`, `service_url`,
///   `service_timeout`, `rise_search_days`
/// - **Refresh cadences**: `snapshot_interval`, `twilight_interval`,
///   `events_interval` (only used by `skyarc watch`)
/// - **Twilight display**: `twilight_weights`
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>, // IANA name, e.g. "Europe/Berlin"
    pub elevation: Option<f64>,   // metres
    pub body: Option<String>,     // "moon" or "sun"

    pub primary_source: Option<String>,
    /// Source consulted alongside the primary one; "none" disables it.
    pub secondary_source: Option<String>,
    pub service_url: Option<String>,
    pub service_timeout: Option<u64>, // seconds
    /// Days after today searched for the next rise while below the horizon.
    pub rise_search_days: Option<u32>,

    pub snapshot_interval: Option<u64>, // seconds
    pub twilight_interval: Option<u64>, // seconds
    pub events_interval: Option<u64>,   // seconds

    pub twilight_weights: Option<TwilightWeightsConfig>,
}

impl Config {
    /// Load configuration using the module's load function
    pub fn load() -> Result<Self> {
        load()
    }

    /// Load from path using the module's load_from_path function
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        load_from_path(path)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        get_config_path()
    }

    /// Observer coordinates if both are configured.
    pub fn coordinates(&self) -> Result<Option<Coordinates>> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Ok(Some(Coordinates::new(lat, lon)?)),
            (None, None) => Ok(None),
            _ => anyhow::bail!("latitude and longitude must be set together"),
        }
    }

    pub fn elevation(&self) -> f64 {
        self.elevation.unwrap_or(DEFAULT_ELEVATION)
    }

    pub fn body(&self) -> BodyKind {
        self.body
            .as_deref()
            .unwrap_or(DEFAULT_BODY)
            .parse()
            .unwrap_or(BodyKind::Moon)
    }

    pub fn primary_source(&self) -> SourceKind {
        self.primary_source
            .as_deref()
            .unwrap_or(DEFAULT_PRIMARY_SOURCE)
            .parse()
            .unwrap_or(SourceKind::Almanac)
    }

    /// The configured secondary source, defaulting to whichever source is
    /// not primary. `None` when disabled.
    pub fn secondary_source(&self) -> Option<SourceKind> {
        match self.secondary_source.as_deref().map(str::trim) {
            Some(name) if name.eq_ignore_ascii_case("none") => None,
            Some(name) => name.parse().ok(),
            None => Some(match self.primary_source() {
                SourceKind::Almanac => SourceKind::Service,
                SourceKind::Service => SourceKind::Almanac,
            }),
        }
    }

    /// Sources in preference order.
    pub fn sources(&self) -> Vec<SourceKind> {
        let mut sources = vec![self.primary_source()];
        if let Some(secondary) = self.secondary_source()
            && secondary != sources[0]
        {
            sources.push(secondary);
        }
        sources
    }

    pub fn service_url(&self) -> String {
        self.service_url
            .clone()
            .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string())
    }

    pub fn service_timeout(&self) -> u64 {
        self.service_timeout.unwrap_or(DEFAULT_SERVICE_TIMEOUT)
    }

    pub fn rise_search_days(&self) -> u32 {
        self.rise_search_days.unwrap_or(DEFAULT_RISE_SEARCH_DAYS)
    }

    pub fn snapshot_interval(&self) -> u64 {
        self.snapshot_interval.unwrap_or(DEFAULT_SNAPSHOT_INTERVAL)
    }

    pub fn twilight_interval(&self) -> u64 {
        self.twilight_interval.unwrap_or(DEFAULT_TWILIGHT_INTERVAL)
    }

    pub fn events_interval(&self) -> u64 {
        self.events_interval.unwrap_or(DEFAULT_EVENTS_INTERVAL)
    }

    pub fn phase_weights(&self) -> PhaseWeights {
        let defaults = PhaseWeights::default();
        let Some(table) = &self.twilight_weights else {
            return defaults;
        };
        PhaseWeights {
            dark: table.dark.unwrap_or(defaults.dark),
            astronomical: table.astronomical.unwrap_or(defaults.astronomical),
            nautical: table.nautical.unwrap_or(defaults.nautical),
            civil: table.civil.unwrap_or(defaults.civil),
            day: table.day.unwrap_or(defaults.day),
        }
    }

    pub fn log_config(&self) {
        log_block_start!("Loaded configuration");
        if let (Some(lat), Some(lon)) = (self.latitude, self.longitude) {
            log_indented!("Location: {lat:.4}°, {lon:.4}°");
        }
        if let Some(tz) = &self.timezone {
            log_indented!("Timezone: {tz}");
        }
        if let Some(elevation) = self.elevation {
            log_indented!("Elevation: {elevation:.0} m");
        }
        log_indented!("Body: {}", self.body().display_name());

        let sources: Vec<&str> = self.sources().iter().map(|s| s.as_str()).collect();
        log_indented!("Sources: {}", sources.join(" → "));
        if self.sources().contains(&SourceKind::Service) {
            log_indented!(
                "Service: {} (timeout {}s)",
                self.service_url(),
                self.service_timeout()
            );
        }
        log_indented!("Rise search: {} day(s)", self.rise_search_days());
        log_indented!(
            "Refresh: snapshot {}s, twilight {}s, events {}s",
            self.snapshot_interval(),
            self.twilight_interval(),
            self.events_interval()
        );
    }
}
