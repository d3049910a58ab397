//! In-memory data model shared by providers, the reconciler and the timelines.
//!
//! All instants are absolute UTC values ([`Instant`]) and are compared
//! numerically. Calendar days only appear as [`LocalDate`](crate::time::LocalDate)
//! query keys bound to the observer's timezone.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Absolute point in time.
pub type Instant = DateTime<Utc>;

/// Celestial body the engine tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyKind {
    Sun,
    Moon,
}

impl BodyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyKind::Sun => "sun",
            BodyKind::Moon => "moon",
        }
    }

    /// Capitalized name for log output.
    pub fn display_name(&self) -> &'static str {
        match self {
            BodyKind::Sun => "Sun",
            BodyKind::Moon => "Moon",
        }
    }
}

impl FromStr for BodyKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sun" => Ok(BodyKind::Sun),
            "moon" => Ok(BodyKind::Moon),
            other => anyhow::bail!("unknown body '{other}' (expected \"sun\" or \"moon\")"),
        }
    }
}

/// Which adapter produced a piece of data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Locally computed almanac
    Almanac,
    /// Remote ephemeris web service
    Service,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Almanac => "almanac",
            SourceKind::Service => "service",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "almanac" | "internal" => Ok(SourceKind::Almanac),
            "service" | "external" => Ok(SourceKind::Service),
            other => anyhow::bail!("unknown source '{other}' (expected \"almanac\" or \"service\")"),
        }
    }
}

/// Observer position in degrees. Construct through [`Coordinates::new`] so the
/// ranges are always checked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            anyhow::bail!("latitude must be between -90 and 90 degrees (got {latitude})");
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            anyhow::bail!("longitude must be between -180 and 180 degrees (got {longitude})");
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}°, {:.4}°", self.latitude, self.longitude)
    }
}

/// Events reported by one provider for one body and one local date.
///
/// Every field may legitimately be absent, for example a day without a
/// moonrise or a polar day without a sunset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CelestialEventSet {
    pub rise: Option<Instant>,
    pub set: Option<Instant>,
    pub high_culmination: Option<Instant>,
    pub low_culmination: Option<Instant>,
    pub phase_label: Option<String>,
}

/// Whether the body's altitude is currently positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizonState {
    Above,
    Below,
}

impl HorizonState {
    pub fn from_altitude(altitude_deg: f64) -> Self {
        if altitude_deg > 0.0 {
            HorizonState::Above
        } else {
            HorizonState::Below
        }
    }
}

/// Instantaneous position of a body for an observer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstantSnapshot {
    pub altitude_deg: f64,
    pub azimuth_deg: f64,
    pub illuminated_fraction: f64,
    pub phase_label: Option<String>,
    /// Distance to the body in kilometres, when the source reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

impl InstantSnapshot {
    pub fn horizon(&self) -> HorizonState {
        HorizonState::from_altitude(self.altitude_deg)
    }
}

/// Why a source's view is partial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SourceIssue {
    /// The primary-day query failed; every field is absent.
    ProviderUnavailable(String),
    /// The altitude query failed; the fields are the primary day's events
    /// without horizon-dependent selection.
    AmbiguousHorizonState(String),
}

/// The single displayed state for one source after normalization and selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledEventView {
    pub source: SourceKind,
    pub horizon: Option<HorizonState>,
    pub rise: Option<Instant>,
    pub set: Option<Instant>,
    pub high_culmination: Option<Instant>,
    pub low_culmination: Option<Instant>,
    pub phase_label: Option<String>,
    pub snapshot: Option<InstantSnapshot>,
    pub issue: Option<SourceIssue>,
}

impl ReconciledEventView {
    /// A view with no fields, used when the source could not be queried.
    pub fn unavailable(source: SourceKind, reason: impl Into<String>) -> Self {
        Self {
            source,
            horizon: None,
            rise: None,
            set: None,
            high_culmination: None,
            low_culmination: None,
            phase_label: None,
            snapshot: None,
            issue: Some(SourceIssue::ProviderUnavailable(reason.into())),
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.issue, Some(SourceIssue::ProviderUnavailable(_)))
    }
}
