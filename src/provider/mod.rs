//! Event providers: the two interchangeable data sources behind one trait.
//!
//! ## Module Structure
//!
//! - [`almanac`]: local low-precision almanac (the internal source)
//! - [`service`]: JSON client for the companion ephemeris web service (the
//!   external source), parameterized over a [`service::Transport`]
//! - [`http`]: the production `reqwest` transport with request timeouts
//! - [`ephemeris`]: Sun/Moon position model used by the almanac
//! - [`search`]: discrete-state search used to locate events in a time window
//! - `scripted`: fixed-schedule provider for tests (`testing-support` feature)
//!
//! Business logic never branches on which source it talks to. It holds
//! `&dyn EventProvider` / `&dyn TwilightProvider` values produced by
//! [`create_provider`] from configuration.

pub mod almanac;
pub mod ephemeris;
pub mod http;
#[cfg(any(test, feature = "testing-support"))]
pub mod scripted;
pub mod search;
pub mod service;

use anyhow::Result;
use std::fmt;
use std::time::Duration;

use crate::config::Config;
use crate::events::{BodyKind, CelestialEventSet, Coordinates, Instant, InstantSnapshot, SourceKind};
use crate::time::LocalDate;
use crate::twilight::TwilightReport;

pub use almanac::AlmanacProvider;
pub use http::HttpTransport;
pub use service::{ServiceProvider, Transport};

/// Failure of one provider query.
///
/// Every variant is local to one source and one evaluation; callers degrade
/// to absent data instead of failing the evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Network failure, timeout or non-success status
    Unavailable { source: SourceKind, reason: String },
    /// A response arrived but could not be decoded as a whole
    InvalidResponse { source: SourceKind, reason: String },
}

impl ProviderError {
    pub fn unavailable(source: SourceKind, reason: impl Into<String>) -> Self {
        ProviderError::Unavailable {
            source,
            reason: reason.into(),
        }
    }

    pub fn invalid_response(source: SourceKind, reason: impl Into<String>) -> Self {
        ProviderError::InvalidResponse {
            source,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Unavailable { source, reason } => {
                write!(f, "{source} unavailable: {reason}")
            }
            ProviderError::InvalidResponse { source, reason } => {
                write!(f, "{source} sent an unreadable response: {reason}")
            }
        }
    }
}

impl std::error::Error for ProviderError {}

/// Rise/set/culmination events and instantaneous position for a body.
#[cfg_attr(test, mockall::automock)]
pub trait EventProvider: Send + Sync {
    /// Tag identifying this source in reconciled output.
    fn source(&self) -> SourceKind;

    /// Events whose instants fall on `date` in the date's timezone.
    fn fetch_events(
        &self,
        coords: Coordinates,
        date: LocalDate,
        body: BodyKind,
    ) -> Result<CelestialEventSet, ProviderError>;

    /// Altitude, azimuth and illuminated fraction at `at`.
    fn fetch_instant(
        &self,
        coords: Coordinates,
        at: Instant,
        body: BodyKind,
    ) -> Result<InstantSnapshot, ProviderError>;
}

/// Twilight segments of one local day.
#[cfg_attr(test, mockall::automock)]
pub trait TwilightProvider: Send + Sync {
    fn fetch_twilight(
        &self,
        coords: Coordinates,
        date: LocalDate,
        reference: Instant,
    ) -> Result<TwilightReport, ProviderError>;
}

/// A source that can answer both event and twilight queries.
pub trait Provider: EventProvider + TwilightProvider {
    fn as_events(&self) -> &dyn EventProvider;
    fn as_twilight(&self) -> &dyn TwilightProvider;
}

impl<T: EventProvider + TwilightProvider> Provider for T {
    fn as_events(&self) -> &dyn EventProvider {
        self
    }

    fn as_twilight(&self) -> &dyn TwilightProvider {
        self
    }
}

/// Build the adapter for `kind` from configuration.
///
/// This is the only place that maps a source kind to a concrete type.
pub fn create_provider(kind: SourceKind, config: &Config) -> Result<Box<dyn Provider>> {
    match kind {
        SourceKind::Almanac => Ok(Box::new(AlmanacProvider::new())),
        SourceKind::Service => {
            let timeout = Duration::from_secs(config.service_timeout());
            let transport = HttpTransport::new(&config.service_url(), timeout)?;
            Ok(Box::new(
                ServiceProvider::new(transport).with_elevation(config.elevation()),
            ))
        }
    }
}
