//! # skyarc
//!
//! Sun and Moon rise/set reconciliation for one observer across two
//! independently behaving almanac sources.
//!
//! ## Architecture
//!
//! - **Data model**: `events` (instants, event sets, snapshots, reconciled
//!   views) and `time` (timezone-bound local dates, the clock abstraction)
//! - **Sources**: `provider` with the locally computed almanac and the remote
//!   ephemeris service behind one `EventProvider` trait
//! - **Core**: `reconcile` (night-boundary normalization, horizon-aware
//!   selection, per-field fallback), `cycle` (periodic curve position) and
//!   `twilight` (weighted phase timeline)
//! - **Application**: `engine` ties configured sources to an observer,
//!   `monitor` runs the refresh cadences, `commands` renders results
//! - **Infrastructure**: `config`, `geo`, `store`, `signals`, logging

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

pub mod args;
pub mod commands;
pub mod common;
pub mod config;
pub mod cycle;
pub mod engine;
pub mod events;
pub mod geo;
pub mod monitor;
pub mod provider;
pub mod reconcile;
pub mod signals;
pub mod store;
pub mod time;
pub mod twilight;

pub use engine::{Engine, Observer};
pub use events::{BodyKind, Coordinates, Instant, SourceKind};
