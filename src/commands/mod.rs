//! Command handlers for skyarc.
//!
//! Every command receives a [`Session`] holding the configured engine and the
//! clock, evaluates once (or repeatedly for `watch`) and prints either the
//! decorated log view or, with `--json`, one pretty-printed JSON document.

pub mod now;
pub mod place;
pub mod twilight;
pub mod watch;

use anyhow::Result;
use chrono_tz::Tz;
use serde::Serialize;
use std::sync::Arc;

use crate::args::Command;
use crate::engine::Engine;
use crate::events::Instant;
use crate::monitor::MonitorIntervals;
use crate::time::TimeSource;

/// Everything a command needs to run.
pub struct Session {
    pub engine: Arc<Engine>,
    pub clock: Arc<dyn TimeSource>,
    pub intervals: MonitorIntervals,
    pub json: bool,
}

impl Session {
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    pub fn tz(&self) -> Tz {
        self.engine.observer().tz
    }
}

/// Run the parsed command.
pub fn dispatch(command: Command, session: &Session) -> Result<()> {
    match command {
        Command::Now => now::handle_now_command(session),
        Command::Twilight => twilight::handle_twilight_command(session),
        Command::Watch { ticks } => watch::handle_watch_command(session, ticks),
        Command::Place => place::handle_place_command(session),
    }
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Local wall-clock rendering of an optional instant.
pub(crate) fn format_local(instant: Option<Instant>, tz: Tz) -> String {
    match instant {
        Some(instant) => instant.with_timezone(&tz).format("%a %H:%M").to_string(),
        None => "--".to_string(),
    }
}

/// Compact "2h 05m" style rendering of a non-negative span.
pub(crate) fn format_duration(span: chrono::Duration) -> String {
    let minutes = span.num_minutes().max(0);
    let (hours, minutes) = (minutes / 60, minutes % 60);
    if hours > 0 {
        format!("{hours}h {minutes:02}m")
    } else {
        format!("{minutes}m")
    }
}

/// A fixed-width track with a marker at `position` in [0, 1].
pub(crate) fn render_track(position: f64, width: usize) -> String {
    let width = width.max(2);
    let marker = ((position.clamp(0.0, 1.0) * (width - 1) as f64).round()) as usize;
    (0..width)
        .map(|i| if i == marker { '●' } else { '─' })
        .collect()
}
