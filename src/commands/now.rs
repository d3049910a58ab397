//! `skyarc now`: reconciled rise/set/culmination state of every source.

use anyhow::Result;
use chrono_tz::Tz;
use serde::Serialize;

use super::{Session, format_duration, format_local, print_json, render_track};
use crate::engine::{CycleState, Observer};
use crate::events::{HorizonState, Instant, ReconciledEventView, SourceIssue};
use crate::reconcile::Reconciliation;

const TRACK_WIDTH: usize = 48;

/// JSON document printed by `now --json`.
#[derive(Debug, Serialize)]
pub struct NowReport<'a> {
    pub observer: &'a Observer,
    #[serde(flatten)]
    pub reconciliation: Reconciliation,
    pub merged: Option<ReconciledEventView>,
    pub cycle: Option<CycleState>,
}

pub fn handle_now_command(session: &Session) -> Result<()> {
    let now = session.now();
    let engine = &session.engine;
    let reconciliation = engine.evaluate(now);
    let merged = reconciliation.merged();
    let cycle = merged.as_ref().map(|view| CycleState::from_view(view, now));

    if session.json {
        return print_json(&NowReport {
            observer: engine.observer(),
            reconciliation,
            merged,
            cycle,
        });
    }

    let observer = engine.observer();
    log_block_start!(
        "{} for {} ({})",
        engine.body().display_name(),
        observer.label,
        observer.tz.name()
    );
    log_indented!("{}", observer.coords);
    log_indented!("at {}", now.with_timezone(&observer.tz).format("%Y-%m-%d %H:%M:%S %Z"));

    for view in &reconciliation.views {
        display_view(view, observer.tz, now);
    }

    if let Some(cycle) = cycle {
        log_block_start!("Cycle position {:.3} (height {:+.2})", cycle.position, cycle.height);
        log_indented!("rise {} set", render_track(cycle.position, TRACK_WIDTH));
    } else {
        log_pipe!();
        log_warning!("No source could be evaluated");
    }
    log_end!();
    Ok(())
}

fn display_view(view: &ReconciledEventView, tz: Tz, now: Instant) {
    let horizon = match view.horizon {
        Some(HorizonState::Above) => "above the horizon",
        Some(HorizonState::Below) => "below the horizon",
        None => "horizon unknown",
    };
    log_block_start!("{}: {horizon}", view.source);

    match &view.issue {
        Some(SourceIssue::ProviderUnavailable(reason)) => {
            log_warning!("{reason}");
            return;
        }
        Some(SourceIssue::AmbiguousHorizonState(reason)) => {
            log_warning!("position unknown ({reason}); showing today's events");
        }
        None => {}
    }

    log_indented!("rise       {}{}", format_local(view.rise, tz), relative(view.rise, now));
    log_indented!("set        {}{}", format_local(view.set, tz), relative(view.set, now));
    log_indented!("high       {}", format_local(view.high_culmination, tz));
    log_indented!("low        {}", format_local(view.low_culmination, tz));
    if let Some(snapshot) = &view.snapshot {
        log_indented!(
            "altitude   {:.1}°  azimuth {:.1}°  lit {:.0}%",
            snapshot.altitude_deg,
            snapshot.azimuth_deg,
            snapshot.illuminated_fraction * 100.0
        );
    }
    if let Some(label) = &view.phase_label {
        log_indented!("phase      {label}");
    }
}

fn relative(instant: Option<Instant>, now: Instant) -> String {
    match instant {
        Some(instant) if instant > now => format!("  (in {})", format_duration(instant - now)),
        Some(instant) => format!("  ({} ago)", format_duration(now - instant)),
        None => String::new(),
    }
}
