//! `skyarc watch`: keep the display fresh until interrupted.

use anyhow::Result;

use super::{Session, format_local, print_json, render_track};
use crate::engine::CycleState;
use crate::monitor::{Monitor, MonitorState, Refreshed};
use crate::signals::{SignalState, setup_signal_handler};

pub fn handle_watch_command(session: &Session, ticks: Option<u64>) -> Result<()> {
    // A pinned clock fast-forwards through sleeps; without a bound it would spin forever
    let ticks = match ticks {
        None if session.clock.is_fixed() => {
            log_info!("--at without --ticks: stopping after one refresh");
            Some(1)
        }
        other => other,
    };

    let signals = if session.clock.is_fixed() {
        SignalState::detached()
    } else {
        setup_signal_handler()?
    };

    log_block_start!(
        "Watching the {} (snapshot {}s, twilight {}s, events {}s)",
        session.engine.body().display_name(),
        session.intervals.snapshot,
        session.intervals.twilight,
        session.intervals.events
    );

    let mut monitor = Monitor::new(session.engine.clone(), session.clock.clone(), session.intervals);
    let mut failure = None;
    let completed = monitor.run(&signals, ticks, |state, refreshed| {
        if failure.is_some() {
            return;
        }
        let outcome = if session.json {
            print_json(state)
        } else {
            display_refresh(session, state, refreshed);
            Ok(())
        };
        if let Err(e) = outcome {
            failure = Some(e);
            signals.running.store(false, std::sync::atomic::Ordering::SeqCst);
        }
    });

    if let Some(e) = failure {
        return Err(e);
    }

    log_block_start!("Stopped after {completed} refreshes");
    log_end!();
    Ok(())
}

fn display_refresh(session: &Session, state: &MonitorState, refreshed: Refreshed) {
    let tz = session.tz();
    let Some(at) = state.updated_at else {
        return;
    };

    let mut parts = Vec::new();
    if refreshed.snapshot {
        parts.push("position");
    }
    if refreshed.events {
        parts.push("events");
    }
    if refreshed.twilight {
        parts.push("twilight");
    }
    log_block_start!("{} refreshed {}", format_local(Some(at), tz), parts.join(", "));

    for (source, snapshot) in &state.snapshots {
        log_indented!(
            "{source}: altitude {:.1}°, azimuth {:.1}°",
            snapshot.altitude_deg,
            snapshot.azimuth_deg
        );
    }

    if let Some(view) = state.reconciliation.as_ref().and_then(|r| r.merged()) {
        let cycle = CycleState::from_view(&view, at);
        log_indented!(
            "rise {}  set {}  {}",
            format_local(view.rise, tz),
            format_local(view.set, tz),
            render_track(cycle.position, 24)
        );
    }

    if let Some(twilight) = &state.twilight
        && let Some(phase) = twilight.current_phase
    {
        log_indented!("twilight: {phase}, next change {}", format_local(twilight.next_transition, tz));
    }
}
