//! `skyarc twilight`: the day's twilight phases on a weighted timeline.

use anyhow::Result;
use serde::Serialize;

use super::{Session, format_duration, format_local, print_json};
use crate::engine::TwilightView;
use crate::twilight::{TwilightPhase, WeightedBand};

const BAR_WIDTH: usize = 48;

#[derive(Debug, Serialize)]
struct TwilightDocument<'a> {
    label: &'a str,
    timezone: &'a str,
    #[serde(flatten)]
    twilight: TwilightView,
}

pub fn handle_twilight_command(session: &Session) -> Result<()> {
    let now = session.now();
    let tz = session.tz();
    let view = session.engine.twilight(now)?;

    if session.json {
        return print_json(&TwilightDocument {
            label: &session.engine.observer().label,
            timezone: tz.name(),
            twilight: view,
        });
    }

    log_block_start!("Twilight for {} ({})", session.engine.observer().label, view.source);
    for segment in &view.segments {
        log_indented!(
            "{} - {}  {:<13} {}",
            format_local(Some(segment.start), tz),
            format_local(Some(segment.end), tz),
            segment.phase.as_str(),
            format_duration(segment.duration())
        );
    }

    let (bar, marker) = render_bar(&view.bands, view.position, BAR_WIDTH);
    log_block_start!("{bar}");
    log_indented!("{marker}");

    let sun = view.sun_events;
    if sun.sunrise.is_some() || sun.sunset.is_some() {
        log_indented!(
            "sunrise {}  sunset {}",
            format_local(sun.sunrise, tz),
            format_local(sun.sunset, tz)
        );
    }

    if let Some(phase) = view.current_phase {
        log_decorated!("Now: {phase} ({:.1}% through the day)", view.position * 100.0);
    }
    if let Some(next) = view.next_transition {
        log_indented!("next change {} (in {})", format_local(Some(next), tz), format_duration(next - now));
    }
    log_end!();
    Ok(())
}

fn glyph(phase: TwilightPhase) -> char {
    match phase {
        TwilightPhase::Dark => '·',
        TwilightPhase::Astronomical => '░',
        TwilightPhase::Nautical => '▒',
        TwilightPhase::Civil => '▓',
        TwilightPhase::Day => '█',
    }
}

/// Discretize weighted bands into `width` cells, plus a marker line under
/// the cell holding `position`.
pub(crate) fn render_bar(bands: &[WeightedBand], position: f64, width: usize) -> (String, String) {
    let width = width.max(1);

    let bar: String = (0..width)
        .map(|cell| {
            let center = (cell as f64 + 0.5) / width as f64;
            bands
                .iter()
                .find(|band| center >= band.start && center < band.end)
                .or_else(|| bands.last())
                .map_or(' ', |band| glyph(band.phase))
        })
        .collect();

    let marked = ((position.clamp(0.0, 1.0) * width as f64) as usize).min(width - 1);
    let marker = format!("{}▲", " ".repeat(marked));

    (bar, marker)
}
