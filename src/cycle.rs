//! Mapping of the current instant onto a fixed single-peak curve.
//!
//! Position 0.25 is the rise, 0.5 the peak, 0.75 the set; the gap between set
//! and the next rise fills [0.75, 1.0) and wraps to 0. The arc is padded by
//! half its length on each side so rise and set land exactly at 0.25 and 0.75.

use std::f64::consts::TAU;

use crate::events::{HorizonState, Instant, ReconciledEventView};

/// Event instants the position is computed from.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CycleInputs {
    pub rise: Option<Instant>,
    pub set: Option<Instant>,
    pub prior_set: Option<Instant>,
    pub next_rise: Option<Instant>,
}

impl CycleInputs {
    /// Above the horizon the view's rise and set bound the current arc; below
    /// it they bound the current gap.
    pub fn from_view(view: &ReconciledEventView) -> Self {
        match view.horizon {
            Some(HorizonState::Below) => Self {
                prior_set: view.set,
                next_rise: view.rise,
                ..Self::default()
            },
            _ => Self {
                rise: view.rise,
                set: view.set,
                ..Self::default()
            },
        }
    }
}

/// Position in [0, 1] of `now` in the rise → peak → set → gap cycle.
pub fn cycle_position(inputs: &CycleInputs, now: Instant) -> f64 {
    if let (Some(prior_set), Some(next_rise)) = (inputs.prior_set, inputs.next_rise) {
        if prior_set < now && now < next_rise {
            let gap_fraction = fraction(now - prior_set, next_rise - prior_set);
            return (0.75 + 0.25 * gap_fraction).clamp(0.0, 1.0);
        }
    }

    if let (Some(rise), Some(set)) = (inputs.rise, inputs.set) {
        if set > rise {
            let pad = (set - rise) / 2;
            let start = rise - pad;
            let end = set + pad;
            return fraction(now - start, end - start).clamp(0.0, 1.0);
        }
    }

    0.25
}

/// Height of the display curve at `position`: −1 at the lowest point, 0 at
/// rise and set, 1 at the peak.
pub fn curve_height(position: f64) -> f64 {
    -(TAU * position).cos()
}

fn fraction(part: chrono::Duration, whole: chrono::Duration) -> f64 {
    let whole = whole.num_milliseconds() as f64;
    if whole <= 0.0 {
        return 0.0;
    }
    part.num_milliseconds() as f64 / whole
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::SourceKind;
    use chrono::{TimeZone, Utc};

    fn at(hour: u32, minute: u32) -> Instant {
        Utc.with_ymd_and_hms(2025, 6, 10, hour, minute, 0).unwrap()
    }

    fn arc() -> CycleInputs {
        CycleInputs {
            rise: Some(at(6, 0)),
            set: Some(at(18, 0)),
            ..Default::default()
        }
    }

    #[test]
    fn test_rise_peak_and_set_positions() {
        assert_eq!(cycle_position(&arc(), at(6, 0)), 0.25);
        assert_eq!(cycle_position(&arc(), at(12, 0)), 0.5);
        assert_eq!(cycle_position(&arc(), at(18, 0)), 0.75);
    }

    #[test]
    fn test_gap_midpoint() {
        let inputs = CycleInputs {
            prior_set: Some(at(18, 0)),
            next_rise: Some(Utc.with_ymd_and_hms(2025, 6, 11, 6, 0, 0).unwrap()),
            ..Default::default()
        };
        assert_eq!(cycle_position(&inputs, at(0, 0) + chrono::Duration::days(1)), 0.875);
    }

    #[test]
    fn test_clamps_outside_padded_arc() {
        assert_eq!(cycle_position(&arc(), at(0, 0) - chrono::Duration::hours(2)), 0.0);
        assert_eq!(cycle_position(&arc(), at(23, 59) + chrono::Duration::hours(2)), 1.0);
    }

    #[test]
    fn test_unknown_events_default_to_rise() {
        assert_eq!(cycle_position(&CycleInputs::default(), at(12, 0)), 0.25);

        let inverted = CycleInputs {
            rise: Some(at(18, 0)),
            set: Some(at(6, 0)),
            ..Default::default()
        };
        assert_eq!(cycle_position(&inverted, at(12, 0)), 0.25);
    }

    #[test]
    fn test_from_view_uses_horizon() {
        let mut view = ReconciledEventView::unavailable(SourceKind::Almanac, "n/a");
        view.issue = None;
        view.horizon = Some(HorizonState::Below);
        view.set = Some(at(18, 0));
        view.rise = Some(Utc.with_ymd_and_hms(2025, 6, 11, 6, 0, 0).unwrap());

        let inputs = CycleInputs::from_view(&view);
        assert_eq!(inputs.prior_set, Some(at(18, 0)));
        assert!(inputs.rise.is_none());
        assert_eq!(cycle_position(&inputs, at(21, 0)), 0.8125);
    }

    #[test]
    fn test_curve_height() {
        assert!((curve_height(0.0) + 1.0).abs() < 1e-12);
        assert!(curve_height(0.25).abs() < 1e-12);
        assert!((curve_height(0.5) - 1.0).abs() < 1e-12);
        assert!(curve_height(0.75).abs() < 1e-12);
    }
}
