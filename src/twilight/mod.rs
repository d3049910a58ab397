//! Twilight phases and the weighted twilight timeline.
//!
//! A twilight day is a contiguous run of [`TwilightSegment`]s. The timeline
//! stretches each segment by a per-phase weight so that short but visually
//! interesting phases (civil, nautical) get more room than their duration
//! alone would give them. Weights are display widths, not durations.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::common::constants::{
    ASTRONOMICAL_TWILIGHT_ALTITUDE, CIVIL_TWILIGHT_ALTITUDE, DEFAULT_WEIGHT_ASTRONOMICAL,
    DEFAULT_WEIGHT_CIVIL, DEFAULT_WEIGHT_DARK, DEFAULT_WEIGHT_DAY, DEFAULT_WEIGHT_NAUTICAL,
    HORIZON_ALTITUDE, NAUTICAL_TWILIGHT_ALTITUDE,
};
use crate::events::Instant;


/// Sky brightness class by solar altitude, darkest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TwilightPhase {
    Dark,
    Astronomical,
    Nautical,
    Civil,
    Day,
}

impl TwilightPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TwilightPhase::Dark => "dark",
            TwilightPhase::Astronomical => "astronomical",
            TwilightPhase::Nautical => "nautical",
            TwilightPhase::Civil => "civil",
            TwilightPhase::Day => "day",
        }
    }

    /// Classify a solar altitude in degrees.
    pub fn from_sun_altitude(altitude_deg: f64) -> Self {
        if altitude_deg >= HORIZON_ALTITUDE {
            TwilightPhase::Day
        } else if altitude_deg >= CIVIL_TWILIGHT_ALTITUDE {
            TwilightPhase::Civil
        } else if altitude_deg >= NAUTICAL_TWILIGHT_ALTITUDE {
            TwilightPhase::Nautical
        } else if altitude_deg >= ASTRONOMICAL_TWILIGHT_ALTITUDE {
            TwilightPhase::Astronomical
        } else {
            TwilightPhase::Dark
        }
    }

    /// Ordinal used as the discrete search state (0 = dark .. 4 = day).
    pub fn ordinal(&self) -> i64 {
        *self as i64
    }

    pub fn from_ordinal(ordinal: i64) -> Option<Self> {
        match ordinal {
            0 => Some(TwilightPhase::Dark),
            1 => Some(TwilightPhase::Astronomical),
            2 => Some(TwilightPhase::Nautical),
            3 => Some(TwilightPhase::Civil),
            4 => Some(TwilightPhase::Day),
            _ => None,
        }
    }
}

impl fmt::Display for TwilightPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TwilightPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" | "night" => Ok(TwilightPhase::Dark),
            "astronomical" => Ok(TwilightPhase::Astronomical),
            "nautical" => Ok(TwilightPhase::Nautical),
            "civil" => Ok(TwilightPhase::Civil),
            "day" => Ok(TwilightPhase::Day),
            other => Err(format!("unknown twilight phase '{other}'")),
        }
    }
}

/// One labeled interval `[start, end)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwilightSegment {
    pub phase: TwilightPhase,
    pub start: Instant,
    pub end: Instant,
}

impl TwilightSegment {
    pub fn new(phase: TwilightPhase, start: Instant, end: Instant) -> Self {
        Self { phase, start, end }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn contains(&self, instant: Instant) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// The day's sunrise and sunset, reported next to the twilight segments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SunEvents {
    pub sunrise: Option<Instant>,
    pub sunset: Option<Instant>,
}

/// Everything a provider knows about one local day's twilight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TwilightReport {
    pub segments: Vec<TwilightSegment>,
    pub current_phase: Option<TwilightPhase>,
    pub next_transition: Option<Instant>,
    #[serde(default)]
    pub sun_events: SunEvents,
}

/// Display width multiplier per phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseWeights {
    pub dark: f64,
    pub astronomical: f64,
    pub nautical: f64,
    pub civil: f64,
    pub day: f64,
}

impl Default for PhaseWeights {
    fn default() -> Self {
        Self {
            dark: DEFAULT_WEIGHT_DARK,
            astronomical: DEFAULT_WEIGHT_ASTRONOMICAL,
            nautical: DEFAULT_WEIGHT_NAUTICAL,
            civil: DEFAULT_WEIGHT_CIVIL,
            day: DEFAULT_WEIGHT_DAY,
        }
    }
}

impl PhaseWeights {
    pub fn weight(&self, phase: TwilightPhase) -> f64 {
        match phase {
            TwilightPhase::Dark => self.dark,
            TwilightPhase::Astronomical => self.astronomical,
            TwilightPhase::Nautical => self.nautical,
            TwilightPhase::Civil => self.civil,
            TwilightPhase::Day => self.day,
        }
    }

    fn check(&self) -> Result<(), TimelineError> {
        for phase in [
            TwilightPhase::Dark,
            TwilightPhase::Astronomical,
            TwilightPhase::Nautical,
            TwilightPhase::Civil,
            TwilightPhase::Day,
        ] {
            let weight = self.weight(phase);
            if !weight.is_finite() || weight < 0.0 {
                return Err(TimelineError::InvalidWeight { phase, weight });
            }
        }
        Ok(())
    }
}

/// Why a segment sequence cannot form a timeline.
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineError {
    /// No segment with positive duration
    Empty,
    /// Consecutive segments leave uncovered time
    Gap { after: Instant, before: Instant },
    /// Consecutive segments cover the same time twice
    Overlap { end: Instant, next_start: Instant },
    InvalidWeight { phase: TwilightPhase, weight: f64 },
}

impl fmt::Display for TimelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimelineError::Empty => write!(f, "twilight timeline has no segments"),
            TimelineError::Gap { after, before } => {
                write!(f, "twilight segments leave a gap from {after} to {before}")
            }
            TimelineError::Overlap { end, next_start } => write!(
                f,
                "twilight segments overlap: a segment ends at {end} after the next starts at {next_start}"
            ),
            TimelineError::InvalidWeight { phase, weight } => {
                write!(f, "weight for {phase} must be a non-negative number (got {weight})")
            }
        }
    }
}

impl std::error::Error for TimelineError {}

/// A segment's extent on the weighted [0, 1] axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeightedBand {
    pub phase: TwilightPhase,
    pub start: f64,
    pub end: f64,
}

/// Answer to "where are we in the twilight day".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TwilightStatus {
    pub position: f64,
    pub current_phase: Option<TwilightPhase>,
    pub next_transition: Option<Instant>,
}

/// Contiguous weighted twilight segments for one window.
#[derive(Debug, Clone)]
pub struct TwilightTimeline {
    segments: Vec<TwilightSegment>,
    weights: PhaseWeights,
    total_weighted: f64,
}

impl TwilightTimeline {
    /// Build a timeline, dropping segments whose end is not after their start.
    pub fn new(segments: Vec<TwilightSegment>, weights: PhaseWeights) -> Result<Self, TimelineError> {
        weights.check()?;

        let segments: Vec<TwilightSegment> =
            segments.into_iter().filter(|s| s.end > s.start).collect();
        if segments.is_empty() {
            return Err(TimelineError::Empty);
        }

        for pair in segments.windows(2) {
            let (current, next) = (&pair[0], &pair[1]);
            if current.end < next.start {
                return Err(TimelineError::Gap {
                    after: current.end,
                    before: next.start,
                });
            }
            if current.end > next.start {
                return Err(TimelineError::Overlap {
                    end: current.end,
                    next_start: next.start,
                });
            }
        }

        let total_weighted = segments
            .iter()
            .map(|s| weighted_seconds(s, &weights))
            .sum();

        Ok(Self {
            segments,
            weights,
            total_weighted,
        })
    }

    pub fn segments(&self) -> &[TwilightSegment] {
        &self.segments
    }

    pub fn start(&self) -> Instant {
        self.segments[0].start
    }

    pub fn end(&self) -> Instant {
        self.segments[self.segments.len() - 1].end
    }

    /// Weighted position of `t` in [0, 1]. Instants outside the window clamp.
    pub fn position(&self, t: Instant) -> f64 {
        if t <= self.start() {
            return 0.0;
        }
        if t >= self.end() {
            return 1.0;
        }
        if self.total_weighted <= 0.0 {
            return 0.0;
        }

        let mut before = 0.0;
        for segment in &self.segments {
            if segment.end <= t {
                before += weighted_seconds(segment, &self.weights);
                continue;
            }
            let partial = seconds(t - segment.start) * self.weights.weight(segment.phase);
            before += partial;
            break;
        }

        (before / self.total_weighted).clamp(0.0, 1.0)
    }

    /// Phase of the segment containing `t`.
    pub fn phase_at(&self, t: Instant) -> Option<TwilightPhase> {
        self.segments
            .iter()
            .find(|s| s.contains(t))
            .map(|s| s.phase)
    }

    /// First boundary after `after` where the phase actually changes.
    pub fn next_transition(&self, after: Instant) -> Option<Instant> {
        self.segments
            .windows(2)
            .filter(|pair| pair[0].phase != pair[1].phase)
            .map(|pair| pair[1].start)
            .find(|start| *start > after)
    }

    pub fn query(&self, now: Instant) -> TwilightStatus {
        TwilightStatus {
            position: self.position(now),
            current_phase: self.phase_at(now),
            next_transition: self.next_transition(now),
        }
    }

    /// Each segment's weighted extent, for the discretized timeline.
    pub fn bands(&self) -> Vec<WeightedBand> {
        let mut cursor = 0.0;
        self.segments
            .iter()
            .map(|segment| {
                let width = if self.total_weighted > 0.0 {
                    weighted_seconds(segment, &self.weights) / self.total_weighted
                } else {
                    0.0
                };
                let band = WeightedBand {
                    phase: segment.phase,
                    start: cursor,
                    end: (cursor + width).min(1.0),
                };
                cursor = band.end;
                band
            })
            .collect()
    }
}

fn seconds(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 1000.0
}

fn weighted_seconds(segment: &TwilightSegment, weights: &PhaseWeights) -> f64 {
    seconds(segment.duration()) * weights.weight(segment.phase)
}
