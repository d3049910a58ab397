//! Discrete-state search over a time window.
//!
//! A state function maps an instant to a small integer (above/below a
//! threshold, which twilight phase, which side of the meridian). The window is
//! sampled at a fixed step and every sample pair whose states differ is
//! bisected down to [`SEARCH_EPSILON_SECONDS`]. Events closer together than one
//! step can be missed; the step is small enough that rise/set and phase
//! boundaries of the Sun and Moon never are.

use chrono::Duration;

use crate::common::constants::{SEARCH_EPSILON_SECONDS, SEARCH_STEP_SECONDS};
use crate::events::Instant;

/// A state change found by [`find_discrete`]: the first instant of the new
/// state (to within the epsilon) and the new state value.
pub type Transition = (Instant, i64);

/// Find every change of `state` within `[start, end)`.
///
/// Transitions are returned in time order and always lie strictly after
/// `start` and strictly before `end`.
pub fn find_discrete<F>(start: Instant, end: Instant, state: F) -> Vec<Transition>
where
    F: Fn(Instant) -> i64,
{
    find_discrete_with_step(start, end, Duration::seconds(SEARCH_STEP_SECONDS), state)
}

pub fn find_discrete_with_step<F>(
    start: Instant,
    end: Instant,
    step: Duration,
    state: F,
) -> Vec<Transition>
where
    F: Fn(Instant) -> i64,
{
    let mut transitions = Vec::new();
    if end <= start || step <= Duration::zero() {
        return transitions;
    }

    let mut left = start;
    let mut left_state = state(left);
    while left < end {
        let right = (left + step).min(end);
        let right_state = state(right);

        if right_state != left_state {
            let (at, new_state) = bisect(left, left_state, right, &state);
            if at < end {
                transitions.push((at, new_state));
            }
        }

        left = right;
        left_state = right_state;
    }

    transitions
}

fn bisect<F>(mut low: Instant, low_state: i64, mut high: Instant, state: &F) -> Transition
where
    F: Fn(Instant) -> i64,
{
    let epsilon = Duration::seconds(SEARCH_EPSILON_SECONDS);
    let mut high_state = state(high);

    while high - low > epsilon {
        let mid = low + (high - low) / 2;
        let mid_state = state(mid);
        if mid_state == low_state {
            low = mid;
        } else {
            high = mid;
            high_state = mid_state;
        }
    }

    (high, high_state)
}
