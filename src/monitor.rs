//! The `watch` refresh loop.
//!
//! Three cadences run independently against one [`Engine`]:
//!
//! - **snapshot** (default 60 s): instantaneous position of every source
//! - **events** (default 30 min): full reconciliation of rise/set/culminations
//! - **twilight** (default 10 min): twilight timeline of the current day
//!
//! Snapshots run on the loop thread. Events and twilight run on worker
//! threads so a slow service never holds up the next snapshot; a cadence
//! whose previous refresh is still running is skipped, not queued.
//!
//! A failed refresh never clears what is already displayed. When a fresh
//! snapshot disagrees with the horizon state the last reconciliation was
//! built on, the events cadence is forced so rise/set selection follows the
//! body across the horizon without waiting half an hour.

use chrono::Duration;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration as StdDuration, Instant as WallClock};

use crate::config::Config;
use crate::engine::{Engine, TwilightView};
use crate::events::{Instant, InstantSnapshot, SourceKind};
use crate::reconcile::Reconciliation;
use crate::signals::SignalState;
use crate::time::TimeSource;

/// Longest single sleep, bounding how late a shutdown signal is noticed.
const SLEEP_SLICE: StdDuration = StdDuration::from_millis(250);

/// How long a tick waits for running refreshes before returning.
const REFRESH_GRACE: StdDuration = StdDuration::from_millis(250);

/// Refresh intervals in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorIntervals {
    pub snapshot: u64,
    pub twilight: u64,
    pub events: u64,
}

impl Default for MonitorIntervals {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl MonitorIntervals {
    pub fn from_config(config: &Config) -> Self {
        Self {
            snapshot: config.snapshot_interval(),
            twilight: config.twilight_interval(),
            events: config.events_interval(),
        }
    }
}

struct Cadence {
    interval: Duration,
    last: Option<Instant>,
}

impl Cadence {
    fn new(seconds: u64) -> Self {
        Self {
            interval: Duration::seconds(seconds as i64),
            last: None,
        }
    }

    fn due(&self, now: Instant) -> bool {
        self.last.is_none_or(|last| now - last >= self.interval)
    }

    fn next_due(&self, now: Instant) -> Instant {
        self.last.map_or(now, |last| last + self.interval)
    }

    fn mark(&mut self, now: Instant) {
        self.last = Some(now);
    }
}

/// One refresh running on its own thread.
struct Background<T> {
    pending: Option<Receiver<T>>,
    ready: Option<T>,
}

impl<T: Send + 'static> Background<T> {
    fn idle() -> Self {
        Self {
            pending: None,
            ready: None,
        }
    }

    fn busy(&self) -> bool {
        self.pending.is_some() || self.ready.is_some()
    }

    fn start(&mut self, job: impl FnOnce() -> T + Send + 'static) {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(job());
        });
        self.pending = Some(rx);
    }

    /// Wait up to `timeout` for the result; true once one is ready.
    fn wait(&mut self, timeout: StdDuration) -> bool {
        if self.ready.is_some() {
            return true;
        }
        let Some(rx) = &self.pending else {
            return false;
        };

        match rx.recv_timeout(timeout) {
            Ok(value) => {
                self.ready = Some(value);
                self.pending = None;
                true
            }
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => {
                log_warning!("A background refresh stopped without a result");
                self.pending = None;
                false
            }
        }
    }

    fn take(&mut self) -> Option<T> {
        self.ready.take()
    }
}

/// Which parts of the state one tick refreshed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Refreshed {
    pub snapshot: bool,
    pub events: bool,
    pub twilight: bool,
}

impl Refreshed {
    pub fn any(&self) -> bool {
        self.snapshot || self.events || self.twilight
    }
}

/// Everything currently displayed; fields only ever move to newer values.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MonitorState {
    pub updated_at: Option<Instant>,
    pub snapshots: BTreeMap<SourceKind, InstantSnapshot>,
    pub reconciliation: Option<Reconciliation>,
    pub twilight: Option<TwilightView>,
}

pub struct Monitor {
    engine: Arc<Engine>,
    clock: Arc<dyn TimeSource>,
    snapshot: Cadence,
    events: Cadence,
    twilight: Cadence,
    events_job: Background<Reconciliation>,
    twilight_job: Background<anyhow::Result<TwilightView>>,
    state: MonitorState,
}

impl Monitor {
    pub fn new(engine: Arc<Engine>, clock: Arc<dyn TimeSource>, intervals: MonitorIntervals) -> Self {
        Self {
            engine,
            clock,
            snapshot: Cadence::new(intervals.snapshot),
            events: Cadence::new(intervals.events),
            twilight: Cadence::new(intervals.twilight),
            events_job: Background::idle(),
            twilight_job: Background::idle(),
            state: MonitorState::default(),
        }
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    /// Start every cadence due at the clock's current instant and apply
    /// whatever refreshes finish within a short grace period.
    pub fn tick(&mut self) -> Refreshed {
        let now = self.clock.now();
        let mut refreshed = Refreshed::default();

        if self.events.due(now) {
            self.start_events(now);
        }
        if self.twilight.due(now) {
            self.start_twilight(now);
        }

        if self.snapshot.due(now) {
            if self.refresh_snapshots(now) {
                log_debug!("Horizon state changed, refreshing events early");
                self.start_events(now);
            }
            self.snapshot.mark(now);
            refreshed.snapshot = true;
        }

        let deadline = WallClock::now() + REFRESH_GRACE;
        if self.events_job.wait(deadline.saturating_duration_since(WallClock::now()))
            && let Some(fresh) = self.events_job.take()
        {
            self.apply_events(fresh);
            refreshed.events = true;
        }
        if self.twilight_job.wait(deadline.saturating_duration_since(WallClock::now()))
            && let Some(result) = self.twilight_job.take()
        {
            self.apply_twilight(result);
            refreshed.twilight = true;
        }

        if refreshed.any() {
            self.state.updated_at = Some(now);
        }
        refreshed
    }

    /// Tick until a shutdown signal or until `max_ticks` refreshing ticks
    /// have run, calling `on_refresh` after each. Returns the tick count.
    pub fn run(
        &mut self,
        signals: &SignalState,
        max_ticks: Option<u64>,
        mut on_refresh: impl FnMut(&MonitorState, Refreshed),
    ) -> u64 {
        let mut ticks = 0;

        while signals.is_running() {
            let refreshed = self.tick();
            if refreshed.any() {
                ticks += 1;
                on_refresh(&self.state, refreshed);
            }
            if max_ticks.is_some_and(|max| ticks >= max) {
                break;
            }
            self.sleep_until_due(signals);
        }

        ticks
    }

    fn sleep_until_due(&mut self, signals: &SignalState) {
        let now = self.clock.now();
        let due = [&self.snapshot, &self.events, &self.twilight]
            .iter()
            .map(|cadence| cadence.next_due(now))
            .min()
            .unwrap_or(now);

        let mut remaining = (due - now).to_std().unwrap_or(StdDuration::ZERO);
        while !remaining.is_zero() && signals.is_running() {
            let slice = remaining.min(SLEEP_SLICE);
            self.clock.sleep(slice);
            remaining -= slice;

            // Show a slow refresh as soon as it lands
            if self.events_job.wait(StdDuration::ZERO) | self.twilight_job.wait(StdDuration::ZERO) {
                break;
            }
        }
    }

    /// Store fresh snapshots; true if any disagrees with the reconciled horizon.
    fn refresh_snapshots(&mut self, now: Instant) -> bool {
        let mut flipped = false;

        for (source, result) in self.engine.snapshots(now) {
            match result {
                Ok(snapshot) => {
                    if let Some(reconciliation) = &self.state.reconciliation
                        && let Some(horizon) = reconciliation.view(source).and_then(|v| v.horizon)
                        && horizon != snapshot.horizon()
                    {
                        flipped = true;
                    }
                    self.state.snapshots.insert(source, snapshot);
                }
                Err(e) => log_warning!("{e}; keeping the previous position"),
            }
        }

        flipped
    }

    fn start_events(&mut self, now: Instant) {
        self.events.mark(now);
        if self.events_job.busy() {
            log_debug!("Events refresh still running, skipping this one");
            return;
        }
        let engine = self.engine.clone();
        self.events_job.start(move || engine.evaluate(now));
    }

    fn start_twilight(&mut self, now: Instant) {
        self.twilight.mark(now);
        if self.twilight_job.busy() {
            log_debug!("Twilight refresh still running, skipping this one");
            return;
        }
        let engine = self.engine.clone();
        self.twilight_job.start(move || engine.twilight(now));
    }

    fn apply_events(&mut self, mut fresh: Reconciliation) {
        if let Some(previous) = &self.state.reconciliation {
            for view in fresh.views.iter_mut() {
                if view.is_available() {
                    continue;
                }
                if let Some(stale) = previous.view(view.source).filter(|v| v.is_available()) {
                    log_warning!("{} events unavailable; keeping the previous result", view.source);
                    *view = stale.clone();
                }
            }
        }

        self.state.reconciliation = Some(fresh);
    }

    fn apply_twilight(&mut self, result: anyhow::Result<TwilightView>) {
        match result {
            Ok(view) => self.state.twilight = Some(view),
            Err(e) if self.state.twilight.is_some() => {
                log_warning!("{e}; keeping the previous twilight");
            }
            Err(e) => log_warning!("{e}"),
        }
    }
}
