//! Shutdown signal handling for the watch loop.
//!
//! SIGINT, SIGTERM and SIGHUP all clear a shared `running` flag. The loop
//! polls the flag between sleep slices, so it stops within one slice of the
//! signal arriving.

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM},
    iterator::Signals,
};
use std::{
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
    thread,
};

/// Signal handling state shared between threads
pub struct SignalState {
    /// Atomic flag indicating if the application should keep running
    pub running: Arc<AtomicBool>,
}

impl SignalState {
    /// A state no signal will ever clear; used by tests and one-shot commands.
    pub fn detached() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Register the shutdown signals and spawn the thread that watches them.
pub fn setup_signal_handler() -> Result<SignalState> {
    let running = Arc::new(AtomicBool::new(true));

    let mut signals =
        Signals::new([SIGINT, SIGTERM, SIGHUP]).context("failed to register signal handlers")?;

    let running_clone = running.clone();
    thread::spawn(move || {
        if let Some(signal) = signals.forever().next() {
            let name = match signal {
                SIGINT => "SIGINT",
                SIGTERM => "SIGTERM",
                _ => "SIGHUP",
            };
            log_pipe!();
            log_info!("Received {name}, stopping...");
            running_clone.store(false, Ordering::SeqCst);
        }
    });

    Ok(SignalState { running })
}
