//! Control signals shared between a controller and the crawl engine
//!
//! The controller mutates the run gate and the liveness flag; the engine only
//! observes them. The status cell goes the other way.

use crate::state::{SessionStatus, StatusCell};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Shared handle to a session's control signals
pub type SharedSignals = Arc<ControlSignals>;

/// A binary gate the engine waits on while it is closed
///
/// Only the current state matters: closing twice and opening once leaves the
/// gate open.
#[derive(Debug)]
pub struct RunGate {
    state: watch::Sender<bool>,
}

impl RunGate {
    /// Creates a gate in the given state
    pub fn new(open: bool) -> Self {
        let (state, _) = watch::channel(open);
        Self { state }
    }

    pub fn open(&self) {
        self.state.send_replace(true);
    }

    pub fn close(&self) {
        self.state.send_replace(false);
    }

    pub fn is_open(&self) -> bool {
        *self.state.borrow()
    }

    /// Suspends until the gate is open; returns immediately if it already is
    pub async fn wait_open(&self) {
        let mut receiver = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait
        let _ = receiver.wait_for(|open| *open).await;
    }
}

impl Default for RunGate {
    fn default() -> Self {
        Self::new(true)
    }
}

/// The run gate, liveness flag, and status of one session
#[derive(Debug, Default)]
pub struct ControlSignals {
    gate: RunGate,
    alive: AtomicBool,
    status: StatusCell,
}

impl ControlSignals {
    /// Creates signals for a fresh session: gate open, alive, status Idle
    pub fn new() -> Self {
        Self {
            gate: RunGate::new(true),
            alive: AtomicBool::new(true),
            status: StatusCell::new(SessionStatus::Idle),
        }
    }

    /// Creates a new shared handle
    pub fn shared() -> SharedSignals {
        Arc::new(Self::new())
    }

    pub fn gate(&self) -> &RunGate {
        &self.gate
    }

    /// Whether the session should keep going
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Clears the liveness flag; the engine stops at its next check
    pub fn kill(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    pub fn status(&self) -> SessionStatus {
        self.status.load()
    }

    pub(crate) fn set_status(&self, status: SessionStatus) {
        self.status.store(status);
    }
}
