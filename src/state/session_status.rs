/// Session status definitions for the crawl lifecycle
///
/// The engine is the only writer; controllers read the status concurrently
/// through [`StatusCell`] without taking a lock.
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Represents the lifecycle state of a crawl session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    /// Session created but not started yet
    Idle,

    /// Fetching and extracting pages
    Running,

    /// Suspended at the run gate, waiting for the controller to reopen it
    Paused,

    // ===== Terminal States =====
    /// Every listing page was processed; the export was attempted
    Completed,

    /// Stopped by the controller or by a fatal error; nothing was exported
    Cancelled,
}

impl SessionStatus {
    /// Returns true while the background task is alive
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Running => 1,
            Self::Paused => 2,
            Self::Completed => 3,
            Self::Cancelled => 4,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Running,
            2 => Self::Paused,
            3 => Self::Completed,
            4 => Self::Cancelled,
            _ => Self::Idle,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A session status stored in a single atomic word
#[derive(Debug)]
pub struct StatusCell(AtomicU8);

impl StatusCell {
    pub fn new(status: SessionStatus) -> Self {
        Self(AtomicU8::new(status.to_u8()))
    }

    pub fn load(&self) -> SessionStatus {
        SessionStatus::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn store(&self, status: SessionStatus) {
        self.0.store(status.to_u8(), Ordering::Release);
    }
}

impl Default for StatusCell {
    fn default() -> Self {
        Self::new(SessionStatus::Idle)
    }
}
