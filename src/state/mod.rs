//! State module for tracking a crawl session
//!
//! # Components
//!
//! - `SessionStatus`: lifecycle of a session (idle, running, paused, completed, cancelled)
//! - `StatusCell`: lock-free status storage read by controllers
//! - `ControlSignals`: run gate and liveness flag shared with the controller

mod control;
mod session_status;

// Re-export main types
pub use control::{ControlSignals, RunGate, SharedSignals};
pub use session_status::{SessionStatus, StatusCell};
