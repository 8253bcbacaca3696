//! Log sink for crawl progress lines
//!
//! The engine does not decide where its progress goes. It emits [`LogLine`]s
//! to an injected [`LogSink`]: either straight into `tracing`, or into a
//! channel drained by a log panel.

use chrono::{DateTime, Local};
use std::fmt;
use tokio::sync::mpsc::UnboundedSender;

/// Severity of a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

/// A single timestamped, leveled log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub level: LogLevel,
    pub timestamp: DateTime<Local>,
    pub message: String,
}

impl LogLine {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            timestamp: Local::now(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == LogLevel::Error
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] ({}) {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.level.as_str(),
            self.message
        )
    }
}

/// Receiver of crawl log lines
pub trait LogSink: Send + Sync {
    fn emit(&self, line: LogLine);

    fn info(&self, message: &str) {
        self.emit(LogLine::new(LogLevel::Info, message));
    }

    fn warn(&self, message: &str) {
        self.emit(LogLine::new(LogLevel::Warn, message));
    }

    fn error(&self, message: &str) {
        self.emit(LogLine::new(LogLevel::Error, message));
    }
}

/// Forwards lines to the `tracing` subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, line: LogLine) {
        match line.level {
            LogLevel::Info => tracing::info!("{}", line.message),
            LogLevel::Warn => tracing::warn!("{}", line.message),
            LogLevel::Error => tracing::error!("{}", line.message),
        }
    }
}

/// Queues lines for a consumer on another task or thread
///
/// Lines emitted after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: UnboundedSender<LogLine>,
}

impl ChannelSink {
    pub fn new(sender: UnboundedSender<LogLine>) -> Self {
        Self { sender }
    }
}

impl LogSink for ChannelSink {
    fn emit(&self, line: LogLine) {
        let _ = self.sender.send(line);
    }
}
