//! Crawl counters and the finalize-and-report summary
//!
//! Counters live for one session. The fetcher and the engine update them
//! through a [`CounterHandle`]; controllers read snapshots for progress
//! display while the crawl runs.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Running totals for one crawl session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counters {
    /// Fetch attempts made, including failed ones
    pub requests_sent: u64,

    /// Always equal to `requests_sent`; failed attempts count as received
    pub responses_received: u64,

    /// Occurrences of each HTTP status code, ordered by code
    pub status_codes: BTreeMap<u16, u64>,

    /// Sum of the field counts of every extracted record
    pub fields_scraped: u64,
}

impl Counters {
    /// Creates zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one fetch attempt, before its outcome is known
    pub fn record_attempt(&mut self) {
        self.requests_sent += 1;
        self.responses_received += 1;
    }

    pub fn record_status(&mut self, status_code: u16) {
        *self.status_codes.entry(status_code).or_insert(0) += 1;
    }

    pub fn add_fields(&mut self, count: usize) {
        self.fields_scraped += count as u64;
    }
}

/// Shared, thread-safe access to a session's counters
#[derive(Debug, Clone, Default)]
pub struct CounterHandle {
    inner: Arc<Mutex<Counters>>,
}

impl CounterHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` with exclusive access to the counters
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Counters),
    {
        f(&mut self.lock());
    }

    /// Returns a copy of the current counters
    pub fn snapshot(&self) -> Counters {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Counters> {
        // Counter updates cannot leave the struct half-written, so a poisoned
        // lock still holds consistent data
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Formats elapsed time as `H:MM:SS`, truncated to whole seconds
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

/// Builds the termination report, one line per counter
///
/// # Example Output
///
/// ```text
/// * Request sent count: 5
/// * Response received count: 5
/// * Status code count: 200[5]
/// * Scraped content count: 24
/// * Elapsed time: 0:00:12
/// ```
pub fn format_report(counters: &Counters, elapsed: Duration) -> String {
    let mut lines = vec![
        format!("* Request sent count: {}", counters.requests_sent),
        format!("* Response received count: {}", counters.responses_received),
    ];

    for (status_code, count) in &counters.status_codes {
        lines.push(format!("* Status code count: {}[{}]", status_code, count));
    }

    lines.push(format!("* Scraped content count: {}", counters.fields_scraped));
    lines.push(format!("* Elapsed time: {}", format_elapsed(elapsed)));

    lines.join("\n")
}
