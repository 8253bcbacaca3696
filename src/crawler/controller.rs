//! Controller-side handle on crawl sessions
//!
//! The controller starts sessions on a background task and steers them
//! through the shared control signals. At most one session runs at a time.

use crate::cache::ResponseCache;
use crate::config::Config;
use crate::crawler::coordinator::{Coordinator, CrawlOutcome, SessionContext};
use crate::crawler::fetcher::{build_http_client, build_response_cache, Fetcher};
use crate::crawler::pacing::Pacer;
use crate::output::{CounterHandle, Counters, ExportSink, LogSink};
use crate::state::{ControlSignals, SessionStatus, SharedSignals};
use crate::url::SiteLayout;
use crate::ScrapeError;
use reqwest::Client;
use std::sync::Arc;
use tokio::task::JoinHandle;
use url::Url;

/// A session whose task has been spawned but not yet joined
struct ActiveSession {
    signals: SharedSignals,
    counters: CounterHandle,
    handle: JoinHandle<Result<CrawlOutcome, ScrapeError>>,
}

/// Starts, steers, and joins crawl sessions
///
/// # Example
///
/// ```no_run
/// use catalogue_scraper::config::Config;
/// use catalogue_scraper::crawler::Controller;
/// use catalogue_scraper::output::{JsonFileSink, TracingSink};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), catalogue_scraper::ScrapeError> {
/// let config = Config::default();
/// let start_url = url::Url::parse(&config.site.start_url).unwrap();
/// let mut controller = Controller::new(config, Arc::new(TracingSink))?;
///
/// controller.start_session(start_url, Box::new(JsonFileSink::new("books.json")))?;
/// controller.request_pause();
/// controller.request_resume();
/// let outcome = controller.wait().await?;
/// println!("{} records", outcome.records.len());
/// # Ok(())
/// # }
/// ```
pub struct Controller {
    client: Client,
    cache: Option<ResponseCache>,
    layout: SiteLayout,
    pacer: Pacer,
    log: Arc<dyn LogSink>,
    active: Option<ActiveSession>,
    last_status: SessionStatus,
    last_counters: Counters,
}

impl Controller {
    /// Creates a controller; the HTTP client and cache are shared by all its sessions
    pub fn new(config: Config, log: Arc<dyn LogSink>) -> Result<Self, ScrapeError> {
        Ok(Self {
            client: build_http_client(&config.http)?,
            cache: build_response_cache(&config.http)?,
            layout: SiteLayout::from_config(&config.site)?,
            pacer: Pacer::from_config(&config.pacing),
            log,
            active: None,
            last_status: SessionStatus::Idle,
            last_counters: Counters::new(),
        })
    }

    /// Starts a new session on a background task
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// * `ScrapeError::SessionActive` - The previous session has not terminated yet
    pub fn start_session(
        &mut self,
        start_url: Url,
        sink: Box<dyn ExportSink>,
    ) -> Result<(), ScrapeError> {
        if let Some(active) = &self.active {
            if !active.handle.is_finished() {
                return Err(ScrapeError::SessionActive);
            }
        }
        // The previous task has finished; its result is no longer wanted
        self.active = None;

        let signals = ControlSignals::shared();
        signals.set_status(SessionStatus::Running);
        let counters = CounterHandle::new();

        let ctx = SessionContext {
            fetcher: Fetcher::new(
                self.client.clone(),
                self.cache.clone(),
                counters.clone(),
                Arc::clone(&self.log),
            ),
            layout: self.layout.clone(),
            pacer: self.pacer,
            signals: Arc::clone(&signals),
            counters: counters.clone(),
            log: Arc::clone(&self.log),
        };

        let coordinator = Coordinator::new(ctx, start_url, sink);
        let handle = tokio::spawn(coordinator.run());

        self.active = Some(ActiveSession {
            signals,
            counters,
            handle,
        });
        self.last_counters = Counters::new();

        Ok(())
    }

    /// Closes the run gate; the session pauses after its current detail page
    pub fn request_pause(&self) {
        if let Some(active) = self.steerable() {
            active.signals.gate().close();
        }
    }

    /// Reopens the run gate
    pub fn request_resume(&self) {
        if let Some(active) = self.steerable() {
            active.signals.gate().open();
        }
    }

    /// Pauses a running session or resumes a paused one
    ///
    /// Returns `true` if the gate is now closed. Sessions that already
    /// terminated are left alone.
    pub fn toggle_pause(&self) -> bool {
        match self.steerable() {
            Some(active) if active.signals.gate().is_open() => {
                active.signals.gate().close();
                true
            }
            Some(active) => {
                active.signals.gate().open();
                false
            }
            None => false,
        }
    }

    /// The current session, if it is still running or paused
    fn steerable(&self) -> Option<&ActiveSession> {
        self.active
            .as_ref()
            .filter(|active| active.signals.status().is_active())
    }

    /// Cancels the running session and waits for its task to end
    ///
    /// Closes the gate, clears the liveness flag, then reopens the gate so a
    /// paused session wakes up and sees the flag. The fetch in flight, if
    /// any, finishes first. Calling this with no session is a no-op.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(CrawlOutcome))` - The session terminated
    /// * `Ok(None)` - There was no session to cancel
    /// * `Err(ScrapeError)` - The session failed before it saw the cancellation
    pub async fn request_cancel(&mut self) -> Result<Option<CrawlOutcome>, ScrapeError> {
        let Some(active) = &self.active else {
            return Ok(None);
        };

        active.signals.gate().close();
        active.signals.kill();
        active.signals.gate().open();
        self.log.info("----- Crawler Cancel Requested -----");

        self.wait().await.map(Some)
    }

    /// Waits for the current session to terminate
    ///
    /// # Errors
    ///
    /// * The fatal error that ended the session, if any
    /// * `ScrapeError::Task` - The session task panicked or was aborted
    /// * `ScrapeError::Task` - No session was started
    pub async fn wait(&mut self) -> Result<CrawlOutcome, ScrapeError> {
        let active = self
            .active
            .take()
            .ok_or_else(|| ScrapeError::Task("no crawl session to wait for".to_string()))?;

        let joined = active.handle.await;
        self.last_status = active.signals.status();
        self.last_counters = active.counters.snapshot();

        match joined {
            Ok(result) => result,
            Err(e) => {
                self.last_status = SessionStatus::Cancelled;
                Err(ScrapeError::Task(e.to_string()))
            }
        }
    }

    /// Status of the current session, or of the last one once it was joined
    pub fn current_status(&self) -> SessionStatus {
        match &self.active {
            Some(active) => active.signals.status(),
            None => self.last_status,
        }
    }

    /// Counters of the current session, or of the last one once it was joined
    pub fn current_counters(&self) -> Counters {
        match &self.active {
            Some(active) => active.counters.snapshot(),
            None => self.last_counters.clone(),
        }
    }

    /// Whether a session task is still running
    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.handle.is_finished())
    }
}
