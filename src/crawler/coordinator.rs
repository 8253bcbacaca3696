//! Crawler coordinator - the crawl state machine
//!
//! This module drives one session through its lifecycle:
//! - Fetching the start listing and every following "next" listing
//! - Visiting each listing's detail links in document order
//! - Honouring the run gate (pause) and liveness flag (cancel)
//! - Reporting counters on every termination path
//! - Exporting records only when the session completes
//!
//! ```text
//! Idle -> Running -> { Paused <-> Running } -> { Completed | Cancelled }
//! ```

use crate::crawler::fetcher::{FetchResponse, Fetcher};
use crate::crawler::pacing::Pacer;
use crate::crawler::parser::{extract_detail_record, parse_listing};
use crate::crawler::record::ExtractedRecord;
use crate::output::{format_report, CounterHandle, Counters, ExportSink, LogSink};
use crate::state::{SessionStatus, SharedSignals};
use crate::url::SiteLayout;
use crate::ScrapeError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Final state of a session that terminated without a fatal error
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    /// `Completed` or `Cancelled`
    pub status: SessionStatus,

    /// Records extracted before termination, in crawl order
    pub records: Vec<ExtractedRecord>,

    /// Listing pages reached, counting the start page
    pub pages_visited: u32,

    pub counters: Counters,

    pub elapsed: Duration,
}

impl CrawlOutcome {
    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }
}

/// How the listing loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Termination {
    Completed,
    Cancelled,
}

/// Everything a session needs besides its own state
pub struct SessionContext {
    pub fetcher: Fetcher,
    pub layout: SiteLayout,
    pub pacer: Pacer,
    pub signals: SharedSignals,
    pub counters: CounterHandle,
    pub log: Arc<dyn LogSink>,
}

impl SessionContext {
    async fn paced_fetch(&self, url: &Url) -> Result<FetchResponse, ScrapeError> {
        self.pacer.pace().await;
        Ok(self.fetcher.fetch(url).await?)
    }

    /// Blocks at the run gate until the controller reopens it
    ///
    /// A session cancelled while paused stays `Paused` until the loop
    /// observes the cleared liveness flag.
    async fn pause(&self) {
        self.signals.set_status(SessionStatus::Paused);
        self.log.info("----- Crawler Pause -----");

        self.signals.gate().wait_open().await;
        if !self.signals.is_alive() {
            return;
        }

        self.signals.set_status(SessionStatus::Running);
        self.log.info("----- Crawler Resume -----");
    }
}

/// One run of the crawl engine
///
/// Owns the session state exclusively. A coordinator runs once; a new one
/// is constructed for every session.
pub struct Coordinator {
    ctx: SessionContext,
    start_url: Url,
    sink: Option<Box<dyn ExportSink>>,
    current_page: u32,
    records: Vec<ExtractedRecord>,
}

impl Coordinator {
    pub fn new(ctx: SessionContext, start_url: Url, sink: Box<dyn ExportSink>) -> Self {
        Self {
            ctx,
            start_url,
            sink: Some(sink),
            current_page: 1,
            records: Vec::new(),
        }
    }

    /// Runs the session to termination
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlOutcome)` - Completed (and exported) or cancelled by the controller
    /// * `Err(ScrapeError)` - A fetch, parse, or export failure ended the session;
    ///   fetch and parse failures leave it `Cancelled` with nothing exported
    pub async fn run(mut self) -> Result<CrawlOutcome, ScrapeError> {
        let started = Instant::now();
        self.ctx.log.info("----- Crawler Start -----");
        self.ctx.signals.set_status(SessionStatus::Running);

        match self.crawl().await {
            Ok(Termination::Completed) => {
                self.ctx.signals.set_status(SessionStatus::Completed);
                self.finalize(started);
                if let Err(e) = self.export().await {
                    self.ctx.log.error(&e.to_string());
                    return Err(e);
                }
                Ok(self.outcome(SessionStatus::Completed, started))
            }
            Ok(Termination::Cancelled) => {
                self.ctx.signals.set_status(SessionStatus::Cancelled);
                self.finalize(started);
                Ok(self.outcome(SessionStatus::Cancelled, started))
            }
            Err(e) => {
                self.ctx.log.error(&e.to_string());
                self.ctx.signals.set_status(SessionStatus::Cancelled);
                self.finalize(started);
                Err(e)
            }
        }
    }

    /// Walks listing pages until there is no next page or the session is cancelled
    async fn crawl(&mut self) -> Result<Termination, ScrapeError> {
        let mut listing_response = self.ctx.paced_fetch(&self.start_url).await?;

        loop {
            let listing = parse_listing(
                &listing_response.body,
                &listing_response.final_url,
                &self.ctx.layout,
            );
            self.ctx
                .log
                .info(&format!("Scrape detail page urls: {}", listing.detail_links.len()));

            for (index, detail_url) in listing.detail_links.into_iter().enumerate() {
                if !self.ctx.signals.is_alive() {
                    return Ok(self.cancelled());
                }

                self.ctx.log.info(&format!(
                    "----- Request detail page({}-{}) -----",
                    self.current_page,
                    index + 1
                ));
                self.scrape_detail(&detail_url).await?;

                if !self.ctx.signals.gate().is_open() {
                    self.ctx.pause().await;
                }
            }

            self.ctx.log.info(&format!(
                "----- Scrape completed page[{}] -----",
                self.current_page
            ));

            // A cancel issued during the last detail page must not end in an export
            if !self.ctx.signals.is_alive() {
                return Ok(self.cancelled());
            }

            match listing.next_page {
                Some(next_url) => {
                    self.ctx.log.info("----- Request next page -----");
                    self.ctx.log.info(&format!("next page url: {}", next_url));
                    self.current_page += 1;
                    listing_response = self.ctx.paced_fetch(&next_url).await?;
                }
                None => {
                    self.ctx.log.info("===== Crawler Finished =====");
                    return Ok(Termination::Completed);
                }
            }
        }
    }

    async fn scrape_detail(&mut self, url: &Url) -> Result<(), ScrapeError> {
        let response = self.ctx.paced_fetch(url).await?;

        self.ctx.log.info("Scrape detail page content");
        let record = extract_detail_record(&response.body, &response.final_url, &self.ctx.layout)?;

        for (key, value) in record.fields() {
            self.ctx.log.info(&format!("- {}: {}", key, value));
        }

        self.ctx
            .counters
            .update(|c| c.add_fields(ExtractedRecord::FIELD_COUNT));
        self.records.push(record);
        Ok(())
    }

    fn cancelled(&self) -> Termination {
        self.ctx.log.info("----- Crawler Cancelled -----");
        self.ctx.log.info("===== Crawler Finished =====");
        Termination::Cancelled
    }

    /// Logs the counter report; has no effect on control flow
    fn finalize(&self, started: Instant) {
        let report = format_report(&self.ctx.counters.snapshot(), started.elapsed());
        self.ctx.log.info(&report);
    }

    /// Hands the records to the sink on the blocking pool
    ///
    /// The sink is consumed, so a session exports at most once.
    async fn export(&mut self) -> Result<(), ScrapeError> {
        let Some(mut sink) = self.sink.take() else {
            return Ok(());
        };
        let records = std::mem::take(&mut self.records);

        let (records, exported, target) = tokio::task::spawn_blocking(move || {
            let exported = sink.export(&records);
            (records, exported, sink.describe())
        })
        .await
        .map_err(|e| ScrapeError::Task(e.to_string()))?;

        self.records = records;
        exported?;
        self.ctx.log.info(&format!("* Output the file {}", target));
        Ok(())
    }

    fn outcome(self, status: SessionStatus, started: Instant) -> CrawlOutcome {
        CrawlOutcome {
            status,
            counters: self.ctx.counters.snapshot(),
            records: self.records,
            pages_visited: self.current_page,
            elapsed: started.elapsed(),
        }
    }
}
