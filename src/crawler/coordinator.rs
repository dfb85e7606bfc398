//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Rebuilding the frontier from seeds and the crawl log on startup
//! - Dispatching extractions to worker tasks within the concurrency caps
//! - Committing results to the crawl log and enqueueing discovered links
//! - Handling interrupts, page budgets and the idle case

use crate::config::{Config, CrawlerConfig};
use crate::crawler::scheduler::{QueuedUrl, Scheduler};
use crate::extract::{ExtractResult, Extraction, ExtractionFailure, Extractor, HttpExtractor};
use crate::log::{CrawlLog, LogEntry, RunStatus, SqliteCrawlLog, StorageError};
use crate::state::{UrlState, VisitState};
use crate::url::{extract_host, normalize_url};
use crate::SeekError;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::{Id, JoinError, JoinSet};
use url::Url;

/// How a crawl run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// Every reachable URL was visited
    Exhausted,

    /// Nothing new to crawl on startup
    Idle,

    /// The page budget was reached
    BudgetReached,

    /// The stop signal fired
    Interrupted,
}

impl CrawlOutcome {
    fn run_status(&self) -> RunStatus {
        match self {
            Self::Interrupted => RunStatus::Interrupted,
            _ => RunStatus::Completed,
        }
    }
}

/// Totals for one crawl run
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub run_id: i64,
    pub outcome: CrawlOutcome,
    /// URLs whose extraction completed (success or failure)
    pub processed: u64,
    /// Crawl records appended
    pub recorded: u64,
    /// Failed-attempt markers written
    pub failed: u64,
    /// URLs still queued when the run ended
    pub frontier_remaining: usize,
    pub elapsed: Duration,
}

/// What a worker task reports back
struct WorkerOutput {
    url: Url,
    host: String,
    /// None if the stop signal fired while waiting for the pacing slot
    result: Option<ExtractResult>,
}

/// Main crawler coordinator structure
///
/// The coordinator is the single owner of the frontier, the enqueued set and
/// the visited set. Workers only extract; every state change happens here, so
/// checking and marking a URL can never race.
pub struct Coordinator<E: Extractor> {
    config: CrawlerConfig,
    extractor: Arc<E>,
    log: Arc<dyn CrawlLog>,
    scheduler: Scheduler,
    /// Recorded or failed URLs, mirrored from the log
    visited: HashSet<String>,
    /// URLs queued or in flight during this run
    enqueued: HashSet<String>,
    /// Worker tasks still running, by task id
    running: HashMap<Id, QueuedUrl>,
    run_id: i64,
    processed: u64,
    recorded: u64,
    failed: u64,
}

impl<E: Extractor> Coordinator<E> {
    /// Creates a new coordinator and opens a run in the log
    ///
    /// The frontier is rebuilt from the configured seeds followed by the
    /// pending URLs persisted by earlier runs, skipping anything visited.
    pub fn new(
        config: &Config,
        extractor: Arc<E>,
        log: Arc<dyn CrawlLog>,
        config_hash: &str,
    ) -> Result<Self, SeekError> {
        let seeds = config
            .seeds
            .iter()
            .map(|seed| normalize_url(seed))
            .collect::<Result<Vec<_>, _>>()?;

        let visited = log.load_visited_set()?;
        let pending = log.load_pending()?;
        tracing::info!(
            "Loaded {} visited URLs and {} pending URLs from the crawl log",
            visited.len(),
            pending.len()
        );

        let mut coordinator = Self {
            config: config.crawler.clone(),
            extractor,
            log,
            scheduler: Scheduler::new(config.crawler.clone()),
            visited,
            enqueued: HashSet::new(),
            running: HashMap::new(),
            run_id: 0,
            processed: 0,
            recorded: 0,
            failed: 0,
        };

        let mut new_seeds = Vec::new();
        for seed in seeds {
            if coordinator.try_enqueue(seed.clone()) {
                new_seeds.push(seed.to_string());
            }
        }

        for url in pending {
            match normalize_url(&url) {
                Ok(url) => {
                    coordinator.try_enqueue(url);
                }
                Err(e) => tracing::warn!("Dropping unusable pending URL {}: {}", url, e),
            }
        }

        // Seeds are persisted so an interrupted first run resumes from them
        coordinator.log.enqueue_pending(&new_seeds)?;

        coordinator.run_id = coordinator.log.create_run(config_hash)?;
        tracing::info!(
            "Starting crawl run {} with {} URLs in frontier",
            coordinator.run_id,
            coordinator.scheduler.frontier_size()
        );

        Ok(coordinator)
    }

    /// Returns the ID of the run this coordinator writes to
    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    /// Returns the number of URLs currently queued
    pub fn frontier_size(&self) -> usize {
        self.scheduler.frontier_size()
    }

    /// Runs the main crawl loop until the frontier is exhausted, the page
    /// budget is reached, or `shutdown` completes
    ///
    /// Storage errors end the run with an error and mark it failed.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<CrawlSummary, SeekError>
    where
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();

        match self.crawl(shutdown, start_time).await {
            Ok(outcome) => {
                self.log.finish_run(self.run_id, outcome.run_status())?;

                let summary = CrawlSummary {
                    run_id: self.run_id,
                    outcome,
                    processed: self.processed,
                    recorded: self.recorded,
                    failed: self.failed,
                    frontier_remaining: self.scheduler.frontier_size(),
                    elapsed: start_time.elapsed(),
                };

                tracing::info!(
                    "Crawl run {} finished ({:?}): {} recorded, {} failed in {:?}",
                    summary.run_id,
                    summary.outcome,
                    summary.recorded,
                    summary.failed,
                    summary.elapsed
                );

                Ok(summary)
            }
            Err(e) => {
                tracing::error!("Crawl run {} failed: {}", self.run_id, e);
                if let Err(mark_err) = self.log.finish_run(self.run_id, RunStatus::Failed) {
                    tracing::warn!("Could not mark run {} failed: {}", self.run_id, mark_err);
                }
                Err(e)
            }
        }
    }

    async fn crawl<F>(&mut self, shutdown: F, start_time: Instant) -> Result<CrawlOutcome, SeekError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        if self.scheduler.is_empty() {
            let reseeded = tokio::select! {
                _ = &mut shutdown => return Ok(CrawlOutcome::Interrupted),
                reseeded = self.reseed_from_terminal() => reseeded?,
            };

            if !reseeded {
                tracing::info!("Nothing new to crawl");
                return Ok(CrawlOutcome::Idle);
            }
        }

        let mut workers: JoinSet<WorkerOutput> = JoinSet::new();
        let (stop_tx, stop_rx) = watch::channel(false);

        let outcome = loop {
            while self.within_budget() {
                match self.scheduler.next_dispatch(Instant::now()) {
                    Some(fetch) => {
                        self.spawn_worker(&mut workers, fetch.url, fetch.wait, stop_rx.clone())
                    }
                    None => break,
                }
            }

            if workers.is_empty() {
                if self.scheduler.is_empty() {
                    tracing::info!("Frontier is empty, crawl complete");
                    break CrawlOutcome::Exhausted;
                }
                tracing::info!("Page budget reached");
                break CrawlOutcome::BudgetReached;
            }

            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Stop requested, draining {} in-flight extractions", workers.len());
                    stop_tx.send_replace(true);
                    self.drain(&mut workers).await?;
                    break CrawlOutcome::Interrupted;
                }
                Some(joined) = workers.join_next_with_id() => {
                    self.handle_joined(joined)?;
                    self.report_progress(start_time);
                }
            }
        };

        Ok(outcome)
    }

    /// True while another dispatch cannot push the run past `max-pages`
    fn within_budget(&self) -> bool {
        match self.config.max_pages {
            Some(max) => self.recorded + (self.scheduler.in_flight() as u64) < max,
            None => true,
        }
    }

    /// Spawns an extraction that first waits out its pacing slot
    ///
    /// A stop signal during the wait ends the task before any request is made.
    fn spawn_worker(
        &mut self,
        workers: &mut JoinSet<WorkerOutput>,
        queued: QueuedUrl,
        wait: Duration,
        mut stop: watch::Receiver<bool>,
    ) {
        let extractor = Arc::clone(&self.extractor);
        let QueuedUrl { url, host } = queued.clone();

        let handle = workers.spawn(async move {
            if !wait.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(wait) => {}
                    _ = stop.changed() => {
                        return WorkerOutput { url, host, result: None };
                    }
                }
            }
            let result = extractor.extract(&url).await;
            WorkerOutput {
                url,
                host,
                result: Some(result),
            }
        });

        self.running.insert(handle.id(), queued);
    }

    /// Lets in-flight extractions finish within the grace period, then aborts the rest
    async fn drain(&mut self, workers: &mut JoinSet<WorkerOutput>) -> Result<(), SeekError> {
        let grace = Duration::from_secs(self.config.shutdown_grace_secs);

        let finished = tokio::time::timeout(grace, async {
            while let Some(joined) = workers.join_next_with_id().await {
                self.handle_joined(joined)?;
            }
            Ok::<(), SeekError>(())
        })
        .await;

        match finished {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    "Aborting {} extractions still running after {:?}",
                    workers.len(),
                    grace
                );
                workers.abort_all();
                self.running.clear();
                Ok(())
            }
        }
    }

    /// Routes a joined worker task to [`Self::handle_completion`]
    ///
    /// A panicked extraction counts as a failed extraction of its URL.
    fn handle_joined(&mut self, joined: Result<(Id, WorkerOutput), JoinError>) -> Result<(), SeekError> {
        match joined {
            Ok((id, output)) => {
                self.running.remove(&id);
                self.handle_completion(output)
            }
            Err(e) if e.is_panic() => {
                let Some(queued) = self.running.remove(&e.id()) else {
                    return Err(SeekError::Worker(e.to_string()));
                };
                tracing::error!("Extraction of {} panicked", queued.url);
                self.handle_completion(WorkerOutput {
                    url: queued.url,
                    host: queued.host,
                    result: Some(Err(ExtractionFailure::Panicked)),
                })
            }
            Err(e) => Err(SeekError::Worker(e.to_string())),
        }
    }

    /// Commits one finished extraction
    fn handle_completion(&mut self, output: WorkerOutput) -> Result<(), SeekError> {
        let WorkerOutput { url, host, result } = output;
        self.scheduler.complete(&host);

        let key = url.to_string();
        let Some(result) = result else {
            tracing::debug!("Stopped before fetching {}, leaving it pending", key);
            self.enqueued.remove(&key);
            return Ok(());
        };
        self.processed += 1;

        let visit = match result {
            Ok(extraction) => self.record_success(&key, extraction)?,
            Err(failure) => {
                tracing::info!("Failed to extract {}: {}", key, failure);
                self.log
                    .mark_failed(&key, &failure.to_string(), Some(self.run_id))?;
                self.failed += 1;
                VisitState::Failed
            }
        };

        tracing::debug!("Visited {} ({})", key, visit);
        self.enqueued.remove(&key);
        self.visited.insert(key);
        Ok(())
    }

    fn record_success(&mut self, key: &str, extraction: Extraction) -> Result<VisitState, SeekError> {
        let fresh = self.fresh_links(&extraction.links);
        let discovered: Vec<String> = fresh.iter().map(|url| url.to_string()).collect();

        let entry = LogEntry {
            url: key.to_string(),
            title: extraction.title,
            description: extraction.description,
        };

        match self.log.append(&entry, Some(self.run_id), &discovered) {
            Ok(record) => {
                tracing::info!("Recorded #{} {}", record.sequence, record.url);
                self.recorded += 1;
            }
            Err(StorageError::Duplicate(url)) => {
                // Written by another process since startup; its links are not ours to follow
                tracing::warn!("{} was already recorded, skipping", url);
                return Ok(VisitState::Success);
            }
            Err(e) => return Err(e.into()),
        }

        for url in fresh {
            self.try_enqueue(url);
        }

        Ok(VisitState::Success)
    }

    /// Normalizes extracted links, keeping those that can still be enqueued
    fn fresh_links(&self, links: &[String]) -> Vec<Url> {
        let mut seen = HashSet::new();

        links
            .iter()
            .filter_map(|link| match normalize_url(link) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::trace!("Ignoring link {}: {}", link, e);
                    None
                }
            })
            .filter(|url| {
                let key = url.to_string();
                self.state_of(&key).can_enqueue() && seen.insert(key)
            })
            .collect()
    }

    fn state_of(&self, key: &str) -> UrlState {
        if self.visited.contains(key) {
            UrlState::Visited
        } else if self.enqueued.contains(key) {
            UrlState::Enqueued
        } else {
            UrlState::Discovered
        }
    }

    /// Moves a URL from `Discovered` to `Enqueued`; returns false if it was not `Discovered`
    fn try_enqueue(&mut self, url: Url) -> bool {
        let key = url.to_string();
        if !self.state_of(&key).can_enqueue() {
            return false;
        }

        let Some(host) = extract_host(&url) else {
            tracing::debug!("No host in {}, not enqueueing", key);
            return false;
        };

        self.enqueued.insert(key);
        self.scheduler.add_to_frontier(QueuedUrl { url, host });
        true
    }

    /// Re-extracts the most recently recorded URL to find new work
    ///
    /// Returns true if unvisited links were enqueued. A failing extraction is
    /// retried `idle-retries` times with doubling backoff.
    async fn reseed_from_terminal(&mut self) -> Result<bool, SeekError> {
        let Some(terminal) = self.log.last_record()? else {
            tracing::info!("Crawl log is empty and no seeds are pending");
            return Ok(false);
        };

        let url = match normalize_url(&terminal.url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Terminal URL {} is unusable: {}", terminal.url, e);
                return Ok(false);
            }
        };

        tracing::info!("Frontier is empty, re-extracting links from {}", url);

        let mut backoff = Duration::from_millis(self.config.idle_backoff_ms);
        for attempt in 0..=self.config.idle_retries {
            match self.extractor.extract(&url).await {
                Ok(extraction) => {
                    let fresh = self.fresh_links(&extraction.links);
                    if fresh.is_empty() {
                        tracing::info!("Every link from {} is already visited", url);
                        return Ok(false);
                    }

                    let discovered: Vec<String> = fresh.iter().map(|u| u.to_string()).collect();
                    self.log.enqueue_pending(&discovered)?;
                    for url in fresh {
                        self.try_enqueue(url);
                    }
                    return Ok(true);
                }
                Err(failure) => {
                    tracing::warn!(
                        "Re-extraction of {} failed (attempt {}/{}): {}",
                        url,
                        attempt + 1,
                        self.config.idle_retries + 1,
                        failure
                    );
                    if attempt < self.config.idle_retries {
                        tokio::time::sleep(backoff).await;
                        backoff = backoff.saturating_mul(2);
                    }
                }
            }
        }

        Ok(false)
    }

    fn report_progress(&self, start_time: Instant) {
        if self.processed % 10 != 0 {
            return;
        }

        let rate = self.processed as f64 / start_time.elapsed().as_secs_f64().max(f64::EPSILON);
        tracing::info!(
            "Progress: {} processed, {} recorded, {} in frontier, {:.2} pages/sec",
            self.processed,
            self.recorded,
            self.scheduler.frontier_size(),
            rate
        );
    }
}

/// Runs a complete crawl against the configured log with the HTTP extractor
///
/// # Example
///
/// ```no_run
/// use sumi_seek::config::load_config_with_hash;
/// use sumi_seek::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("config.toml"))?;
/// let summary = run_crawl(&config, &hash, async {
///     let _ = tokio::signal::ctrl_c().await;
/// })
/// .await?;
/// println!("{} pages recorded", summary.recorded);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl<F>(
    config: &Config,
    config_hash: &str,
    shutdown: F,
) -> Result<CrawlSummary, SeekError>
where
    F: Future<Output = ()>,
{
    let log = Arc::new(SqliteCrawlLog::open(Path::new(&config.storage.database_path))?);
    let extractor = Arc::new(HttpExtractor::new(config)?);

    let mut coordinator = Coordinator::new(config, extractor, log, config_hash)?;
    coordinator.run(shutdown).await
}
