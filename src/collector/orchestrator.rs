//! Collection orchestrator - main collection loop
//!
//! This module drives a run from search to final batch:
//! - Walking the search queries page by page
//! - Skipping logins already collected or attempted
//! - Fetching and classifying each new candidate
//! - Persisting the checkpoint and partial batches at interval boundaries
//! - Aborting when the API keeps failing

use crate::api::{ApiError, GithubClient};
use crate::classify::{Classification, Classifier, FetchedProfile, ProfileRecord, RejectReason};
use crate::collector::progress::{spawn_reporter, ProgressCounters};
use crate::config::Config;
use crate::output::{BatchMetadata, BatchSink, JsonBatchWriter, RunSummary};
use crate::search::{search, Paginator};
use crate::state::{Checkpoint, CheckpointStore, CollectorPhase, JsonCheckpointStore};
use crate::{HarvestError, Result};
use chrono::{SecondsFormat, Utc};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

/// Owns every component of a collection run
pub struct Collector {
    config: Config,
    client: GithubClient,
    paginator: Paginator,
    classifier: Classifier,
    checkpoints: Box<dyn CheckpointStore>,
    sink: Box<dyn BatchSink>,
    checkpoint: Checkpoint,

    /// Logins tried during this session, accepted or not
    attempted: HashSet<String>,

    /// Records accepted during this session
    records: Vec<ProfileRecord>,

    counters: Arc<ProgressCounters>,
    phase: CollectorPhase,
    target: u64,
    config_hash: Option<String>,
}

impl Collector {
    /// Creates a collector that talks to GitHub with `token` and persists to
    /// the configured checkpoint file and output directory
    ///
    /// # Returns
    ///
    /// * `Ok(Collector)` - Ready to run, with the checkpoint loaded
    /// * `Err(HarvestError)` - Client construction failed or the checkpoint is unreadable
    pub fn new(config: Config, token: &str) -> Result<Self> {
        let client = GithubClient::new(&config.api, token)?;
        let checkpoints = JsonCheckpointStore::new(&config.output.checkpoint_path);
        let sink = JsonBatchWriter::new(&config.output.output_dir);
        tracing::info!(
            "Checkpoint file: {}, batch directory: {}",
            checkpoints.path().display(),
            sink.dir().display()
        );
        Self::with_components(config, client, Box::new(checkpoints), Box::new(sink))
    }

    /// Creates a collector from explicit parts
    pub fn with_components(
        config: Config,
        client: GithubClient,
        checkpoints: Box<dyn CheckpointStore>,
        sink: Box<dyn BatchSink>,
    ) -> Result<Self> {
        let checkpoint = checkpoints.load()?;
        if checkpoint.resumes_collected > 0 {
            tracing::info!(
                "Resuming from checkpoint: {} resumes collected, {} known users",
                checkpoint.resumes_collected,
                checkpoint.collected_users.len()
            );
        }

        Ok(Self {
            paginator: Paginator::from_config(&config.search),
            classifier: Classifier::new(config.classifier.clone()),
            counters: Arc::new(ProgressCounters::new(checkpoint.resumes_collected)),
            config,
            client,
            checkpoints,
            sink,
            checkpoint,
            attempted: HashSet::new(),
            records: Vec::new(),
            phase: CollectorPhase::Idle,
            target: 0,
            config_hash: None,
        })
    }

    /// Attaches the configuration file hash stamped into batch metadata
    pub fn with_config_hash(mut self, hash: Option<String>) -> Self {
        self.config_hash = hash;
        self
    }

    pub fn phase(&self) -> CollectorPhase {
        self.phase
    }

    pub fn checkpoint(&self) -> &Checkpoint {
        &self.checkpoint
    }

    pub fn records(&self) -> &[ProfileRecord] {
        &self.records
    }

    pub fn counters(&self) -> Arc<ProgressCounters> {
        Arc::clone(&self.counters)
    }

    /// Runs until the cumulative accepted count reaches `target` or the
    /// queries are exhausted
    ///
    /// # Returns
    ///
    /// * `Ok(RunSummary)` - The final batch was written
    /// * `Err(HarvestError)` - Persistence failed or the circuit breaker tripped
    pub async fn run(&mut self, target: u64) -> Result<RunSummary> {
        let reporter = spawn_reporter(
            self.counters(),
            Duration::from_secs(self.config.progress.interval_secs),
            target,
        );
        let result = self.collect(target).await;
        if let Some(handle) = reporter {
            handle.abort();
        }
        result
    }

    async fn collect(&mut self, target: u64) -> Result<RunSummary> {
        self.target = target;
        tracing::info!(
            "Starting collection: target {}, {} already collected, {} queries",
            target,
            self.checkpoint.resumes_collected,
            self.paginator.queries().len()
        );

        self.probe_rate_limit().await;

        while !self.target_reached() {
            self.transition(CollectorPhase::Searching)?;
            self.throttle_if_needed().await?;

            let Some(cursor) = self.paginator.current() else {
                tracing::info!("All search queries exhausted");
                break;
            };

            let logins = match search(&self.client, &cursor, &self.config.search).await {
                Ok(logins) => logins,
                Err(e) => {
                    self.counters.errors.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        "Search failed for '{}' page {}: {}, moving to next query",
                        cursor.query,
                        cursor.page,
                        e
                    );
                    self.paginator.skip_query();
                    self.check_circuit()?;
                    continue;
                }
            };

            tracing::info!(
                "Search '{}' page {}: {} candidates",
                cursor.query,
                cursor.page,
                logins.len()
            );
            self.paginator.record_page(logins.len());

            for login in logins {
                if self.target_reached() {
                    break;
                }
                if self.checkpoint.contains(&login) || !self.attempted.insert(login.clone()) {
                    self.counters.skipped.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!("Skipping already processed user {}", login);
                    continue;
                }
                self.process_candidate(&login).await?;
            }
        }

        self.finalize()
    }

    /// Logs the quota at startup; failure here is not fatal
    async fn probe_rate_limit(&self) {
        match self.client.rate_limit().await {
            Ok(overview) => {
                let core = overview.resources.core;
                tracing::info!(
                    "API quota: {}/{} remaining, resets at {}",
                    core.remaining,
                    core.limit,
                    core.reset
                );
            }
            Err(e) => tracing::warn!("Could not read API quota: {}", e),
        }
    }

    /// Fetches, classifies, and accumulates one candidate
    ///
    /// Per-candidate failures are counted and logged; only persistence errors
    /// and a tripped circuit breaker are returned.
    async fn process_candidate(&mut self, login: &str) -> Result<()> {
        self.transition(CollectorPhase::Fetching)?;
        self.throttle_if_needed().await?;
        let profile = match self.client.get_user(login).await {
            Ok(profile) => profile,
            Err(e) => return self.record_fetch_error(login, &e),
        };

        self.transition(CollectorPhase::Classifying)?;
        if let Err(reason) = self.classifier.screen(&profile) {
            self.record_rejection(login, reason);
            return Ok(());
        }

        self.transition(CollectorPhase::Fetching)?;
        self.throttle_if_needed().await?;
        let repos = match self
            .client
            .get_user_repos(login, self.config.search.repos_per_profile)
            .await
        {
            Ok(repos) => repos,
            Err(e) => return self.record_fetch_error(login, &e),
        };

        let targets: Vec<String> = self
            .classifier
            .breakdown_targets(&repos)
            .iter()
            .map(|repo| repo.name.clone())
            .collect();
        let mut languages = HashMap::new();
        for name in targets {
            self.throttle_if_needed().await?;
            match self.client.get_repo_languages(login, &name).await {
                Ok(breakdown) => {
                    languages.insert(name, breakdown);
                }
                Err(e) => tracing::warn!(
                    "Language breakdown unavailable for {}/{}: {}",
                    login,
                    name,
                    e
                ),
            }
        }

        self.transition(CollectorPhase::Classifying)?;
        let fetched = FetchedProfile {
            profile,
            repos,
            languages,
        };
        match self.classifier.classify(&fetched, Utc::now()) {
            Classification::Accept(record) => {
                self.transition(CollectorPhase::Accumulating)?;
                self.accumulate(record)
            }
            Classification::Reject(reason) => {
                self.record_rejection(login, reason);
                Ok(())
            }
        }
    }

    fn accumulate(&mut self, record: ProfileRecord) -> Result<()> {
        tracing::debug!(
            "Accepted {} ({}, {})",
            record.github_username,
            record.proficiency_tier,
            record.experience_level
        );
        self.checkpoint.record_accepted(&record.github_username);
        self.records.push(record);
        self.counters.accepted.fetch_add(1, Ordering::Relaxed);
        self.counters
            .cumulative
            .store(self.checkpoint.resumes_collected, Ordering::Relaxed);

        let accepted = self.records.len() as u64;
        let log_every = u64::from(self.config.progress.log_every);
        if log_every > 0 && accepted % log_every == 0 {
            let snap = self.counters.snapshot();
            tracing::info!(
                "Progress: {}/{} resumes, {:.1}/hour, {} errors",
                snap.cumulative,
                self.target,
                snap.rate_per_hour(),
                snap.errors
            );
        }

        let interval = u64::from(self.config.output.batch_save_interval.max(1));
        if accepted % interval == 0 {
            self.save_checkpoint()?;
            let path = self.write_partial()?;
            tracing::info!("Saved partial batch of {} to {}", accepted, path.display());
        }
        Ok(())
    }

    fn record_rejection(&self, login: &str, reason: RejectReason) {
        self.counters.rejected.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Rejected {}: {}", login, reason);
    }

    fn record_fetch_error(&mut self, login: &str, error: &ApiError) -> Result<()> {
        self.counters.errors.fetch_add(1, Ordering::Relaxed);
        tracing::warn!("Failed to fetch {}: {}", login, error);
        self.check_circuit()
    }

    /// Saves progress and fails the run once the client reports too many
    /// consecutive failures
    fn check_circuit(&mut self) -> Result<()> {
        if !self.client.circuit_open() {
            return Ok(());
        }
        let count = self.client.consecutive_errors();
        tracing::error!(
            "{} consecutive API failures, saving progress and aborting",
            count
        );
        self.save_checkpoint()?;
        if !self.records.is_empty() {
            self.write_partial()?;
        }
        Err(HarvestError::TooManyConsecutiveErrors { count })
    }

    /// Waits out a pending quota suspension in the `Throttled` phase
    async fn throttle_if_needed(&mut self) -> Result<()> {
        let Some(wait) = self.client.pending_suspension() else {
            return Ok(());
        };
        let resume = self.phase;
        self.transition(CollectorPhase::Throttled)?;
        self.counters.throttled.fetch_add(1, Ordering::Relaxed);
        tracing::info!("Throttled for {:.1}s until quota resets", wait.as_secs_f64());
        self.client.wait_for_quota().await;
        self.transition(resume)
    }

    fn finalize(&mut self) -> Result<RunSummary> {
        self.transition(CollectorPhase::Finalizing)?;
        self.save_checkpoint()?;
        let metadata = self.metadata();
        let path = self.sink.write_final(&self.records, &metadata)?;
        self.transition(CollectorPhase::Done)?;

        let summary = self.summary(Some(path));
        if summary.target_reached() {
            tracing::info!("Target of {} resumes reached", self.target);
        } else {
            tracing::info!(
                "Queries exhausted before target: {}/{}",
                summary.cumulative,
                summary.target
            );
        }
        Ok(summary)
    }

    fn save_checkpoint(&mut self) -> Result<()> {
        self.checkpoint.touch(Utc::now());
        self.checkpoints.save(&self.checkpoint)?;
        tracing::debug!(
            "Checkpoint saved: {} resumes collected",
            self.checkpoint.resumes_collected
        );
        Ok(())
    }

    fn write_partial(&mut self) -> Result<PathBuf> {
        let metadata = self.metadata();
        Ok(self.sink.write_partial(&self.records, &metadata)?)
    }

    fn metadata(&self) -> BatchMetadata {
        let snap = self.counters.snapshot();
        BatchMetadata {
            count: self.records.len(),
            collected_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            errors: snap.errors,
            search_queries: self.paginator.queries().to_vec(),
            collection_time_seconds: snap.elapsed.as_secs_f64(),
            target_count: self.target,
            rejected: snap.rejected,
            config_hash: self.config_hash.clone(),
        }
    }

    fn summary(&self, final_batch: Option<PathBuf>) -> RunSummary {
        let snap = self.counters.snapshot();
        RunSummary {
            accepted: self.records.len() as u64,
            cumulative: self.checkpoint.resumes_collected,
            target: self.target,
            errors: snap.errors,
            rejected: snap.rejected,
            skipped: snap.skipped,
            throttled: snap.throttled,
            api_requests: self.client.requests_sent(),
            elapsed: snap.elapsed,
            final_batch,
        }
    }

    fn target_reached(&self) -> bool {
        self.checkpoint.resumes_collected >= self.target
    }

    fn transition(&mut self, next: CollectorPhase) -> Result<()> {
        if !self.phase.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::debug!("Phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }
}
