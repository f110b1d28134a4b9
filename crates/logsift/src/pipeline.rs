//! Pipeline — discovery → readers → bounded queue → hash workers → aggregator.
//!
//! One `Pipeline` drives exactly one run. Grouping happens on demand after the
//! run, over whatever the aggregator holds (complete or, after cancellation,
//! partial).

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::aggregate::{Aggregator, LineCount};
use crate::conf::SiftConfig;
use crate::discovery::FileDiscovery;
use crate::error::SiftError;
use crate::group::{self, LineGroup, LineGrouper};
use crate::hash::LineHasher;
use crate::processor::{HashedLine, LineProcessor};
use crate::progress::ProgressReporter;
use crate::reader::{FileFailure, LineProducer, LogLine};
use crate::stats::{PipelineStats, StatsSnapshot};

/// Lines a hash worker takes off the queue per lock.
const HASH_BATCH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub stats: StatsSnapshot,
    pub failures: Vec<FileFailure>,
    pub distinct_lines: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn is_cancelled(&self) -> bool {
        self.outcome == RunOutcome::Cancelled
    }
}

pub struct Pipeline<P = LineHasher> {
    config: SiftConfig,
    discovery: FileDiscovery,
    processor: Arc<P>,
    grouper: Option<Box<dyn LineGrouper>>,
    aggregator: Arc<Aggregator>,
    stats: Arc<PipelineStats>,
    started: AtomicBool,
}

impl Pipeline<LineHasher> {
    /// Validate `config` and compile every pattern in it. Fails before any
    /// worker exists.
    pub fn new(config: SiftConfig) -> Result<Self, SiftError> {
        let processor = LineHasher::new(&config.normalize)?;
        Self::with_processor(config, processor)
    }

    /// Prefix filter counters as `(scanned, matched)`, when a filter is set.
    pub fn filter_stats(&self) -> Option<(u64, u64)> {
        self.processor.normalizer().filter().map(|f| f.stats())
    }
}

impl<P> Pipeline<P>
where
    P: LineProcessor<Output = HashedLine> + 'static,
{
    pub fn with_processor(config: SiftConfig, processor: P) -> Result<Self, SiftError> {
        config.validate().map_err(SiftError::Configuration)?;

        Ok(Self {
            discovery: FileDiscovery::new(&config.discovery)?,
            grouper: group::grouper_for(&config.grouping)?,
            processor: Arc::new(processor),
            aggregator: Arc::new(Aggregator::new()),
            stats: Arc::new(PipelineStats::new()),
            started: AtomicBool::new(false),
            config,
        })
    }

    pub fn config(&self) -> &SiftConfig {
        &self.config
    }

    /// Discover files under the configured root and process them.
    pub async fn run(
        &self,
        progress: Arc<dyn ProgressReporter>,
        cancel: CancellationToken,
    ) -> Result<RunSummary, SiftError> {
        let paths = self.discovery.discover()?;
        info!(root = %self.discovery.root().display(), files = paths.len(), "discovered log files");
        self.run_files(paths, progress, cancel).await
    }

    /// Process an explicit list of files.
    ///
    /// Cancellation is not an error: the summary reports
    /// [`RunOutcome::Cancelled`] and whatever was aggregated stays readable
    /// through [`Pipeline::results`] and [`Pipeline::groups`].
    pub async fn run_files(
        &self,
        paths: Vec<PathBuf>,
        progress: Arc<dyn ProgressReporter>,
        cancel: CancellationToken,
    ) -> Result<RunSummary, SiftError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(SiftError::AlreadyRun);
        }

        let start = Instant::now();
        let settings = &self.config.pipeline;
        // Internal aborts (a panicked worker) must not cancel the caller's token
        let cancel = cancel.child_token();

        info!(
            files = paths.len(),
            readers = settings.reader_parallelism,
            hashers = settings.hash_parallelism,
            "starting run"
        );

        let (tx, rx) = mpsc::channel::<LogLine>(settings.line_queue_capacity);
        let rx = Arc::new(Mutex::new(rx));

        let mut hashers = JoinSet::new();
        for id in 0..settings.hash_parallelism {
            hashers.spawn(hash_worker(
                id,
                Arc::clone(&rx),
                Arc::clone(&self.processor),
                Arc::clone(&self.aggregator),
                Arc::clone(&self.stats),
                cancel.clone(),
            ));
        }

        let producer = LineProducer::new(settings, Arc::clone(&self.stats), progress);
        let read = producer.run(paths, tx, cancel.clone()).await;
        if read.is_err() {
            cancel.cancel();
        }

        let mut failed_worker = None;
        while let Some(joined) = hashers.join_next().await {
            if let Err(e) = joined {
                cancel.cancel();
                if failed_worker.is_none() {
                    failed_worker = Some(SiftError::from(e));
                }
            }
        }

        let failures = read?;
        if let Some(e) = failed_worker {
            return Err(e);
        }

        let summary = RunSummary {
            outcome: if cancel.is_cancelled() {
                RunOutcome::Cancelled
            } else {
                RunOutcome::Completed
            },
            stats: self.stats.snapshot(),
            failures,
            distinct_lines: self.aggregator.len(),
            elapsed: start.elapsed(),
        };

        info!(
            outcome = ?summary.outcome,
            files = summary.stats.files_total,
            failed = summary.stats.files_failed,
            lines = summary.stats.lines_read,
            distinct = summary.distinct_lines,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "run finished"
        );

        Ok(summary)
    }

    /// Aggregated lines, most frequent first.
    pub fn results(&self) -> Vec<LineCount> {
        group::rank_counts(self.aggregator.snapshot())
    }

    /// Report groups, or `None` when grouping is disabled.
    pub fn groups(&self) -> Option<Vec<LineGroup>> {
        let grouper = self.grouper.as_ref()?;
        let groups = grouper.group(self.aggregator.snapshot());
        Some(group::rank_groups(groups, self.config.grouping.min_group_members))
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

async fn hash_worker<P>(
    id: usize,
    lines: Arc<Mutex<mpsc::Receiver<LogLine>>>,
    processor: Arc<P>,
    aggregator: Arc<Aggregator>,
    stats: Arc<PipelineStats>,
    cancel: CancellationToken,
) where
    P: LineProcessor<Output = HashedLine>,
{
    let mut batch = Vec::with_capacity(HASH_BATCH);
    let mut processed = 0u64;

    loop {
        let received = {
            let mut rx = lines.lock().await;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => 0,
                n = rx.recv_many(&mut batch, HASH_BATCH) => n,
            }
        };
        if received == 0 {
            break;
        }

        for line in batch.drain(..) {
            match processor.process_line(&line.content) {
                Some(hashed) => {
                    aggregator.record(hashed.hash, hashed.text);
                    stats.record_hashed(true);
                }
                None => stats.record_hashed(false),
            }
        }
        processed += received as u64;
    }

    debug!(worker = id, lines = processed, "hash worker finished");
}
