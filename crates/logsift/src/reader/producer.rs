//! Producer — the reader worker pool.
//!
//! A feeder task pushes paths into a bounded path queue; `R` reader workers
//! pull from it, each owning one file end-to-end, and push lines into the
//! bounded line channel. A full line channel suspends the sending worker, so
//! at most `R` chunks are in flight no matter how large the corpus is.
//!
//! The line channel closes once the last worker exits and drops its sender.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{BufferPool, FileFailure, LineReader, LogLine};
use crate::conf::PipelineConfig;
use crate::error::SiftError;
use crate::progress::{self, ProgressReporter};
use crate::stats::PipelineStats;

/// How a single file ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileEnd {
    Done,
    Stopped,
}

pub struct LineProducer {
    parallelism: usize,
    path_queue_capacity: usize,
    pool: Arc<BufferPool>,
    stats: Arc<PipelineStats>,
    progress: Arc<dyn ProgressReporter>,
}

impl LineProducer {
    pub fn new(
        config: &PipelineConfig,
        stats: Arc<PipelineStats>,
        progress: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            parallelism: config.reader_parallelism.max(1),
            path_queue_capacity: config.path_queue_capacity.max(1),
            pool: BufferPool::new(config.chunk_size.max(1), config.reader_parallelism.max(1)),
            stats,
            progress,
        }
    }

    /// Read every file in `paths` into `lines`.
    ///
    /// Returns the files that failed. Stops early, without error, when
    /// `cancel` fires or the receiving side of `lines` is dropped.
    pub async fn run(
        self,
        paths: Vec<PathBuf>,
        lines: mpsc::Sender<LogLine>,
        cancel: CancellationToken,
    ) -> Result<Vec<FileFailure>, SiftError> {
        let total = paths.len() as u64;
        self.stats.set_files_total(total);
        if paths.is_empty() {
            return Ok(Vec::new());
        }

        let (path_tx, path_rx) = mpsc::channel::<PathBuf>(self.path_queue_capacity);
        let path_rx = Arc::new(Mutex::new(path_rx));

        let mut workers = JoinSet::new();

        let feeder_cancel = cancel.clone();
        workers.spawn(async move {
            for path in paths {
                tokio::select! {
                    _ = feeder_cancel.cancelled() => break,
                    sent = path_tx.send(path) => {
                        if sent.is_err() {
                            break;
                        }
                    }
                }
            }
            Vec::new()
        });

        for id in 0..self.parallelism {
            let worker = ReadWorker {
                id,
                total,
                pool: Arc::clone(&self.pool),
                stats: Arc::clone(&self.stats),
                progress: Arc::clone(&self.progress),
                lines: lines.clone(),
                cancel: cancel.clone(),
            };
            workers.spawn(worker.run(Arc::clone(&path_rx)));
        }
        drop(lines);

        let mut failures = Vec::new();
        let mut panicked = None;
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(mut f) => failures.append(&mut f),
                Err(e) => {
                    cancel.cancel();
                    if panicked.is_none() {
                        panicked = Some(SiftError::from(e));
                    }
                }
            }
        }

        match panicked {
            Some(e) => Err(e),
            None => Ok(failures),
        }
    }
}

struct ReadWorker {
    id: usize,
    total: u64,
    pool: Arc<BufferPool>,
    stats: Arc<PipelineStats>,
    progress: Arc<dyn ProgressReporter>,
    lines: mpsc::Sender<LogLine>,
    cancel: CancellationToken,
}

impl ReadWorker {
    async fn run(self, paths: Arc<Mutex<mpsc::Receiver<PathBuf>>>) -> Vec<FileFailure> {
        let mut failures = Vec::new();

        loop {
            let next = {
                let mut rx = paths.lock().await;
                tokio::select! {
                    _ = self.cancel.cancelled() => None,
                    path = rx.recv() => path,
                }
            };
            let Some(path) = next else { break };

            match self.read_file(&path).await {
                Ok(FileEnd::Done) => self.finish_file(false),
                Ok(FileEnd::Stopped) => break,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable file");
                    failures.push(FileFailure {
                        path,
                        error: e.to_string(),
                    });
                    self.finish_file(true);
                }
            }
        }

        debug!(worker = self.id, failed = failures.len(), "reader worker finished");
        failures
    }

    async fn read_file(&self, path: &std::path::Path) -> std::io::Result<FileEnd> {
        let mut reader = LineReader::open(path, &self.pool).await?;
        debug!(worker = self.id, path = %path.display(), "reading file");

        loop {
            if self.cancel.is_cancelled() {
                return Ok(FileEnd::Stopped);
            }

            let before = reader.bytes_read();
            let line = reader.next_line().await?;
            self.stats.record_bytes(reader.bytes_read() - before);

            let Some(line) = line else {
                return Ok(FileEnd::Done);
            };
            self.stats.record_line_read();

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(FileEnd::Stopped),
                sent = self.lines.send(line) => {
                    if sent.is_err() {
                        return Ok(FileEnd::Stopped);
                    }
                }
            }
        }
    }

    fn finish_file(&self, failed: bool) {
        let done = self.stats.record_file_finished(failed);
        self.progress.report(progress::percent(done, self.total));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use std::io::Write;
    use std::time::Duration;

    fn config(readers: usize, chunk: usize) -> PipelineConfig {
        PipelineConfig {
            chunk_size: chunk,
            reader_parallelism: readers,
            ..PipelineConfig::default()
        }
    }

    fn write_file(dir: &std::path::Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    async fn collect(mut rx: mpsc::Receiver<LogLine>) -> Vec<LogLine> {
        let mut out = Vec::new();
        while let Some(line) = rx.recv().await {
            out.push(line);
        }
        out
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_reads_all_files_in_order_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<_> = (0..6)
            .map(|i| {
                let body: String = (1..=50).map(|n| format!("file {} line {}\n", i, n)).collect();
                write_file(dir.path(), &format!("{}.log", i), &body)
            })
            .collect();

        let stats = Arc::new(PipelineStats::new());
        let producer = LineProducer::new(&config(3, 7), Arc::clone(&stats), Arc::new(NoProgress));
        let (tx, rx) = mpsc::channel(4);
        let consumer = tokio::spawn(collect(rx));

        let failures = producer.run(paths.clone(), tx, CancellationToken::new()).await.unwrap();
        let lines = consumer.await.unwrap();

        assert!(failures.is_empty());
        assert_eq!(lines.len(), 300);
        for path in &paths {
            let indices: Vec<u64> = lines
                .iter()
                .filter(|l| &*l.file_path == path.as_path())
                .map(|l| l.line_index)
                .collect();
            assert_eq!(indices, (1..=50).collect::<Vec<u64>>());
        }

        let snap = stats.snapshot();
        assert_eq!(snap.files_total, 6);
        assert_eq!(snap.files_completed, 6);
        assert_eq!(snap.lines_read, 300);
    }

    #[tokio::test]
    async fn test_missing_file_is_recorded_and_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_file(dir.path(), "good.log", "a\nb\n");
        let missing = dir.path().join("gone.log");

        let stats = Arc::new(PipelineStats::new());
        let producer = LineProducer::new(&config(2, 64), Arc::clone(&stats), Arc::new(NoProgress));
        let (tx, rx) = mpsc::channel(16);
        let consumer = tokio::spawn(collect(rx));

        let failures = producer
            .run(vec![missing.clone(), good], tx, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(consumer.await.unwrap().len(), 2);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].path, missing);

        let snap = stats.snapshot();
        assert_eq!(snap.files_completed, 2);
        assert_eq!(snap.files_failed, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_progress_reaches_one_hundred() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<_> = (0..4)
            .map(|i| write_file(dir.path(), &format!("{}.log", i), "x\n"))
            .collect();

        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress: Arc<dyn ProgressReporter> = Arc::new(move |p: f32| sink.lock().unwrap().push(p));

        let producer = LineProducer::new(&config(4, 64), Arc::new(PipelineStats::new()), progress);
        let (tx, rx) = mpsc::channel(16);
        let consumer = tokio::spawn(collect(rx));
        producer.run(paths, tx, CancellationToken::new()).await.unwrap();
        consumer.await.unwrap();

        let mut seen = seen.lock().unwrap().clone();
        seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(seen, vec![25.0, 50.0, 75.0, 100.0]);
    }

    #[tokio::test]
    async fn test_empty_path_list_finishes_immediately() {
        let stats = Arc::new(PipelineStats::new());
        let producer = LineProducer::new(&config(2, 64), Arc::clone(&stats), Arc::new(NoProgress));
        let (tx, mut rx) = mpsc::channel(1);

        let failures = producer.run(Vec::new(), tx, CancellationToken::new()).await.unwrap();
        assert!(failures.is_empty());
        assert!(rx.recv().await.is_none());
        assert_eq!(stats.snapshot().files_total, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_full_queue_suspends_reader() {
        let dir = tempfile::tempdir().unwrap();
        let body: String = (0..20_000).map(|n| format!("line {}\n", n)).collect();
        let path = write_file(dir.path(), "big.log", &body);
        let file_len = body.len() as u64;

        let stats = Arc::new(PipelineStats::new());
        let producer = LineProducer::new(&config(1, 16), Arc::clone(&stats), Arc::new(NoProgress));
        let (tx, rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(producer.run(vec![path], tx, cancel.clone()));
        tokio::time::sleep(Duration::from_millis(200)).await;

        // Nobody consumes: the reader must be parked on a full queue
        let read = stats.bytes_read();
        assert!(read > 0);
        assert!(read < 256, "read {} of {} bytes with a stalled consumer", read, file_len);
        assert!(!handle.is_finished());

        cancel.cancel();
        let failures = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(failures.is_empty());
        assert_eq!(stats.snapshot().files_completed, 0);
        drop(rx);
    }

    #[tokio::test]
    async fn test_dropped_receiver_stops_readers() {
        let dir = tempfile::tempdir().unwrap();
        let body: String = (0..1000).map(|n| format!("line {}\n", n)).collect();
        let path = write_file(dir.path(), "a.log", &body);

        let producer = LineProducer::new(&config(1, 32), Arc::new(PipelineStats::new()), Arc::new(NoProgress));
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let failures = producer.run(vec![path], tx, CancellationToken::new()).await.unwrap();
        assert!(failures.is_empty());
    }
}
