use std::sync::atomic::{AtomicU64, Ordering};
use serde::Serialize;

/// Forces the wrapped counters onto their own cache line so reader workers
/// and hash workers do not invalidate each other's L1 lines.
#[repr(align(64))]
#[derive(Debug, Default)]
pub struct CacheAligned<T>(pub T);

/// File-level counters (updated once per file by reader workers)
#[derive(Debug, Default)]
pub struct FileMetrics {
    pub total: AtomicU64,
    pub completed: AtomicU64,
    pub failed: AtomicU64,
}

/// Read-side counters (updated per chunk / per emitted line)
#[derive(Debug, Default)]
pub struct ReadMetrics {
    pub bytes: AtomicU64,
    pub lines: AtomicU64,
}

/// Hash-side counters (HOTTEST PATH - updated per line by hash workers)
#[derive(Debug, Default)]
pub struct HashMetrics {
    pub recorded: AtomicU64,
    pub skipped: AtomicU64,
}

/// Counters for one pipeline run.
///
/// All operations use `Ordering::Relaxed`; `snapshot()` is not transactional
/// across fields while a run is in flight.
#[derive(Debug, Default)]
pub struct PipelineStats {
    pub files: CacheAligned<FileMetrics>,
    pub read: CacheAligned<ReadMetrics>,
    pub hash: CacheAligned<HashMetrics>,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_files_total(&self, total: u64) {
        self.files.0.total.store(total, Ordering::Relaxed);
    }

    /// Mark a file finished (successfully or not) and return how many files
    /// have finished so far, this one included.
    #[inline]
    pub fn record_file_finished(&self, failed: bool) -> u64 {
        if failed {
            self.files.0.failed.fetch_add(1, Ordering::Relaxed);
        }
        self.files.0.completed.fetch_add(1, Ordering::Relaxed) + 1
    }

    #[inline]
    pub fn record_bytes(&self, n: u64) {
        self.read.0.bytes.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_line_read(&self) {
        self.read.0.lines.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_hashed(&self, recorded: bool) {
        if recorded {
            self.hash.0.recorded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.hash.0.skipped.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn bytes_read(&self) -> u64 {
        self.read.0.bytes.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            files_total: self.files.0.total.load(Ordering::Relaxed),
            files_completed: self.files.0.completed.load(Ordering::Relaxed),
            files_failed: self.files.0.failed.load(Ordering::Relaxed),
            bytes_read: self.read.0.bytes.load(Ordering::Relaxed),
            lines_read: self.read.0.lines.load(Ordering::Relaxed),
            lines_recorded: self.hash.0.recorded.load(Ordering::Relaxed),
            lines_skipped: self.hash.0.skipped.load(Ordering::Relaxed),
        }
    }
}

/// A read-only snapshot of pipeline counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub files_total: u64,
    pub files_completed: u64,
    pub files_failed: u64,
    pub bytes_read: u64,
    pub lines_read: u64,
    pub lines_recorded: u64,
    pub lines_skipped: u64,
}
