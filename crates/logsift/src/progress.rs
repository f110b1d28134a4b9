/// Receives percent-complete updates (0–100) as files finish reading.
///
/// Called from reader workers without serialization: two workers finishing at
/// the same time may report concurrently and out of order. Implementations
/// that need ordered output must synchronize themselves.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, percent: f32);
}

impl<F> ProgressReporter for F
where
    F: Fn(f32) + Send + Sync,
{
    fn report(&self, percent: f32) {
        self(percent)
    }
}

/// Discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _percent: f32) {}
}

/// Logs progress through `tracing`, at most once per `step` percent.
#[derive(Debug)]
pub struct LogProgress {
    step: u32,
    last: std::sync::atomic::AtomicU32,
}

impl LogProgress {
    pub fn new(step: u32) -> Self {
        Self {
            step: step.max(1),
            last: std::sync::atomic::AtomicU32::new(0),
        }
    }
}

impl ProgressReporter for LogProgress {
    fn report(&self, percent: f32) {
        use std::sync::atomic::Ordering;

        let bucket = (percent as u32 / self.step) * self.step;
        // fetch_max lets exactly one worker log each bucket
        if bucket > self.last.fetch_max(bucket, Ordering::Relaxed) {
            tracing::info!(percent = bucket, "reading log files");
        }
    }
}

pub(crate) fn percent(done: u64, total: u64) -> f32 {
    if total == 0 {
        100.0
    } else {
        (done as f64 * 100.0 / total as f64) as f32
    }
}
