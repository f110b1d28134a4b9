use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;

/// One dedup bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationEntry {
    /// Text of the first line recorded for this hash; never overwritten.
    pub representative: String,
    pub count: u64,
}

/// A distinct line and how many times it (or a line hashing like it) occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineCount {
    pub line: String,
    pub count: u64,
}

impl LineCount {
    pub fn new(line: impl Into<String>, count: u64) -> Self {
        Self {
            line: line.into(),
            count,
        }
    }
}

/// Concurrent hash → (representative, count) map shared by all hash workers.
///
/// Backed by a sharded `DashMap`: each `record` locks a single shard for the
/// duration of one upsert, so updates are atomic per hash and never lost.
/// Which line becomes the representative when several raw lines race for the
/// same new hash depends on scheduling.
#[derive(Debug, Default)]
pub struct Aggregator {
    entries: DashMap<u64, AggregationEntry>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `{line, 1}` for a new hash, otherwise bump the count only.
    pub fn record(&self, hash: u64, line: String) {
        match self.entries.entry(hash) {
            Entry::Occupied(mut occupied) => {
                occupied.get_mut().count += 1;
            }
            Entry::Vacant(vacant) => {
                vacant.insert(AggregationEntry {
                    representative: line,
                    count: 1,
                });
            }
        }
    }

    pub fn get(&self, hash: u64) -> Option<AggregationEntry> {
        self.entries.get(&hash).map(|e| e.value().clone())
    }

    /// Number of distinct buckets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all bucket counts.
    pub fn total_count(&self) -> u64 {
        self.entries.iter().map(|e| e.count).sum()
    }

    /// Copy out every bucket as `(line, count)`, in no particular order.
    pub fn snapshot(&self) -> Vec<LineCount> {
        self.entries
            .iter()
            .map(|e| LineCount::new(e.representative.clone(), e.count))
            .collect()
    }
}
