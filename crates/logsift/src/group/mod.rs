//! Group — post-aggregation clustering of distinct lines into report groups.
//!
//! Runs once, single-threaded, after every hash worker has finished.

pub mod prefix;
pub mod weighted;

use std::cmp::Reverse;

use serde::Serialize;

use crate::aggregate::LineCount;
use crate::conf::{GroupingConfig, GroupingStrategy};
use crate::error::SiftError;

pub use prefix::PrefixGrouper;
pub use weighted::WeightedGrouper;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineGroup {
    pub prefix: String,
    pub total_count: u64,
    pub members: Vec<LineCount>,
}

impl LineGroup {
    pub fn new(prefix: String, members: Vec<LineCount>) -> Self {
        let total_count = members.iter().map(|m| m.count).sum();
        Self {
            prefix,
            total_count,
            members,
        }
    }
}

pub trait LineGrouper: Send + Sync {
    fn group(&self, lines: Vec<LineCount>) -> Vec<LineGroup>;
}

/// The configured grouper, or `None` for `strategy = "none"`.
pub fn grouper_for(config: &GroupingConfig) -> Result<Option<Box<dyn LineGrouper>>, SiftError> {
    let grouper: Box<dyn LineGrouper> = match config.strategy {
        GroupingStrategy::Prefix => Box::new(PrefixGrouper::new(config.min_prefix_length)?),
        GroupingStrategy::Weighted => Box::new(WeightedGrouper::new(config.weight_threshold)?),
        GroupingStrategy::None => return Ok(None),
    };
    Ok(Some(grouper))
}

/// Report order: drop groups below `min_members`, biggest total first.
pub fn rank_groups(mut groups: Vec<LineGroup>, min_members: usize) -> Vec<LineGroup> {
    groups.retain(|g| g.members.len() >= min_members);
    groups.sort_by(|a, b| {
        b.total_count
            .cmp(&a.total_count)
            .then_with(|| a.prefix.cmp(&b.prefix))
    });
    groups
}

/// Report order for raw counts: most frequent first, then by text.
pub fn rank_counts(mut counts: Vec<LineCount>) -> Vec<LineCount> {
    counts.sort_by(|a, b| (Reverse(a.count), &a.line).cmp(&(Reverse(b.count), &b.line)));
    counts
}
