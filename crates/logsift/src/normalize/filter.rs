use std::sync::atomic::{AtomicU64, Ordering};
use grep_matcher::Matcher;
use grep_regex::{RegexMatcher, RegexMatcherBuilder};

use crate::error::SiftError;
use super::char_prefix;

#[derive(Debug, Default)]
pub struct FilterStats {
    pub lines_scanned: AtomicU64,
    pub lines_matched: AtomicU64,
}

/// Case-insensitive regex test against the head of a line.
///
/// Only the first `scan_length` characters are searched, so a keyword deep in
/// a message body never lets a line through.
pub struct PrefixFilter {
    matcher: RegexMatcher,
    scan_length: usize,
    stats: FilterStats,
}

impl PrefixFilter {
    pub fn new(pattern: &str, scan_length: usize) -> Result<Self, SiftError> {
        let matcher = RegexMatcherBuilder::new()
            .case_insensitive(true)
            .multi_line(false)
            .build(pattern)
            .map_err(|e| SiftError::InvalidFilter {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            matcher,
            scan_length,
            stats: FilterStats::default(),
        })
    }

    #[inline]
    pub fn should_include(&self, line: &str) -> bool {
        self.stats.lines_scanned.fetch_add(1, Ordering::Relaxed);

        let head = char_prefix(line, self.scan_length);
        let matches = self.matcher.is_match(head.as_bytes()).unwrap_or(false);

        if matches {
            self.stats.lines_matched.fetch_add(1, Ordering::Relaxed);
        }

        matches
    }

    /// `(scanned, matched)`
    pub fn stats(&self) -> (u64, u64) {
        (
            self.stats.lines_scanned.load(Ordering::Relaxed),
            self.stats.lines_matched.load(Ordering::Relaxed),
        )
    }
}
