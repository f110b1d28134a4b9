//! Weighted token grouping.
//!
//! Each line keeps only the tokens whose weight clears the threshold, where
//! weight = (sum of counts of every line containing the token) + ln(count + 1)
//! of the line itself. Lines with the same surviving token set share a group,
//! named by the sorted tokens. Lines left with no token share one group named
//! after its first member.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::{LineGroup, LineGrouper};
use crate::aggregate::LineCount;
use crate::error::SiftError;

const MAX_TOKEN_CHARS: usize = 49;
const EDGE_PUNCTUATION: &[char] = &['.', ',', ';', ':', '"', '\''];

#[derive(Debug, Clone)]
pub struct WeightedGrouper {
    threshold: f64,
}

impl WeightedGrouper {
    pub fn new(threshold: f64) -> Result<Self, SiftError> {
        if !threshold.is_finite() {
            return Err(SiftError::Configuration(
                "grouping.weight_threshold must be finite".to_string(),
            ));
        }
        Ok(Self { threshold })
    }
}

fn tokenize(line: &str) -> BTreeSet<String> {
    line.split_whitespace()
        .map(|t| t.to_lowercase())
        .map(|t| t.trim_matches(EDGE_PUNCTUATION).to_string())
        .filter(|t| !t.is_empty() && t.chars().count() <= MAX_TOKEN_CHARS)
        .collect()
}

impl LineGrouper for WeightedGrouper {
    fn group(&self, mut lines: Vec<LineCount>) -> Vec<LineGroup> {
        lines.sort_by(|a, b| a.line.cmp(&b.line));

        let tokenized: Vec<BTreeSet<String>> = lines.iter().map(|l| tokenize(&l.line)).collect();

        let mut global: HashMap<&str, u64> = HashMap::new();
        for (line, tokens) in lines.iter().zip(&tokenized) {
            for token in tokens {
                *global.entry(token.as_str()).or_insert(0) += line.count;
            }
        }

        let mut buckets: BTreeMap<String, Vec<LineCount>> = BTreeMap::new();
        for (line, tokens) in lines.iter().zip(&tokenized) {
            let local = ((line.count + 1) as f64).ln();
            let signature = tokens
                .iter()
                .filter(|t| global[t.as_str()] as f64 + local >= self.threshold)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" ");
            buckets.entry(signature).or_default().push(line.clone());
        }

        buckets
            .into_iter()
            .map(|(signature, members)| {
                let prefix = if signature.is_empty() {
                    members[0].line.clone()
                } else {
                    signature
                };
                LineGroup::new(prefix, members)
            })
            .collect()
    }
}
