//! Normalize module — prefix filtering, substitution rules, truncation.
//!
//! Order is fixed: filter on the raw head of the line, then erase variable
//! substrings, then truncate. The result is what gets hashed and what is kept
//! as a bucket's representative text.

pub mod filter;
pub mod rules;

use std::borrow::Cow;

use crate::conf::NormalizeConfig;
use crate::error::SiftError;
pub use filter::PrefixFilter;
pub use rules::SubstitutionRules;

pub struct LineNormalizer {
    filter: Option<PrefixFilter>,
    rules: SubstitutionRules,
    max_line_length: usize,
}

impl LineNormalizer {
    pub fn new(config: &NormalizeConfig) -> Result<Self, SiftError> {
        let filter = config
            .prefix_filter
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| PrefixFilter::new(p, config.scan_length))
            .transpose()?;

        let rules = SubstitutionRules::compile(&config.substitutions)?;
        tracing::debug!(
            filter = filter.is_some(),
            rules = rules.len(),
            max_line_length = config.max_line_length,
            "normalizer ready"
        );

        Ok(Self {
            filter,
            rules,
            max_line_length: config.max_line_length,
        })
    }

    /// Returns `None` when the prefix filter drops the line.
    pub fn normalize<'a>(&self, line: &'a str) -> Option<Cow<'a, str>> {
        if let Some(filter) = &self.filter {
            if !filter.should_include(line) {
                return None;
            }
        }

        let normalized = if self.rules.is_empty() {
            Cow::Borrowed(line)
        } else {
            self.rules.apply(line)
        };
        Some(truncate_chars(normalized, self.max_line_length))
    }

    pub fn filter(&self) -> Option<&PrefixFilter> {
        self.filter.as_ref()
    }
}

/// The longest prefix of `s` holding at most `max_chars` characters.
#[inline]
pub(crate) fn char_prefix(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn truncate_chars(s: Cow<'_, str>, max_chars: usize) -> Cow<'_, str> {
    let keep = char_prefix(&s, max_chars).len();
    if keep == s.len() {
        return s;
    }
    match s {
        Cow::Borrowed(b) => Cow::Borrowed(&b[..keep]),
        Cow::Owned(mut o) => {
            o.truncate(keep);
            Cow::Owned(o)
        }
    }
}
