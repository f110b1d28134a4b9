//! Content hashing over the structural words of a line.
//!
//! A line is split on whitespace and only "word" tokens survive: at most
//! [`MAX_TOKEN_CHARS`] characters, each a letter, `_` or `-`. Numbers, IDs,
//! timestamps and anything with punctuation are skipped outright, so
//! `connected to 10.0.0.1` and `connected to 10.0.0.2` share a bucket while
//! `host-a` and `host-b` do not.
//!
//! The surviving tokens are folded into a 64-bit FNV-1a hash with a single
//! space between consecutive tokens. Token order matters.

use crate::conf::NormalizeConfig;
use crate::error::SiftError;
use crate::normalize::LineNormalizer;
use crate::processor::{HashedLine, LineProcessor};

pub const FNV_OFFSET_BASIS: u64 = 1469598103934665603;
pub const FNV_PRIME: u64 = 1099511628211;
pub const MAX_TOKEN_CHARS: usize = 40;

#[inline]
fn fold(hash: u64, bytes: &[u8]) -> u64 {
    bytes.iter().fold(hash, |h, &b| (h ^ b as u64).wrapping_mul(FNV_PRIME))
}

#[inline]
pub fn is_valid_token(token: &str) -> bool {
    let mut chars = 0;
    for c in token.chars() {
        chars += 1;
        if chars > MAX_TOKEN_CHARS || !((c.is_alphabetic() && !c.is_numeric()) || c == '_' || c == '-') {
            return false;
        }
    }
    chars > 0
}

/// Hash the valid tokens of `line`. `None` when no token survives.
pub fn content_hash(line: &str) -> Option<u64> {
    let mut hash = FNV_OFFSET_BASIS;
    let mut first = true;

    for token in line.split_whitespace().filter(|t| is_valid_token(t)) {
        if first {
            first = false;
        } else {
            hash = fold(hash, b" ");
        }
        hash = fold(hash, token.as_bytes());
    }

    if first {
        None
    } else {
        Some(hash)
    }
}

/// Normalizer + content hash: the default processor of the dedup pipeline.
pub struct LineHasher {
    normalizer: LineNormalizer,
}

impl LineHasher {
    pub fn new(config: &NormalizeConfig) -> Result<Self, SiftError> {
        Ok(Self {
            normalizer: LineNormalizer::new(config)?,
        })
    }

    pub fn normalizer(&self) -> &LineNormalizer {
        &self.normalizer
    }
}

impl LineProcessor for LineHasher {
    type Output = HashedLine;

    fn process_line(&self, raw: &str) -> Option<HashedLine> {
        let normalized = self.normalizer.normalize(raw)?;
        let hash = content_hash(&normalized)?;
        Some(HashedLine {
            hash,
            text: normalized.into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::SubstitutionRule;

    #[test]
    fn test_single_token_value() {
        // Single fold of b'a' over the offset basis
        assert_eq!(content_hash("a"), Some(0x44bd8ad473cd9906));
        assert_eq!(content_hash("  a\t"), Some(0x44bd8ad473cd9906));
    }

    #[test]
    fn test_space_folded_between_tokens() {
        let expected = fold(fold(fold(FNV_OFFSET_BASIS, b"a"), b" "), b"b");
        assert_eq!(content_hash("a b"), Some(expected));
        assert_eq!(content_hash("a    b"), Some(expected));
    }

    #[test]
    fn test_numeric_elision() {
        assert_eq!(
            content_hash("connected to 10.0.0.1"),
            content_hash("connected to 10.0.0.2")
        );
        assert_eq!(content_hash("retry 3 failed after 500ms"), content_hash("retry failed after"));
        assert_eq!(content_hash("error \u{216B}"), content_hash("error"));
    }

    #[test]
    fn test_non_numeric_tokens_distinguish() {
        assert_ne!(
            content_hash("connected to host-a"),
            content_hash("connected to host-b")
        );
    }

    #[test]
    fn test_order_sensitive() {
        assert_ne!(content_hash("a b c"), content_hash("c b a"));
    }

    #[test]
    fn test_skipped_tokens_leave_no_placeholder() {
        assert_eq!(content_hash("a 42 b"), content_hash("a b"));
    }

    #[test]
    fn test_token_validity() {
        assert!(is_valid_token("error"));
        assert!(is_valid_token("snake_case"));
        assert!(is_valid_token("kebab-case"));
        assert!(is_valid_token("Überprüfung"));
        assert!(!is_valid_token("v2"));
        assert!(!is_valid_token("failed:"));
        assert!(!is_valid_token("[Err]"));
        assert!(!is_valid_token(""));
        // Letter-like numerals (Nl) are numbers, not words
        assert!(!is_valid_token("\u{216B}"));
        assert!(!is_valid_token("chapter\u{2167}"));
        assert!(is_valid_token(&"x".repeat(40)));
        assert!(!is_valid_token(&"x".repeat(41)));
    }

    #[test]
    fn test_no_valid_tokens_yields_no_hash() {
        assert_eq!(content_hash(""), None);
        assert_eq!(content_hash("   "), None);
        assert_eq!(content_hash("12:00:01 404 0x1f"), None);
    }

    #[test]
    fn test_line_hasher_normalizes_before_hashing() {
        let hasher = LineHasher::new(&NormalizeConfig {
            substitutions: vec![SubstitutionRule {
                pattern: r"user=\S+".to_string(),
                replacement: "user".to_string(),
            }],
            ..NormalizeConfig::default()
        })
        .unwrap();

        let a = hasher.process_line("denied user=alice").unwrap();
        let b = hasher.process_line("denied user=bob").unwrap();
        assert_eq!(a.hash, b.hash);
        assert_eq!(a.text, "denied user");
    }

    #[test]
    fn test_line_hasher_drops_filtered_and_numeric_lines() {
        let hasher = LineHasher::new(&NormalizeConfig {
            prefix_filter: Some("err".to_string()),
            ..NormalizeConfig::default()
        })
        .unwrap();

        assert!(hasher.process_line("INFO fine").is_none());
        assert!(hasher.process_line("err: 1 2 3").is_none());
        assert!(hasher.process_line("ERR disk full").is_some());
    }
}
