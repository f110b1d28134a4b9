//! Greatest-common-prefix grouping.
//!
//! Lines are sorted ordinally and swept once, left to right. A line joins the
//! open group while the shared prefix of the group stays at least
//! `min_prefix_length` characters long; otherwise the group is closed and the
//! line seeds the next one. Boundaries depend only on sort order and the
//! threshold, not on how dense a cluster is.

use super::{LineGroup, LineGrouper};
use crate::aggregate::LineCount;
use crate::error::SiftError;

#[derive(Debug, Clone)]
pub struct PrefixGrouper {
    min_prefix_length: usize,
}

impl PrefixGrouper {
    pub fn new(min_prefix_length: usize) -> Result<Self, SiftError> {
        if min_prefix_length == 0 {
            return Err(SiftError::Configuration(
                "grouping.min_prefix_length must be > 0".to_string(),
            ));
        }
        Ok(Self { min_prefix_length })
    }
}

impl LineGrouper for PrefixGrouper {
    fn group(&self, mut lines: Vec<LineCount>) -> Vec<LineGroup> {
        lines.sort_by(|a, b| a.line.cmp(&b.line).then(a.count.cmp(&b.count)));

        let mut iter = lines.into_iter();
        let Some(first) = iter.next() else {
            return Vec::new();
        };

        let mut groups = Vec::new();
        let mut prefix = first.line.clone();
        let mut members = vec![first];

        for line in iter {
            let (bytes, chars) = common_prefix(&prefix, &line.line);
            if chars >= self.min_prefix_length {
                prefix.truncate(bytes);
                members.push(line);
            } else {
                let closed = std::mem::replace(&mut prefix, line.line.clone());
                groups.push(LineGroup::new(closed, std::mem::take(&mut members)));
                members.push(line);
            }
        }
        groups.push(LineGroup::new(prefix, members));

        groups
    }
}

/// Length of the shared leading run of `a` and `b`, as (bytes, chars).
pub fn common_prefix(a: &str, b: &str) -> (usize, usize) {
    let mut bytes = 0;
    let mut chars = 0;
    for (x, y) in a.chars().zip(b.chars()) {
        if x != y {
            break;
        }
        bytes += x.len_utf8();
        chars += 1;
    }
    (bytes, chars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(input: &[(&str, u64)]) -> Vec<LineCount> {
        input.iter().map(|(l, c)| LineCount::new(*l, *c)).collect()
    }

    #[test]
    fn test_two_groups_example() {
        let grouper = PrefixGrouper::new(5).unwrap();
        let groups = grouper.group(lines(&[("abcde1", 1), ("abcde2", 3), ("xyz", 2)]));

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].prefix, "abcde");
        assert_eq!(groups[0].total_count, 4);
        assert_eq!(groups[0].members.len(), 2);
        assert_eq!(groups[1].prefix, "xyz");
        assert_eq!(groups[1].total_count, 2);
        assert_eq!(groups[1].members.len(), 1);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let grouper = PrefixGrouper::new(5).unwrap();
        let a = grouper.group(lines(&[("xyz", 2), ("abcde2", 3), ("abcde1", 1)]));
        let b = grouper.group(lines(&[("abcde1", 1), ("abcde2", 3), ("xyz", 2)]));
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_input() {
        assert!(PrefixGrouper::new(1).unwrap().group(Vec::new()).is_empty());
    }

    #[test]
    fn test_prefix_shrinks_as_group_grows() {
        let grouper = PrefixGrouper::new(4).unwrap();
        let groups = grouper.group(lines(&[
            ("conn lost to db", 1),
            ("conn reset by peer", 1),
            ("connection refused", 1),
        ]));

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].prefix, "conn");
        assert_eq!(groups[0].total_count, 3);
    }

    #[test]
    fn test_threshold_longer_than_line_needs_identical_text() {
        let grouper = PrefixGrouper::new(100).unwrap();
        let groups = grouper.group(lines(&[("short a", 1), ("short b", 1)]));
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| g.members.len() == 1));
    }

    #[test]
    fn test_sort_is_ordinal_case_sensitive() {
        let grouper = PrefixGrouper::new(1).unwrap();
        let groups = grouper.group(lines(&[("b", 1), ("B", 1), ("a", 1)]));
        let prefixes: Vec<_> = groups.iter().map(|g| g.prefix.as_str()).collect();
        assert_eq!(prefixes, vec!["B", "a", "b"]);
    }

    #[test]
    fn test_common_prefix_counts_chars() {
        assert_eq!(common_prefix("grüße x", "grüße y"), (8, 6));
        assert_eq!(common_prefix("abc", "abd"), (2, 2));
        assert_eq!(common_prefix("", "abc"), (0, 0));
        assert_eq!(common_prefix("abc", "abc"), (3, 3));
    }

    #[test]
    fn test_zero_threshold_rejected() {
        assert!(PrefixGrouper::new(0).unwrap_err().is_configuration());
    }
}
