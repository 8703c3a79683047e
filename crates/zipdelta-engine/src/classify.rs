//! Leaf classification and directory aggregation

use std::collections::HashMap;

use zipdelta_core::Status;
use zipdelta_parsers::ArchiveEntry;

use crate::config::ChecksumPolicy;
use crate::path::ancestors;

/// Statuses assigned to the two nodes of one leaf path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafClassification {
    pub left: Status,
    pub right: Status,
}

impl LeafClassification {
    fn both(status: Status) -> Self {
        Self {
            left: status,
            right: status,
        }
    }

    /// Whether this leaf makes its enclosing directories differ
    pub fn differs(&self) -> bool {
        self.left.is_difference() || self.right.is_difference()
    }
}

/// Classify one leaf path from the entries present on each side
///
/// Returns `None` when neither side has an entry.
pub fn classify_leaf(
    left: Option<&ArchiveEntry>,
    right: Option<&ArchiveEntry>,
    policy: ChecksumPolicy,
) -> Option<LeafClassification> {
    let classification = match (left, right) {
        (None, None) => return None,
        (None, Some(_)) => LeafClassification {
            left: Status::Placeholder,
            right: Status::OnlyRight,
        },
        (Some(_), None) => LeafClassification {
            left: Status::OnlyLeft,
            right: Status::Placeholder,
        },
        (Some(l), Some(r)) if !content_matches(l, r, policy) => {
            LeafClassification::both(Status::ContentDiff)
        }
        (Some(l), Some(r)) if l.modified_at != r.modified_at => {
            LeafClassification::both(Status::DateDiff)
        }
        (Some(_), Some(_)) => LeafClassification::both(Status::Same),
    };
    Some(classification)
}

/// Compare `(size, checksum)` under the given policy
pub fn content_matches(left: &ArchiveEntry, right: &ArchiveEntry, policy: ChecksumPolicy) -> bool {
    let sizes_match = left.size == right.size;

    match (left.checksum, right.checksum, policy) {
        (Some(l), Some(r), _) => sizes_match && l == r,
        (None, None, ChecksumPolicy::Strict) => sizes_match,
        (_, _, ChecksumPolicy::Strict) => false,
        (_, _, ChecksumPolicy::SizeOnlyWhenMissing) => sizes_match,
    }
}

/// Running count of differing leaves below every directory path
#[derive(Debug, Default)]
pub struct DirectoryAccumulator {
    differing: HashMap<String, usize>,
}

impl DirectoryAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a classified leaf against all of its ancestors
    pub fn record(&mut self, leaf_path: &str, classification: LeafClassification) {
        if !classification.differs() {
            return;
        }
        for dir in ancestors(leaf_path) {
            *self.differing.entry(dir).or_insert(0) += 1;
        }
    }

    /// Number of differing leaves anywhere below `dir_path`
    pub fn differing_leaves(&self, dir_path: &str) -> usize {
        self.differing.get(dir_path).copied().unwrap_or(0)
    }

    /// Aggregate status of a directory
    pub fn directory_status(&self, dir_path: &str, propagate: bool) -> Status {
        if propagate && self.differing_leaves(dir_path) > 0 {
            Status::DirectoryDiff
        } else {
            Status::Same
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> Option<chrono::NaiveDateTime> {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
    }

    fn entry(size: u64, crc: u32, hour: u32) -> ArchiveEntry {
        ArchiveEntry::file("a.txt", size, crc, at(hour))
    }

    fn no_checksum(size: u64) -> ArchiveEntry {
        ArchiveEntry {
            checksum: None,
            ..entry(size, 0, 9)
        }
    }

    fn classify(l: Option<&ArchiveEntry>, r: Option<&ArchiveEntry>) -> LeafClassification {
        classify_leaf(l, r, ChecksumPolicy::Strict).unwrap()
    }

    #[test]
    fn test_one_sided() {
        let e = entry(1, 1, 9);
        assert_eq!(
            classify(Some(&e), None),
            LeafClassification { left: Status::OnlyLeft, right: Status::Placeholder }
        );
        assert_eq!(
            classify(None, Some(&e)),
            LeafClassification { left: Status::Placeholder, right: Status::OnlyRight }
        );
        assert!(classify_leaf(None, None, ChecksumPolicy::Strict).is_none());
    }

    #[test]
    fn test_same() {
        let c = classify(Some(&entry(10, 7, 9)), Some(&entry(10, 7, 9)));
        assert_eq!(c, LeafClassification::both(Status::Same));
        assert!(!c.differs());
    }

    #[test]
    fn test_content_beats_date() {
        let c = classify(Some(&entry(10, 7, 9)), Some(&entry(10, 8, 11)));
        assert_eq!(c.left, Status::ContentDiff);

        let c = classify(Some(&entry(10, 7, 9)), Some(&entry(11, 7, 9)));
        assert_eq!(c.right, Status::ContentDiff);
    }

    #[test]
    fn test_date_only() {
        let c = classify(Some(&entry(10, 7, 9)), Some(&entry(10, 7, 11)));
        assert_eq!(c, LeafClassification::both(Status::DateDiff));

        let mut undated = entry(10, 7, 9);
        undated.modified_at = None;
        let c = classify(Some(&undated), Some(&entry(10, 7, 9)));
        assert_eq!(c.left, Status::DateDiff);
        assert_eq!(classify(Some(&undated), Some(&undated)).left, Status::Same);
    }

    #[test]
    fn test_checksum_policy() {
        let with = entry(10, 7, 9);
        let without = no_checksum(10);

        assert!(!content_matches(&with, &without, ChecksumPolicy::Strict));
        assert!(content_matches(&without, &without, ChecksumPolicy::Strict));
        assert!(content_matches(&with, &without, ChecksumPolicy::SizeOnlyWhenMissing));
        assert!(!content_matches(&with, &no_checksum(11), ChecksumPolicy::SizeOnlyWhenMissing));
        assert!(!content_matches(&with, &entry(10, 8, 9), ChecksumPolicy::SizeOnlyWhenMissing));
    }

    #[test]
    fn test_accumulator() {
        let mut acc = DirectoryAccumulator::new();
        acc.record("a/b/c.txt", LeafClassification::both(Status::ContentDiff));
        acc.record("a/d.txt", LeafClassification::both(Status::Same));
        acc.record(
            "x/y.txt",
            LeafClassification { left: Status::Placeholder, right: Status::OnlyRight },
        );

        assert_eq!(acc.differing_leaves("a/"), 1);
        assert_eq!(acc.directory_status("a/b/", true), Status::DirectoryDiff);
        assert_eq!(acc.directory_status("a/b/", false), Status::Same);
        assert_eq!(acc.directory_status("x/", true), Status::DirectoryDiff);
        assert_eq!(acc.directory_status("empty/", true), Status::Same);
    }
}
