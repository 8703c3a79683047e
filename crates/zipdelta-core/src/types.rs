//! Common types used across zipdelta
//!
//! This module provides the identifiers and classifications shared by the
//! engine and its front ends.

use serde::{Deserialize, Serialize};

/// Path separator used inside archives
pub const SEPARATOR: char = '/';

/// Which of the two compared archives a value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Both sides, left first
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    /// The opposite side
    pub fn other(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// Identifier of a node inside one side's tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Node ID for an arena index; `None` past `u32::MAX`
    pub fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(Self)
    }

    /// Arena index of this node
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of a tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Directory node (structural, may be implied by file paths)
    Directory,
    /// File node (leaf)
    File,
}

/// Classification of a node after comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Present on both sides with identical metadata
    Same,
    /// Present only in the left archive
    OnlyLeft,
    /// Present only in the right archive
    OnlyRight,
    /// Size or checksum differ
    ContentDiff,
    /// Content matches, modification time differs
    DateDiff,
    /// Stand-in on the side lacking the entry
    Placeholder,
    /// Some descendant differs
    #[serde(rename = "dir_diff")]
    DirectoryDiff,
}

impl Status {
    /// Every status, in legend order
    pub const ALL: [Status; 7] = [
        Status::OnlyLeft,
        Status::OnlyRight,
        Status::ContentDiff,
        Status::DateDiff,
        Status::Same,
        Status::Placeholder,
        Status::DirectoryDiff,
    ];

    /// Leaf statuses that make an enclosing directory differ
    pub fn is_difference(self) -> bool {
        matches!(
            self,
            Status::OnlyLeft | Status::OnlyRight | Status::ContentDiff | Status::DateDiff
        )
    }

    /// Stable tag used in reports
    pub fn tag(self) -> &'static str {
        match self {
            Status::Same => "same",
            Status::OnlyLeft => "only_left",
            Status::OnlyRight => "only_right",
            Status::ContentDiff => "content_diff",
            Status::DateDiff => "date_diff",
            Status::Placeholder => "placeholder",
            Status::DirectoryDiff => "dir_diff",
        }
    }

    /// Human readable label for legends
    pub fn label(self) -> &'static str {
        match self {
            Status::Same => "Identical",
            Status::OnlyLeft => "Only left",
            Status::OnlyRight => "Only right",
            Status::ContentDiff => "Content differs",
            Status::DateDiff => "Date differs",
            Status::Placeholder => "Placeholder",
            Status::DirectoryDiff => "Directory with differences",
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::Same
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}
