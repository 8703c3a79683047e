//! Archive path utilities
//!
//! Entry paths are `/` separated. A trailing separator marks a directory;
//! the canonical form of a directory path always carries it, the canonical
//! form of a file path never does.

use zipdelta_core::{NodeKind, SEPARATOR};

/// A path split into its segments plus the kind of the final segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPath<'a> {
    /// Non-empty segments, root first
    pub segments: Vec<&'a str>,
    /// Kind of the last segment
    pub kind: NodeKind,
}

impl SplitPath<'_> {
    /// Whether the path had no segments at all
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Split an entry path into segments
///
/// Backslashes count as separators and empty segments are dropped, so
/// `"a//b\\c.txt"` splits the same as `"a/b/c.txt"`.
pub fn split_segments(path: &str) -> SplitPath<'_> {
    let kind = if path.ends_with(SEPARATOR) || path.ends_with('\\') {
        NodeKind::Directory
    } else {
        NodeKind::File
    };

    let segments = path
        .split(|c| c == SEPARATOR || c == '\\')
        .filter(|s| !s.is_empty())
        .collect();

    SplitPath { segments, kind }
}

/// Join segments into a canonical full path
pub fn join_segments<S: AsRef<str>>(segments: &[S], kind: NodeKind) -> String {
    let mut path = segments
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("/");

    if kind == NodeKind::Directory && !path.is_empty() {
        path.push(SEPARATOR);
    }
    path
}

/// Canonical form of a path of the given kind
pub fn canonical(path: &str, kind: NodeKind) -> String {
    join_segments(&split_segments(path).segments, kind)
}

/// Canonical paths of every directory enclosing `path`, outermost first
pub fn ancestors(path: &str) -> Vec<String> {
    let split = split_segments(path);
    (1..split.segments.len())
        .map(|len| join_segments(&split.segments[..len], NodeKind::Directory))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_segments() {
        let split = split_segments("project/docs/readme.txt");
        assert_eq!(split.segments, vec!["project", "docs", "readme.txt"]);
        assert_eq!(split.kind, NodeKind::File);

        let split = split_segments("project/docs/");
        assert_eq!(split.segments, vec!["project", "docs"]);
        assert_eq!(split.kind, NodeKind::Directory);

        assert_eq!(split_segments("a//b\\c.txt").segments, vec!["a", "b", "c.txt"]);
        assert!(split_segments("/").is_empty());
        assert!(split_segments("").is_empty());
    }

    #[test]
    fn test_join_segments() {
        assert_eq!(join_segments(&["a", "b"], NodeKind::Directory), "a/b/");
        assert_eq!(join_segments(&["a", "b.txt"], NodeKind::File), "a/b.txt");
        assert_eq!(join_segments::<&str>(&[], NodeKind::Directory), "");
    }

    #[test]
    fn test_canonical() {
        assert_eq!(canonical("/data//config.json", NodeKind::File), "data/config.json");
        assert_eq!(canonical("data", NodeKind::Directory), "data/");
        assert_eq!(canonical("project\\src/", NodeKind::Directory), "project/src/");
    }

    #[test]
    fn test_ancestors() {
        assert_eq!(ancestors("a/b/c.txt"), vec!["a/", "a/b/"]);
        assert_eq!(ancestors("a/b/"), vec!["a/"]);
        assert!(ancestors("top.txt").is_empty());
        assert!(ancestors("top/").is_empty());
    }
}
