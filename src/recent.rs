//! Recently compared archives
//!
//! Persisted as plain `LEFT:<path>` / `RIGHT:<path>` lines, most recent
//! first, at most [`MAX_RECENT`] per side.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;
use zipdelta_core::Side;

/// Entries kept per side
pub const MAX_RECENT: usize = 5;

/// Ledger file name inside the configuration directory
const LEDGER_FILE: &str = "recent_archives.txt";

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "ZIPDELTA_CONFIG_DIR";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecentArchives {
    left: Vec<PathBuf>,
    right: Vec<PathBuf>,
}

impl RecentArchives {
    /// Where the ledger lives unless told otherwise
    pub fn default_path() -> Option<PathBuf> {
        let dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::config_dir()?.join("zipdelta"),
        };
        Some(dir.join(LEDGER_FILE))
    }

    /// Load the ledger; a missing file is an empty ledger
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No recent archives ledger yet");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self::parse(&text))
    }

    /// Parse ledger text, ignoring lines without a known tag
    pub fn parse(text: &str) -> Self {
        let mut ledger = Self::default();

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let Some((tag, path)) = line.split_once(':') else {
                debug!(line, "Ignoring malformed ledger line");
                continue;
            };
            let side = match tag {
                "LEFT" | "ZIP1" => Side::Left,
                "RIGHT" | "ZIP2" => Side::Right,
                _ => {
                    debug!(line, "Ignoring ledger line with unknown tag");
                    continue;
                }
            };

            let list = ledger.list_mut(side);
            let path = PathBuf::from(path);
            if list.len() < MAX_RECENT && !list.contains(&path) {
                list.push(path);
            }
        }

        ledger
    }

    /// Rewrite the whole ledger file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, self.to_text())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!(path = %path.display(), "Saved recent archives");
        Ok(())
    }

    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for (tag, list) in [("LEFT", &self.left), ("RIGHT", &self.right)] {
            for path in list {
                text.push_str(&format!("{}:{}\n", tag, path.display()));
            }
        }
        text
    }

    /// Move `path` to the front of `side`'s list
    pub fn record(&mut self, side: Side, path: &Path) {
        let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let list = self.list_mut(side);
        list.retain(|p| p != &path);
        list.insert(0, path);
        list.truncate(MAX_RECENT);
    }

    pub fn list(&self, side: Side) -> &[PathBuf] {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn most_recent(&self, side: Side) -> Option<&Path> {
        self.list(side).first().map(PathBuf::as_path)
    }

    fn list_mut(&mut self, side: Side) -> &mut Vec<PathBuf> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_dedup_and_cap() {
        let mut ledger = RecentArchives::default();
        for i in 0..7 {
            ledger.record(Side::Left, Path::new(&format!("/tmp/a{i}.zip")));
        }
        ledger.record(Side::Left, Path::new("/tmp/a3.zip"));

        let left = ledger.list(Side::Left);
        assert_eq!(left.len(), MAX_RECENT);
        assert_eq!(left[0], PathBuf::from("/tmp/a3.zip"));
        assert_eq!(left[1], PathBuf::from("/tmp/a6.zip"));
        assert_eq!(left.iter().filter(|p| p.ends_with("a3.zip")).count(), 1);
        assert!(ledger.list(Side::Right).is_empty());
    }

    #[test]
    fn test_record_makes_absolute() {
        let mut ledger = RecentArchives::default();
        ledger.record(Side::Right, Path::new("relative.zip"));
        assert!(ledger.most_recent(Side::Right).unwrap().is_absolute());
    }

    #[test]
    fn test_parse_tolerates_junk() {
        let ledger = RecentArchives::parse(
            "LEFT:/data/one.zip\ngarbage\nRIGHT:/data/two.zip\nOTHER:/x.zip\n\nZIP1:/legacy.zip\n",
        );
        assert_eq!(
            ledger.list(Side::Left),
            &[PathBuf::from("/data/one.zip"), PathBuf::from("/legacy.zip")]
        );
        assert_eq!(ledger.most_recent(Side::Right), Some(Path::new("/data/two.zip")));
    }

    #[test]
    fn test_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(LEDGER_FILE);

        let mut ledger = RecentArchives::default();
        ledger.record(Side::Left, Path::new("/srv/test1.zip"));
        ledger.record(Side::Right, Path::new("/srv/test2.zip"));
        ledger.save(&path).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "LEFT:/srv/test1.zip\nRIGHT:/srv/test2.zip\n"
        );
        assert_eq!(RecentArchives::load(&path).unwrap(), ledger);
    }

    #[test]
    fn test_load_missing() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = RecentArchives::load(&dir.path().join("none.txt")).unwrap();
        assert_eq!(ledger, RecentArchives::default());
    }
}
