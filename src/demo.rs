//! Sample archives for trying the tool out

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;
use zip::write::FileOptions;

const LEFT_FILES: [(&str, &[u8]); 7] = [
    ("project/docs/readme.txt", b"README for ZIP1"),
    ("project/docs/install.txt", b"Installation guide v1"),
    ("project/src/main.py", b"print(\"Hello from ZIP1\")"),
    ("project/src/utils/helper.py", b"def helper(): pass"),
    ("project/tests/test_main.py", b"assert True"),
    ("data/images/icon.png", b"\x89PNG\r\nfakeimage"),
    ("data/config.json", b"{\"version\": \"1.0\"}"),
];

const RIGHT_FILES: [(&str, &[u8]); 7] = [
    ("project/docs/readme.txt", b"README for ZIP2 (updated)"),
    ("project/docs/install.txt", b"Installation guide v1"),
    ("project/src/main.py", b"print(\"Hello from ZIP2\")"),
    ("project/src/utils/extra.py", b"def extra(): pass"),
    ("project/tests/test_extra.py", b"assert False"),
    ("data/images/icon.png", b"\x89PNG\r\nfakeimage"),
    ("data/config.json", b"{\"version\": \"1.1\"}"),
];

/// Create `test1.zip` and `test2.zip` in `dir` unless they already exist
///
/// Returns the archives that were written.
pub fn create_demo_archives(dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut created = Vec::new();
    for (name, files) in [("test1.zip", &LEFT_FILES), ("test2.zip", &RIGHT_FILES)] {
        let path = dir.join(name);
        if path.exists() {
            info!(path = %path.display(), "Sample archive already exists");
            continue;
        }
        write_archive(&path, files)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), files = files.len(), "Created sample archive");
        created.push(path);
    }
    Ok(created)
}

fn write_archive(path: &Path, files: &[(&str, &[u8])]) -> Result<()> {
    let mut writer = zip::ZipWriter::new(File::create(path)?);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for (name, contents) in files {
        writer.start_file(*name, options)?;
        writer.write_all(contents)?;
    }
    writer.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use zipdelta_parsers::read_archive;

    #[test]
    fn test_creates_both_once() {
        let dir = tempfile::tempdir().unwrap();

        let created = create_demo_archives(dir.path()).unwrap();
        assert_eq!(created.len(), 2);

        let listing = read_archive(&dir.path().join("test1.zip")).unwrap();
        assert_eq!(listing.len(), 7);
        assert_eq!(listing["data/config.json"].size, Some(18));

        assert!(create_demo_archives(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_keeps_existing_archive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("test1.zip"), b"mine").unwrap();

        let created = create_demo_archives(dir.path()).unwrap();
        assert_eq!(created, vec![dir.path().join("test2.zip")]);
        assert_eq!(std::fs::read(dir.path().join("test1.zip")).unwrap(), b"mine");
    }
}
