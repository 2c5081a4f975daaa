use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

use super::frontmatter::Frontmatter;
use super::paths::{CorpusPaths, Partition};

/// A note loaded from disk, with metadata resolved against the corpus.
pub struct Note {
    pub path: PathBuf,
    pub rel_path: String,
    pub partition: Partition,
    pub stem: String,
    pub title: String,
    pub tags: Vec<String>,
    pub content: String,
    pub mtime: i64,
    /// Set when the note carried a front-matter block that failed to parse.
    /// The note is still usable under its filename-stem title.
    pub frontmatter_error: bool,
}

impl Note {
    pub fn load(paths: &CorpusPaths, path: &Path) -> Result<Self> {
        let rel_path = paths
            .rel_path(path)
            .ok_or_else(|| anyhow!("path outside corpus root: {}", path.display()))?;
        let content = fs::read_to_string(path)?;
        let mtime = file_mtime(path)?;

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string();

        let (frontmatter, frontmatter_error) = match Frontmatter::parse(&content) {
            Ok(fm) => (fm, false),
            Err(_) => (None, true),
        };
        let fm = frontmatter.unwrap_or_default();
        let title = fm
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| stem.clone());

        Ok(Self {
            partition: paths.partition_of(path),
            path: path.to_path_buf(),
            rel_path,
            stem,
            title,
            tags: fm.tags,
            content,
            mtime,
            frontmatter_error,
        })
    }

    /// The body handed to the chunker: content minus front matter.
    pub fn body(&self) -> &str {
        Frontmatter::strip(&self.content)
    }
}

/// On-disk modification time as a unix timestamp in seconds.
pub fn file_mtime(path: &Path) -> Result<i64> {
    let metadata = fs::metadata(path)?;
    let modified: DateTime<Utc> = DateTime::from(metadata.modified()?);
    Ok(modified.timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> (tempfile::TempDir, CorpusPaths) {
        let dir = tempfile::tempdir().unwrap();
        let paths = CorpusPaths::from_root(dir.path().to_path_buf());
        fs::create_dir_all(&paths.active_dir).unwrap();
        (dir, paths)
    }

    #[test]
    fn test_load_with_frontmatter() {
        let (_dir, paths) = corpus();
        let file = paths.active_dir.join("alpha.md");
        fs::write(&file, "---\ntitle: Alpha Note\ntags: [one]\n---\nBody\n").unwrap();

        let note = Note::load(&paths, &file).unwrap();
        assert_eq!(note.title, "Alpha Note");
        assert_eq!(note.stem, "alpha");
        assert_eq!(note.tags, vec!["one"]);
        assert_eq!(note.rel_path, "notes/alpha.md");
        assert_eq!(note.partition, Partition::Hot);
        assert!(!note.frontmatter_error);
        assert_eq!(note.body(), "Body\n");
    }

    #[test]
    fn test_load_malformed_frontmatter_falls_back_to_stem() {
        let (_dir, paths) = corpus();
        let file = paths.active_dir.join("broken.md");
        fs::write(&file, "---\ntitle: [oops\n---\nBody [[Other]]\n").unwrap();

        let note = Note::load(&paths, &file).unwrap();
        assert_eq!(note.title, "broken");
        assert!(note.frontmatter_error);
        // the raw body is still available for link extraction
        assert!(note.content.contains("[[Other]]"));
    }
}
