use std::collections::HashSet;
use std::path::PathBuf;

use walkdir::WalkDir;

use super::paths::Partition;

/// Directories never descended into. Corpora often sit next to tool and
/// dependency caches; pruning happens before recursion, not after.
const IGNORED_DIRS: &[&str] = &[
    ".git",
    ".obsidian",
    ".notemesh",
    "node_modules",
    "target",
    ".venv",
    "__pycache__",
    "vendor",
    ".cache",
];

const ALLOWED_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Files larger than this are not worth indexing as notes.
const MAX_FILE_SIZE: u64 = 2 * 1024 * 1024;

/// A file discovered during a corpus walk, tagged with its partition.
#[derive(Debug, Clone)]
pub struct WalkedFile {
    pub path: PathBuf,
    pub partition: Partition,
}

/// Enumerates note files under one or more root directories.
///
/// Missing roots yield nothing. The same path is never yielded twice, even
/// when roots overlap. No ordering guarantee.
pub struct CorpusWalker {
    roots: Vec<(PathBuf, Partition)>,
    extensions: Vec<String>,
}

impl CorpusWalker {
    pub fn new(roots: Vec<(PathBuf, Partition)>) -> Self {
        Self {
            roots,
            extensions: ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|e| e.to_lowercase()).collect();
        self
    }

    pub fn files(self) -> impl Iterator<Item = WalkedFile> {
        let mut seen: HashSet<PathBuf> = HashSet::new();
        let extensions = self.extensions;
        self.roots.into_iter().flat_map(move |(root, partition)| {
            let mut files = Vec::new();
            if !root.is_dir() {
                return files.into_iter();
            }
            let walk = WalkDir::new(root)
                .follow_links(false)
                .into_iter()
                .filter_entry(|e| !is_ignored_dir(e));
            for entry in walk.flatten() {
                if !entry.file_type().is_file() {
                    continue;
                }
                if !has_allowed_extension(entry.path(), &extensions) {
                    continue;
                }
                if entry.metadata().map(|m| m.len() > MAX_FILE_SIZE).unwrap_or(true) {
                    continue;
                }
                let path = entry.into_path();
                if seen.insert(path.clone()) {
                    files.push(WalkedFile { path, partition });
                }
            }
            files.into_iter()
        })
    }
}

fn is_ignored_dir(entry: &walkdir::DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .map(|name| IGNORED_DIRS.contains(&name))
        .unwrap_or(false)
}

fn has_allowed_extension(path: &std::path::Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let lower = e.to_lowercase();
            extensions.iter().any(|allowed| *allowed == lower)
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_walks_recursively_with_extension_filter() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("a.md"), "a").unwrap();
        fs::write(root.join("sub/b.markdown"), "b").unwrap();
        fs::write(root.join("sub/skip.txt"), "nope").unwrap();

        let walker = CorpusWalker::new(vec![(root.to_path_buf(), Partition::Hot)]);
        let mut names: Vec<String> = walker
            .files()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.md", "b.markdown"]);
    }

    #[test]
    fn test_prunes_ignored_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("node_modules/pkg/readme.md"), "vendored").unwrap();
        fs::write(root.join("real.md"), "real").unwrap();

        let walker = CorpusWalker::new(vec![(root.to_path_buf(), Partition::Hot)]);
        let files: Vec<_> = walker.files().collect();
        assert_eq!(files.len(), 1);
        assert!(files[0].path.ends_with("real.md"));
    }

    #[test]
    fn test_overlapping_roots_never_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("a.md"), "a").unwrap();

        let walker = CorpusWalker::new(vec![
            (root.to_path_buf(), Partition::Hot),
            (root.to_path_buf(), Partition::Hot),
        ]);
        assert_eq!(walker.files().count(), 1);
    }

    #[test]
    fn test_custom_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("a.md"), "a").unwrap();
        fs::write(root.join("b.txt"), "b").unwrap();

        let walker = CorpusWalker::new(vec![(root.to_path_buf(), Partition::Hot)])
            .with_extensions(&["txt"]);
        let files: Vec<_> = walker.files().collect();
        assert_eq!(files.len(), 1);
        assert!(files[0].path.ends_with("b.txt"));
    }

    #[test]
    fn test_missing_root_yields_nothing() {
        let walker = CorpusWalker::new(vec![(
            PathBuf::from("/nonexistent/corpus/root"),
            Partition::Hot,
        )]);
        assert_eq!(walker.files().count(), 0);
    }
}
