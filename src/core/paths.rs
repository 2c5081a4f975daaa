use std::path::{Component, Path, PathBuf};

/// Which half of the corpus a file belongs to.
///
/// Active notes live under the hot root, archived notes under the cold root.
/// Every file belongs to exactly one partition, decided by the directory it
/// was discovered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Hot,
    Cold,
}

impl Partition {
    /// Stable prefix used for the partition's tables in the index store.
    pub fn table_prefix(&self) -> &'static str {
        match self {
            Partition::Hot => "hot",
            Partition::Cold => "cold",
        }
    }
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_prefix())
    }
}

/// Well-known locations inside a corpus root.
pub struct CorpusPaths {
    pub root: PathBuf,
    pub active_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl CorpusPaths {
    pub fn from_root(root: PathBuf) -> Self {
        Self {
            active_dir: root.join("notes"),
            archive_dir: root.join("archive"),
            data_dir: root.join(".notemesh"),
            root,
        }
    }

    /// Corpus with non-default active/archive directories. Both must live
    /// under `root` for relative-path node identity to hold.
    pub fn with_dirs(root: PathBuf, active_dir: PathBuf, archive_dir: PathBuf) -> Self {
        Self {
            active_dir,
            archive_dir,
            data_dir: root.join(".notemesh"),
            root,
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("index.db")
    }

    pub fn partition_of(&self, path: &Path) -> Partition {
        if path.starts_with(&self.archive_dir) {
            Partition::Cold
        } else {
            Partition::Hot
        }
    }

    /// Corpus-relative identity for a file: forward-slash separated and
    /// stable across operating systems. Returns `None` for paths outside
    /// the corpus root.
    pub fn rel_path(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let mut out = String::new();
        for comp in rel.components() {
            match comp {
                Component::Normal(part) => {
                    if !out.is_empty() {
                        out.push('/');
                    }
                    out.push_str(&part.to_string_lossy());
                }
                Component::CurDir => {}
                _ => return None,
            }
        }
        if out.is_empty() {
            None
        } else {
            Some(out)
        }
    }
}

/// Lexically resolve a link target against the directory of its source note.
///
/// `source_rel` is the corpus-relative path of the linking note. Targets
/// starting with `/` resolve from the corpus root. Returns `None` when the
/// normalized result would escape the corpus root.
pub fn resolve_relative(source_rel: &str, target: &str) -> Option<String> {
    if let Some(rooted) = target.strip_prefix('/') {
        return normalize_segments(&[], rooted);
    }
    let mut base: Vec<&str> = source_rel.split('/').collect();
    base.pop(); // drop the filename, keep the directory
    normalize_segments(&base, target)
}

fn normalize_segments(base: &[&str], target: &str) -> Option<String> {
    let mut stack: Vec<&str> = base.to_vec();
    for seg in target.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                if stack.pop().is_none() {
                    return None;
                }
            }
            other => stack.push(other),
        }
    }
    if stack.is_empty() {
        None
    } else {
        Some(stack.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_of() {
        let paths = CorpusPaths::from_root(PathBuf::from("/corpus"));
        assert_eq!(
            paths.partition_of(Path::new("/corpus/notes/a.md")),
            Partition::Hot
        );
        assert_eq!(
            paths.partition_of(Path::new("/corpus/archive/old.md")),
            Partition::Cold
        );
    }

    #[test]
    fn test_rel_path() {
        let paths = CorpusPaths::from_root(PathBuf::from("/corpus"));
        assert_eq!(
            paths.rel_path(Path::new("/corpus/notes/dir/a.md")),
            Some("notes/dir/a.md".to_string())
        );
        assert_eq!(paths.rel_path(Path::new("/elsewhere/a.md")), None);
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(
            resolve_relative("notes/a.md", "b.md"),
            Some("notes/b.md".to_string())
        );
        assert_eq!(
            resolve_relative("notes/sub/a.md", "../dir/c.md"),
            Some("notes/dir/c.md".to_string())
        );
        assert_eq!(
            resolve_relative("notes/a.md", "/archive/old.md"),
            Some("archive/old.md".to_string())
        );
        // escaping the corpus root is rejected
        assert_eq!(resolve_relative("a.md", "../../outside.md"), None);
    }
}
