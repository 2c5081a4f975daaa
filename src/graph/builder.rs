use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::core::note::Note;
use crate::core::paths::{resolve_relative, CorpusPaths, Partition};
use crate::core::walker::CorpusWalker;

use super::links::{extract_links, RawLink};

/// Per-node metadata kept alongside the adjacency sets.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub title: String,
    pub tags: Vec<String>,
}

/// Counters reported by a scan, for observability. `links` counts resolved,
/// deduplicated edges; raw occurrences that fail to resolve are dropped and
/// visible only as the gap between the two.
#[derive(Debug, Default, Serialize)]
pub struct ScanStats {
    pub files: usize,
    pub nodes: usize,
    pub links: usize,
    pub errors: usize,
}

/// Directed cross-reference graph over the note corpus.
///
/// Nodes are corpus-relative paths. Duplicate links between the same pair
/// collapse to one edge; self-loops are suppressed.
#[derive(Default)]
pub struct NoteGraph {
    nodes: HashMap<String, NodeInfo>,
    out: HashMap<String, HashSet<String>>,
    inc: HashMap<String, HashSet<String>>,
}

impl NoteGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear and rebuild the graph from scratch.
    ///
    /// Single pass over every file, then a second resolution pass once every
    /// node and lookup key is registered, so a link to a note scanned later
    /// still resolves and resolution is order-independent. Unresolved
    /// targets never create nodes.
    pub fn scan(&mut self, paths: &CorpusPaths, include_cold: bool) -> ScanStats {
        self.nodes.clear();
        self.out.clear();
        self.inc.clear();

        let mut stats = ScanStats::default();

        if !paths.active_dir.is_dir() && !(include_cold && paths.archive_dir.is_dir()) {
            eprintln!(
                "warning: no corpus roots found under {}",
                paths.root.display()
            );
            return stats;
        }

        let mut roots = vec![(paths.active_dir.clone(), Partition::Hot)];
        if include_cold {
            roots.push((paths.archive_dir.clone(), Partition::Cold));
        }

        // Lowercased stem and title both map to the owning note. On
        // collision the most recently registered note wins.
        let mut lookup: HashMap<String, String> = HashMap::new();
        let mut pending: Vec<(String, RawLink)> = Vec::new();

        for file in CorpusWalker::new(roots).files() {
            stats.files += 1;
            match Note::load(paths, &file.path) {
                Ok(note) => {
                    if note.frontmatter_error {
                        stats.errors += 1;
                    }
                    lookup.insert(note.stem.to_lowercase(), note.rel_path.clone());
                    lookup.insert(note.title.to_lowercase(), note.rel_path.clone());
                    for link in extract_links(&note.content) {
                        pending.push((note.rel_path.clone(), link));
                    }
                    self.nodes.insert(
                        note.rel_path,
                        NodeInfo {
                            title: note.title,
                            tags: note.tags,
                        },
                    );
                }
                Err(_) => {
                    // Unreadable files still get a node under their stem.
                    stats.errors += 1;
                    if let Some(rel) = paths.rel_path(&file.path) {
                        let stem = file
                            .path
                            .file_stem()
                            .and_then(|s| s.to_str())
                            .unwrap_or("")
                            .to_string();
                        lookup.insert(stem.to_lowercase(), rel.clone());
                        self.nodes.insert(
                            rel,
                            NodeInfo {
                                title: stem,
                                tags: Vec::new(),
                            },
                        );
                    }
                }
            }
        }

        for (source, link) in pending {
            let target = match link {
                RawLink::Wiki(name) => {
                    let key = name.to_lowercase();
                    lookup.get(&key).cloned().or_else(|| {
                        key.strip_suffix(".md")
                            .and_then(|stem| lookup.get(stem).cloned())
                    })
                }
                RawLink::Relative(target) => resolve_relative(&source, &target),
            };
            let target = match target {
                Some(t) if self.nodes.contains_key(&t) && t != source => t,
                _ => continue, // unresolved, out-of-corpus, or self-loop
            };
            if self.out.entry(source.clone()).or_default().insert(target.clone()) {
                self.inc.entry(target).or_default().insert(source);
                stats.links += 1;
            }
        }

        stats.nodes = self.nodes.len();
        stats
    }

    pub fn contains(&self, path: &str) -> bool {
        self.nodes.contains_key(path)
    }

    pub fn node(&self, path: &str) -> Option<&NodeInfo> {
        self.nodes.get(path)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn outlinks(&self, path: &str) -> Vec<String> {
        let mut links: Vec<String> = self
            .out
            .get(path)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        links.sort();
        links
    }

    pub fn backlinks(&self, path: &str) -> Vec<String> {
        let mut links: Vec<String> = self
            .inc
            .get(path)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        links.sort();
        links
    }

    /// Combined in+out degree.
    pub fn degree(&self, path: &str) -> usize {
        self.out.get(path).map(|s| s.len()).unwrap_or(0)
            + self.inc.get(path).map(|s| s.len()).unwrap_or(0)
    }

    /// The `n` most connected notes, ranked by in+out degree.
    pub fn hub_notes(&self, n: usize) -> Vec<(String, usize)> {
        let mut ranked: Vec<(String, usize)> = self
            .nodes
            .keys()
            .map(|path| (path.clone(), self.degree(path)))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }

    /// Notes with no links in either direction, sorted by path.
    pub fn orphan_notes(&self) -> Vec<String> {
        let mut orphans: Vec<String> = self
            .nodes
            .keys()
            .filter(|path| self.degree(path) == 0)
            .cloned()
            .collect();
        orphans.sort();
        orphans
    }

    /// All edges as (source, target) pairs, for export.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.out.iter().flat_map(|(source, targets)| {
            targets.iter().map(move |t| (source.as_str(), t.as_str()))
        })
    }

    /// All nodes with their metadata, for export.
    pub fn iter_nodes(&self) -> impl Iterator<Item = (&str, &NodeInfo)> {
        self.nodes.iter().map(|(path, info)| (path.as_str(), info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn corpus() -> (tempfile::TempDir, CorpusPaths) {
        let dir = tempfile::tempdir().unwrap();
        let paths = CorpusPaths::from_root(dir.path().to_path_buf());
        fs::create_dir_all(&paths.active_dir).unwrap();
        fs::create_dir_all(&paths.archive_dir).unwrap();
        (dir, paths)
    }

    #[test]
    fn test_link_round_trip() {
        let (_dir, paths) = corpus();
        fs::create_dir_all(paths.active_dir.join("sub")).unwrap();
        fs::create_dir_all(paths.active_dir.join("dir")).unwrap();
        fs::write(paths.active_dir.join("a.md"), "[[B]]").unwrap();
        fs::write(paths.active_dir.join("sub/b.md"), "[Link](../dir/c.md)").unwrap();
        fs::write(paths.active_dir.join("dir/c.md"), "").unwrap();

        let mut graph = NoteGraph::new();
        let stats = graph.scan(&paths, true);

        assert_eq!(stats.files, 3);
        assert_eq!(stats.nodes, 3);
        assert_eq!(stats.links, 2);
        assert_eq!(stats.errors, 0);

        assert_eq!(graph.outlinks("notes/a.md"), vec!["notes/sub/b.md"]);
        assert_eq!(graph.outlinks("notes/sub/b.md"), vec!["notes/dir/c.md"]);
        assert_eq!(graph.backlinks("notes/dir/c.md"), vec!["notes/sub/b.md"]);
        assert!(graph.outlinks("notes/dir/c.md").is_empty());
    }

    #[test]
    fn test_hub_and_orphan_queries() {
        let (_dir, paths) = corpus();
        fs::create_dir_all(paths.active_dir.join("sub")).unwrap();
        fs::create_dir_all(paths.active_dir.join("dir")).unwrap();
        fs::write(paths.active_dir.join("a.md"), "[[B]]").unwrap();
        fs::write(paths.active_dir.join("sub/b.md"), "[Link](../dir/c.md)").unwrap();
        fs::write(paths.active_dir.join("dir/c.md"), "").unwrap();
        fs::write(paths.active_dir.join("lonely.md"), "no links here").unwrap();

        let mut graph = NoteGraph::new();
        graph.scan(&paths, true);

        let hubs = graph.hub_notes(1);
        assert_eq!(hubs, vec![("notes/sub/b.md".to_string(), 2)]);
        assert_eq!(graph.orphan_notes(), vec!["notes/lonely.md"]);
    }

    #[test]
    fn test_unresolved_links_never_create_nodes() {
        let (_dir, paths) = corpus();
        fs::write(paths.active_dir.join("a.md"), "[[Missing]] [gone](nope.md)").unwrap();

        let mut graph = NoteGraph::new();
        let stats = graph.scan(&paths, true);

        assert_eq!(stats.nodes, 1);
        assert_eq!(stats.links, 0);
        assert!(!graph.contains("notes/nope.md"));
    }

    #[test]
    fn test_duplicate_links_collapse_and_self_loops_drop() {
        let (_dir, paths) = corpus();
        fs::write(paths.active_dir.join("a.md"), "[[B]] [[B]] [[A]]").unwrap();
        fs::write(paths.active_dir.join("b.md"), "").unwrap();

        let mut graph = NoteGraph::new();
        let stats = graph.scan(&paths, true);

        assert_eq!(stats.links, 1);
        assert_eq!(graph.degree("notes/a.md"), 1);
    }

    #[test]
    fn test_title_lookup_resolves_wikilinks() {
        let (_dir, paths) = corpus();
        fs::write(
            paths.active_dir.join("2024-01-01.md"),
            "---\ntitle: Planning Meeting\n---\n",
        )
        .unwrap();
        fs::write(paths.active_dir.join("a.md"), "See [[Planning Meeting]]").unwrap();

        let mut graph = NoteGraph::new();
        graph.scan(&paths, true);

        assert_eq!(graph.outlinks("notes/a.md"), vec!["notes/2024-01-01.md"]);
    }

    #[test]
    fn test_include_cold_false_excludes_archive() {
        let (_dir, paths) = corpus();
        fs::write(paths.active_dir.join("a.md"), "[[old]]").unwrap();
        fs::write(paths.archive_dir.join("old.md"), "").unwrap();

        let mut graph = NoteGraph::new();
        let stats = graph.scan(&paths, false);
        assert_eq!(stats.nodes, 1);
        assert_eq!(stats.links, 0);
        assert!(!graph.contains("archive/old.md"));

        let stats = graph.scan(&paths, true);
        assert_eq!(stats.nodes, 2);
        assert_eq!(stats.links, 1);
    }

    #[test]
    fn test_malformed_frontmatter_still_indexed() {
        let (_dir, paths) = corpus();
        fs::write(
            paths.active_dir.join("broken.md"),
            "---\ntitle: [oops\n---\n[[a]]\n",
        )
        .unwrap();
        fs::write(paths.active_dir.join("a.md"), "").unwrap();

        let mut graph = NoteGraph::new();
        let stats = graph.scan(&paths, true);

        assert_eq!(stats.errors, 1);
        assert_eq!(stats.nodes, 2);
        // links from the raw body still resolve
        assert_eq!(graph.outlinks("notes/broken.md"), vec!["notes/a.md"]);
    }

    #[test]
    fn test_stem_collision_last_registered_wins() {
        let (_dir, paths) = corpus();
        fs::write(paths.active_dir.join("x.md"), "[[same]]").unwrap();
        fs::write(paths.active_dir.join("same.md"), "").unwrap();
        fs::write(paths.archive_dir.join("same.md"), "").unwrap();

        let mut graph = NoteGraph::new();
        let stats = graph.scan(&paths, true);

        // exactly one of the two candidates got the edge
        assert_eq!(stats.links, 1);
        assert_eq!(graph.outlinks("notes/x.md").len(), 1);
    }

    #[test]
    fn test_missing_root_returns_empty_stats() {
        let paths = CorpusPaths::from_root(PathBuf::from("/nonexistent/corpus"));
        let mut graph = NoteGraph::new();
        let stats = graph.scan(&paths, true);
        assert_eq!(stats.files, 0);
        assert_eq!(stats.nodes, 0);
    }
}
