//! Search engine: keeps the index store synchronized with the corpus and
//! answers hybrid keyword+semantic queries.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::core::frontmatter::Frontmatter;
use crate::core::note::{file_mtime, Note};
use crate::core::paths::{CorpusPaths, Partition};
use crate::core::walker::CorpusWalker;

use super::chunker::{split_chunks, DEFAULT_CHUNK_WORDS};
use super::embedding::EmbeddingModel;
use super::store::{IndexStore, NoteRecord};

/// Opaque content transform applied before anything is embedded or stored
/// (secret scrubbing lives outside this crate).
pub type Sanitizer = Box<dyn Fn(&str) -> String + Send + Sync>;

/// What `index_file` did for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
    Indexed,
    /// Recorded mtime matched the on-disk mtime; nothing was touched.
    UpToDate,
}

/// Counters for a batch indexing run.
#[derive(Debug, Default, Serialize)]
pub struct IndexStats {
    pub indexed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub duration_ms: u128,
}

/// Which retrieval mechanism produced a result. Provenance for display and
/// debugging, not an input to ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchSource {
    Vector,
    Keyword,
}

impl std::fmt::Display for MatchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchSource::Vector => f.write_str("vector"),
            MatchSource::Keyword => f.write_str("keyword"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub path: String,
    pub content: String,
    pub score: f32,
    pub source: MatchSource,
}

/// Hybrid search engine over both corpus partitions.
///
/// The embedding model and the FTS backend are optional acceleration
/// layers: when either is absent, its half of a hybrid result is empty and
/// the other half still answers.
pub struct SearchEngine {
    model: Option<EmbeddingModel>,
    store: IndexStore,
    paths: CorpusPaths,
    sanitizer: Option<Sanitizer>,
    max_chunk_words: usize,
    stop: Arc<AtomicBool>,
}

impl SearchEngine {
    pub fn new(paths: CorpusPaths, store: IndexStore) -> Self {
        Self {
            model: Some(EmbeddingModel::new()),
            store,
            paths,
            sanitizer: None,
            max_chunk_words: DEFAULT_CHUNK_WORDS,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Engine with the vector half disabled; searches are keyword-only.
    pub fn without_model(paths: CorpusPaths, store: IndexStore) -> Self {
        Self {
            model: None,
            ..Self::new(paths, store)
        }
    }

    pub fn with_sanitizer(mut self, sanitizer: Sanitizer) -> Self {
        self.sanitizer = Some(sanitizer);
        self
    }

    pub fn with_chunk_words(mut self, max_words: usize) -> Self {
        self.max_chunk_words = max_words;
        self
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// Flag checked between files during batch indexing; the CLI wires it
    /// to termination signals so an interrupt skips remaining files and
    /// still reaches the close-time checkpoint.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Index one file. Unless `force`, a file whose on-disk mtime equals
    /// the recorded mtime is skipped without touching any table.
    pub fn index_file(&mut self, path: &Path, force: bool) -> Result<IndexOutcome> {
        let partition = self.paths.partition_of(path);
        let rel_path = self
            .paths
            .rel_path(path)
            .ok_or_else(|| anyhow!("path outside corpus root: {}", path.display()))?;

        if !force {
            let on_disk = file_mtime(path)?;
            if self.store.recorded_mtime(partition, &rel_path)? == Some(on_disk) {
                return Ok(IndexOutcome::UpToDate);
            }
        }

        let note = Note::load(&self.paths, path)?;
        let sanitized = match &self.sanitizer {
            Some(sanitize) => sanitize(&note.content),
            None => note.content.clone(),
        };

        let chunk_texts = split_chunks(Frontmatter::strip(&sanitized), self.max_chunk_words);
        let chunks: Vec<(String, Vec<f32>)> = match &self.model {
            Some(model) => {
                // one model invocation per file, never one per chunk
                let refs: Vec<&str> = chunk_texts.iter().map(|s| s.as_str()).collect();
                let vectors = model.embed_batch(&refs);
                chunk_texts.into_iter().zip(vectors).collect()
            }
            None => Vec::new(),
        };

        let record = NoteRecord {
            path: rel_path,
            title: note.title,
            content: sanitized,
            tags: note.tags,
            mtime: note.mtime,
        };
        self.store.index_document(partition, &record, &chunks)?;

        Ok(IndexOutcome::Indexed)
    }

    /// Index every matching file under both roots. Per-file failures are
    /// logged and counted, never fatal to the batch.
    pub fn index_all(&mut self, force: bool) -> Result<IndexStats> {
        let start = Instant::now();
        let mut stats = IndexStats::default();

        let walker = CorpusWalker::new(vec![
            (self.paths.active_dir.clone(), Partition::Hot),
            (self.paths.archive_dir.clone(), Partition::Cold),
        ]);
        for file in walker.files() {
            if self.stop.load(Ordering::SeqCst) {
                break; // skip remaining files, close path still runs
            }
            match self.index_file(&file.path, force) {
                Ok(IndexOutcome::Indexed) => stats.indexed += 1,
                Ok(IndexOutcome::UpToDate) => stats.skipped += 1,
                Err(e) => {
                    eprintln!("failed to index {}: {}", file.path.display(), e);
                    stats.failed += 1;
                }
            }
        }

        stats.duration_ms = start.elapsed().as_millis();
        Ok(stats)
    }

    /// Full rebuild: re-index every file regardless of recorded mtimes.
    pub fn rebuild(&mut self) -> Result<IndexStats> {
        self.index_all(true)
    }

    /// Hybrid query over both partitions and both mechanisms.
    ///
    /// BM25 and cosine scores are not on a common scale; the union is
    /// sorted by raw score anyway, a documented limitation of this
    /// deliberately simple merge. Results are deduplicated by exact
    /// content match, keeping the higher-scored occurrence.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let mut results: Vec<SearchResult> = Vec::new();

        if let Some(model) = &self.model {
            let query_vec = model.embed(query);
            for partition in [Partition::Hot, Partition::Cold] {
                match self.store.similar_chunks(partition, &query_vec, limit) {
                    Ok(hits) => results.extend(hits.into_iter().map(|h| SearchResult {
                        path: h.path,
                        content: h.text,
                        score: h.score,
                        source: MatchSource::Vector,
                    })),
                    Err(e) => {
                        eprintln!("warning: vector search failed ({}): {}", partition, e)
                    }
                }
            }
        }

        for partition in [Partition::Hot, Partition::Cold] {
            match self.store.keyword_search(partition, query, limit) {
                Ok(hits) => results.extend(hits.into_iter().map(|h| SearchResult {
                    path: h.path,
                    content: h.content,
                    score: h.score,
                    source: MatchSource::Keyword,
                })),
                Err(e) => {
                    eprintln!("warning: keyword search failed ({}): {}", partition, e)
                }
            }
        }

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let mut seen = HashSet::new();
        results.retain(|r| seen.insert(r.content.clone()));
        results.truncate(limit);

        Ok(results)
    }

    /// Checkpoint and release the underlying store.
    pub fn close(self) -> Result<()> {
        self.store.close()
    }
}
