//! Persistent index over SQLite: per-partition full-text and chunk tables.
//!
//! Embeddings are stored as little-endian f32 BLOBs and ranked in Rust;
//! the keyword half rides on FTS5 from the bundled SQLite build. The store
//! owns exactly one connection; callers pass the handle down instead of
//! sharing process-wide state.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::core::paths::Partition;

use super::embedding::cosine_similarity;

/// Compared verbatim against the stored marker on every open.
pub const SCHEMA_VERSION: i64 = 1;

/// One full-text record per file per partition, keyed by corpus-relative
/// path.
#[derive(Debug, Clone)]
pub struct NoteRecord {
    pub path: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub mtime: i64,
}

/// A BM25 hit from the full-text half.
#[derive(Debug)]
pub struct KeywordHit {
    pub path: String,
    pub content: String,
    pub score: f32,
}

/// A cosine-similarity hit from the chunk-embedding half.
#[derive(Debug)]
pub struct ChunkHit {
    pub path: String,
    pub chunk_id: i64,
    pub text: String,
    pub score: f32,
}

#[derive(Debug, Default)]
pub struct StoreStats {
    pub hot_notes: usize,
    pub cold_notes: usize,
    pub hot_chunks: usize,
    pub cold_chunks: usize,
}

pub struct IndexStore {
    conn: Connection,
    fts_enabled: bool,
    migrated: bool,
}

impl IndexStore {
    /// Open or create the store at `db_path`. Idempotent: when the schema
    /// marker already matches, no DDL is issued at all. Re-validating
    /// `CREATE TABLE IF NOT EXISTS` on every open is measurable cold-start
    /// latency for an interactive tool.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)
            .with_context(|| format!("failed to open index at {}", db_path.display()))?;
        Self::init(conn)
    }

    /// In-memory store, for tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        // WAL keeps readers unblocked during writes; the checkpoint on
        // close() is what makes interrupted sessions durable.
        let _mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        let (migrated, fts_enabled) = Self::ensure_schema(&conn)?;
        Ok(Self {
            conn,
            fts_enabled,
            migrated,
        })
    }

    fn ensure_schema(conn: &Connection) -> Result<(bool, bool)> {
        if stored_version(conn) == Some(SCHEMA_VERSION) {
            return Ok((false, fts_tables_present(conn)?));
        }

        let mut ddl = String::from(
            "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY);\n",
        );
        for partition in [Partition::Hot, Partition::Cold] {
            ddl.push_str(&base_tables(partition.table_prefix()));
        }
        // Task queue and event log are owned by external collaborators but
        // live in the same store; the core only creates them.
        ddl.push_str(
            "CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL,
                payload TEXT,
                status TEXT NOT NULL DEFAULT 'queued',
                created_at INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL,
                detail TEXT,
                created_at INTEGER NOT NULL
            );\n",
        );
        conn.execute_batch(&ddl)?;

        // FTS5 is an optional acceleration: without it the keyword half of
        // hybrid search degrades to empty instead of failing the open.
        let mut fts_ddl = String::new();
        for partition in [Partition::Hot, Partition::Cold] {
            fts_ddl.push_str(&fts_tables(partition.table_prefix()));
        }
        let fts_enabled = match conn.execute_batch(&fts_ddl) {
            Ok(()) => true,
            Err(e) => {
                eprintln!("warning: full-text search unavailable: {}", e);
                false
            }
        };

        conn.execute("DELETE FROM schema_version", [])?;
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            params![SCHEMA_VERSION],
        )?;

        Ok((true, fts_enabled))
    }

    /// Whether this open ran schema DDL (false on the fast path).
    pub fn did_migrate(&self) -> bool {
        self.migrated
    }

    /// Whether the BM25 keyword half is available.
    pub fn fts_enabled(&self) -> bool {
        self.fts_enabled
    }

    /// The mtime recorded for `path` at last indexing, if any. Incremental
    /// indexing compares this against the on-disk mtime.
    pub fn recorded_mtime(&self, partition: Partition, path: &str) -> Result<Option<i64>> {
        let sql = format!(
            "SELECT mtime FROM {}_notes WHERE path = ?1",
            partition.table_prefix()
        );
        self.conn
            .query_row(&sql, params![path], |row| row.get(0))
            .optional()
            .map_err(Into::into)
    }

    /// Insert-or-replace the full-text record keyed by path.
    pub fn upsert_note(&self, partition: Partition, record: &NoteRecord) -> Result<()> {
        upsert_note_inner(&self.conn, partition, record)
    }

    /// Replace every chunk for `path` in one transaction: delete, then
    /// bulk-insert through a single prepared statement. Chunk ids are dense
    /// and 0-based per file.
    pub fn replace_chunks(
        &mut self,
        partition: Partition,
        path: &str,
        chunks: &[(String, Vec<f32>)],
        mtime: i64,
    ) -> Result<()> {
        let tx = self.conn.transaction()?;
        replace_chunks_inner(&tx, partition, path, chunks, mtime)?;
        tx.commit()?;
        Ok(())
    }

    /// Full-text upsert and chunk replacement for one file as a single
    /// transaction, so a crash never leaves the two tables disagreeing.
    pub fn index_document(
        &mut self,
        partition: Partition,
        record: &NoteRecord,
        chunks: &[(String, Vec<f32>)],
    ) -> Result<()> {
        let tx = self.conn.transaction()?;
        upsert_note_inner(&tx, partition, record)?;
        replace_chunks_inner(&tx, partition, &record.path, chunks, record.mtime)?;
        tx.commit()?;
        Ok(())
    }

    /// Chunk rows currently stored for `path`.
    pub fn chunk_count(&self, partition: Partition, path: &str) -> Result<usize> {
        let sql = format!(
            "SELECT COUNT(*) FROM {}_chunks WHERE path = ?1",
            partition.table_prefix()
        );
        let count: i64 = self.conn.query_row(&sql, params![path], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// The `limit` highest-BM25 records for `query`. Terms are quoted, so
    /// user text is never parsed as FTS5 syntax. Scores are negated bm25()
    /// values: higher is better.
    pub fn keyword_search(
        &self,
        partition: Partition,
        query: &str,
        limit: usize,
    ) -> Result<Vec<KeywordHit>> {
        if !self.fts_enabled {
            return Ok(Vec::new());
        }
        let match_expr = fts_match_expr(query);
        if match_expr.is_empty() {
            return Ok(Vec::new());
        }
        let p = partition.table_prefix();
        let sql = format!(
            "SELECT n.path, n.content, -bm25({p}_fts) AS score
             FROM {p}_fts
             JOIN {p}_notes n ON n.rowid = {p}_fts.rowid
             WHERE {p}_fts MATCH ?1
             ORDER BY bm25({p}_fts)
             LIMIT ?2",
            p = p
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![match_expr, limit as i64], |row| {
            Ok(KeywordHit {
                path: row.get(0)?,
                content: row.get(1)?,
                score: row.get::<_, f64>(2)? as f32,
            })
        })?;
        let mut hits = Vec::new();
        for row in rows {
            hits.push(row?);
        }
        Ok(hits)
    }

    /// The `limit` chunks most similar to `query`. Loads the partition's
    /// chunks and ranks in Rust: linear, but fine for a personal corpus.
    pub fn similar_chunks(
        &self,
        partition: Partition,
        query: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkHit>> {
        let sql = format!(
            "SELECT path, chunk_id, chunk_text, embedding FROM {}_chunks",
            partition.table_prefix()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            let blob: Vec<u8> = row.get(3)?;
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                blob,
            ))
        })?;

        let mut hits: Vec<ChunkHit> = Vec::new();
        for row in rows {
            let (path, chunk_id, text, blob) = row?;
            let embedding = blob_to_embedding(&blob);
            hits.push(ChunkHit {
                path,
                chunk_id,
                text,
                score: cosine_similarity(query, &embedding),
            });
        }
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(limit);
        Ok(hits)
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let count = |table: &str| -> Result<usize> {
            let n: i64 = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?;
            Ok(n as usize)
        };
        Ok(StoreStats {
            hot_notes: count("hot_notes")?,
            cold_notes: count("cold_notes")?,
            hot_chunks: count("hot_chunks")?,
            cold_chunks: count("cold_chunks")?,
        })
    }

    /// Checkpoint the write-ahead log and release the connection. Must run
    /// on termination signals as well as normal exit; writes sitting in
    /// the WAL are the main data-loss risk of an interrupted session.
    pub fn close(self) -> Result<()> {
        self.conn
            .query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
        self.conn
            .close()
            .map_err(|(_, e)| e)
            .context("failed to close index store")
    }
}

fn stored_version(conn: &Connection) -> Option<i64> {
    conn.query_row("SELECT version FROM schema_version", [], |row| row.get(0))
        .ok()
}

fn fts_tables_present(conn: &Connection) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'hot_fts'",
        [],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn base_tables(p: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {p}_notes (
            path TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            tags TEXT NOT NULL DEFAULT '',
            mtime INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS {p}_chunks (
            path TEXT NOT NULL,
            chunk_id INTEGER NOT NULL,
            chunk_text TEXT NOT NULL,
            embedding BLOB NOT NULL,
            mtime INTEGER NOT NULL,
            PRIMARY KEY (path, chunk_id)
        );\n",
        p = p
    )
}

/// External-content FTS5 mirror over the notes table, kept in sync by
/// triggers so upserts and deletes never drift from the index.
fn fts_tables(p: &str) -> String {
    format!(
        "CREATE VIRTUAL TABLE IF NOT EXISTS {p}_fts USING fts5(
            title, content, tags, content='{p}_notes', content_rowid='rowid'
        );
        CREATE TRIGGER IF NOT EXISTS {p}_notes_ai AFTER INSERT ON {p}_notes BEGIN
            INSERT INTO {p}_fts(rowid, title, content, tags)
            VALUES (new.rowid, new.title, new.content, new.tags);
        END;
        CREATE TRIGGER IF NOT EXISTS {p}_notes_ad AFTER DELETE ON {p}_notes BEGIN
            INSERT INTO {p}_fts({p}_fts, rowid, title, content, tags)
            VALUES ('delete', old.rowid, old.title, old.content, old.tags);
        END;
        CREATE TRIGGER IF NOT EXISTS {p}_notes_au AFTER UPDATE ON {p}_notes BEGIN
            INSERT INTO {p}_fts({p}_fts, rowid, title, content, tags)
            VALUES ('delete', old.rowid, old.title, old.content, old.tags);
            INSERT INTO {p}_fts(rowid, title, content, tags)
            VALUES (new.rowid, new.title, new.content, new.tags);
        END;\n",
        p = p
    )
}

fn upsert_note_inner(conn: &Connection, partition: Partition, record: &NoteRecord) -> Result<()> {
    let sql = format!(
        "INSERT INTO {p}_notes (path, title, content, tags, mtime)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(path) DO UPDATE SET
            title = excluded.title,
            content = excluded.content,
            tags = excluded.tags,
            mtime = excluded.mtime",
        p = partition.table_prefix()
    );
    conn.execute(
        &sql,
        params![
            record.path,
            record.title,
            record.content,
            record.tags.join(" "),
            record.mtime,
        ],
    )?;
    Ok(())
}

fn replace_chunks_inner(
    conn: &Connection,
    partition: Partition,
    path: &str,
    chunks: &[(String, Vec<f32>)],
    mtime: i64,
) -> Result<()> {
    let p = partition.table_prefix();
    conn.execute(
        &format!("DELETE FROM {}_chunks WHERE path = ?1", p),
        params![path],
    )?;
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {}_chunks (path, chunk_id, chunk_text, embedding, mtime)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        p
    ))?;
    for (chunk_id, (text, embedding)) in chunks.iter().enumerate() {
        stmt.execute(params![
            path,
            chunk_id as i64,
            text,
            embedding_to_blob(embedding),
            mtime,
        ])?;
    }
    Ok(())
}

/// Quote every query term so user text is matched literally, never parsed
/// as FTS5 operators. Terms with no alphanumeric content would tokenize to
/// empty phrases and are dropped.
fn fts_match_expr(query: &str) -> String {
    query
        .split_whitespace()
        .filter(|term| term.chars().any(|c| c.is_alphanumeric()))
        .map(|term| format!("\"{}\"", term.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" ")
}

fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(embedding.len() * 4);
    for &val in embedding {
        blob.extend_from_slice(&val.to_le_bytes());
    }
    blob
}

fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes(chunk.try_into().unwrap()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str, content: &str, mtime: i64) -> NoteRecord {
        NoteRecord {
            path: path.to_string(),
            title: path.to_string(),
            content: content.to_string(),
            tags: vec!["test".to_string()],
            mtime,
        }
    }

    #[test]
    fn test_blob_round_trip() {
        let embedding = vec![1.0, -2.5, 0.0, 3.75];
        assert_eq!(blob_to_embedding(&embedding_to_blob(&embedding)), embedding);
    }

    #[test]
    fn test_fresh_store_migrates() {
        let store = IndexStore::open_in_memory().unwrap();
        assert!(store.did_migrate());
        assert!(store.fts_enabled());
    }

    #[test]
    fn test_reopen_skips_ddl() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("index.db");

        let store = IndexStore::open(&db).unwrap();
        assert!(store.did_migrate());
        store.close().unwrap();

        let store = IndexStore::open(&db).unwrap();
        assert!(!store.did_migrate());
        assert!(store.fts_enabled());
        store.close().unwrap();
    }

    #[test]
    fn test_upsert_updates_in_place() {
        let store = IndexStore::open_in_memory().unwrap();
        store
            .upsert_note(Partition::Hot, &record("notes/a.md", "first", 1))
            .unwrap();
        store
            .upsert_note(Partition::Hot, &record("notes/a.md", "second", 2))
            .unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.hot_notes, 1);
        assert_eq!(
            store.recorded_mtime(Partition::Hot, "notes/a.md").unwrap(),
            Some(2)
        );
    }

    #[test]
    fn test_replace_chunks_leaves_exact_count() {
        let mut store = IndexStore::open_in_memory().unwrap();
        let chunks: Vec<(String, Vec<f32>)> = (0..4)
            .map(|i| (format!("chunk {}", i), vec![i as f32, 1.0]))
            .collect();
        store
            .replace_chunks(Partition::Hot, "notes/a.md", &chunks, 1)
            .unwrap();
        assert_eq!(store.chunk_count(Partition::Hot, "notes/a.md").unwrap(), 4);

        // re-index with fewer chunks: no stale rows survive
        store
            .replace_chunks(Partition::Hot, "notes/a.md", &chunks[..2], 2)
            .unwrap();
        assert_eq!(store.chunk_count(Partition::Hot, "notes/a.md").unwrap(), 2);
    }

    #[test]
    fn test_partition_isolation() {
        let mut store = IndexStore::open_in_memory().unwrap();
        store
            .upsert_note(Partition::Cold, &record("archive/old.md", "archived text", 1))
            .unwrap();
        store
            .replace_chunks(
                Partition::Cold,
                "archive/old.md",
                &[("archived text".to_string(), vec![1.0, 0.0])],
                1,
            )
            .unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.hot_notes, 0);
        assert_eq!(stats.hot_chunks, 0);
        assert_eq!(stats.cold_notes, 1);
        assert_eq!(stats.cold_chunks, 1);
        assert!(store
            .recorded_mtime(Partition::Hot, "archive/old.md")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_keyword_search_finds_unique_token() {
        let store = IndexStore::open_in_memory().unwrap();
        store
            .upsert_note(
                Partition::Hot,
                &record("notes/a.md", "the xyzzy incantation works", 1),
            )
            .unwrap();
        store
            .upsert_note(Partition::Hot, &record("notes/b.md", "unrelated text", 1))
            .unwrap();

        let hits = store.keyword_search(Partition::Hot, "xyzzy", 5).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path, "notes/a.md");
        assert!(hits[0].score > 0.0);
    }

    #[test]
    fn test_keyword_search_survives_update_and_delete_sync() {
        let store = IndexStore::open_in_memory().unwrap();
        store
            .upsert_note(Partition::Hot, &record("notes/a.md", "old token alpha", 1))
            .unwrap();
        store
            .upsert_note(Partition::Hot, &record("notes/a.md", "new token beta", 2))
            .unwrap();

        assert!(store
            .keyword_search(Partition::Hot, "alpha", 5)
            .unwrap()
            .is_empty());
        assert_eq!(
            store.keyword_search(Partition::Hot, "beta", 5).unwrap().len(),
            1
        );
    }

    #[test]
    fn test_keyword_search_quotes_operators() {
        let store = IndexStore::open_in_memory().unwrap();
        store
            .upsert_note(Partition::Hot, &record("notes/a.md", "plain text", 1))
            .unwrap();
        // would be a syntax error if parsed as FTS5 operators
        assert!(store
            .keyword_search(Partition::Hot, "NOT AND (", 5)
            .is_ok());
    }

    #[test]
    fn test_similar_chunks_ranked_by_cosine() {
        let mut store = IndexStore::open_in_memory().unwrap();
        store
            .replace_chunks(
                Partition::Hot,
                "notes/a.md",
                &[
                    ("aligned".to_string(), vec![1.0, 0.0]),
                    ("orthogonal".to_string(), vec![0.0, 1.0]),
                ],
                1,
            )
            .unwrap();

        let hits = store
            .similar_chunks(Partition::Hot, &[1.0, 0.0], 2)
            .unwrap();
        assert_eq!(hits[0].text, "aligned");
        assert!(hits[0].score > hits[1].score);
    }
}
