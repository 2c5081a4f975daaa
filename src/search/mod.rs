//! Hybrid chunked search: chunker, embeddings, index store, engine.

pub mod chunker;
pub mod embedding;
pub mod engine;
pub mod store;

pub use chunker::{split_chunks, DEFAULT_CHUNK_WORDS};
pub use embedding::{cosine_similarity, EmbeddingModel, EMBEDDING_DIM};
pub use engine::{IndexOutcome, IndexStats, MatchSource, SearchEngine, SearchResult};
pub use store::{IndexStore, NoteRecord, StoreStats, SCHEMA_VERSION};
