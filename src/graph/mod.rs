//! Directed link graph over the note corpus.

pub mod builder;
pub mod export;
pub mod links;

pub use builder::{NoteGraph, ScanStats};
pub use export::{export, ExportError, ExportFormat};
pub use links::{extract_links, RawLink};
