//! Status command - index statistics

use anyhow::Result;
use colored::Colorize;

use crate::core::paths::CorpusPaths;
use crate::search::store::IndexStore;

pub fn run(paths: &CorpusPaths, json: bool) -> Result<()> {
    let db_path = paths.db_path();
    if !db_path.exists() {
        if json {
            println!(
                "{}",
                serde_json::json!({ "exists": false, "error": "index not found" })
            );
        } else {
            println!(
                "{} Index not found. Run {} first.",
                "!".yellow().bold(),
                "notemesh index".cyan()
            );
        }
        return Ok(());
    }

    let store = IndexStore::open(&db_path)?;
    let stats = store.stats()?;
    let fts = store.fts_enabled();
    let file_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);
    store.close()?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "exists": true,
                "hot_notes": stats.hot_notes,
                "cold_notes": stats.cold_notes,
                "hot_chunks": stats.hot_chunks,
                "cold_chunks": stats.cold_chunks,
                "fts_enabled": fts,
                "file_size_bytes": file_size,
            })
        );
    } else {
        println!("{}", "Index Status".bold());
        println!();
        println!(
            "  {} {} active notes, {} chunks",
            "→".dimmed(),
            stats.hot_notes.to_string().cyan(),
            stats.hot_chunks.to_string().cyan()
        );
        println!(
            "  {} {} archived notes, {} chunks",
            "→".dimmed(),
            stats.cold_notes.to_string().cyan(),
            stats.cold_chunks.to_string().cyan()
        );
        println!(
            "  {} Full-text search: {}",
            "→".dimmed(),
            if fts { "available".green() } else { "unavailable".yellow() }
        );
        println!("  {} Size: {:.2} KB", "→".dimmed(), file_size as f64 / 1024.0);
    }

    Ok(())
}
