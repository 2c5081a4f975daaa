//! Index command - build or update the search index

use std::sync::atomic::Ordering;

use anyhow::Result;
use colored::Colorize;

use crate::core::paths::CorpusPaths;
use crate::search::engine::SearchEngine;
use crate::search::store::IndexStore;

pub fn run(paths: CorpusPaths, rebuild: bool, json: bool) -> Result<()> {
    let db_path = paths.db_path();
    let store = IndexStore::open(&db_path)?;
    let mut engine = SearchEngine::new(paths, store);

    // A termination signal stops between files; the store is still closed
    // and checkpointed below.
    let stop = engine.stop_handle();
    let _ = ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst));

    if !json {
        println!("{} Updating search index...", "→".dimmed());
    }

    let stats = if rebuild {
        engine.rebuild()?
    } else {
        engine.index_all(false)?
    };
    let interrupted = engine.stop_handle().load(Ordering::SeqCst);
    engine.close()?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "indexed": stats.indexed,
                "skipped": stats.skipped,
                "failed": stats.failed,
                "duration_ms": stats.duration_ms,
                "interrupted": interrupted,
            })
        );
    } else {
        println!();
        println!(
            "{} Indexed {} notes in {:.2}s",
            "✓".green().bold(),
            stats.indexed.to_string().cyan(),
            stats.duration_ms as f64 / 1000.0
        );
        if stats.skipped > 0 {
            println!("  {} {} notes unchanged", "→".dimmed(), stats.skipped);
        }
        if stats.failed > 0 {
            println!("  {} {} notes failed", "✗".red(), stats.failed);
        }
        if interrupted {
            println!("  {} interrupted; remaining files skipped", "!".yellow());
        }
        println!("  {} Index saved to: {}", "→".dimmed(), db_path.display());
    }

    Ok(())
}
