//! Search command - hybrid keyword+semantic query

use anyhow::Result;
use colored::Colorize;

use crate::core::paths::CorpusPaths;
use crate::search::engine::SearchEngine;
use crate::search::store::IndexStore;

pub fn run(paths: CorpusPaths, query: &str, limit: usize, json: bool) -> Result<()> {
    let db_path = paths.db_path();
    if !db_path.exists() {
        if json {
            println!("{}", serde_json::json!({ "error": "index not found" }));
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
    let engine = SearchEngine::new(paths, store);
    let results = engine.search(query, limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        if results.is_empty() {
            println!("{} No results found for: {}", "→".dimmed(), query.cyan());
            engine.close()?;
            return Ok(());
        }

        println!(
            "{} {} results for: {}",
            "→".dimmed(),
            results.len(),
            query.cyan()
        );
        println!();

        for (i, result) in results.iter().enumerate() {
            println!(
                "{}. [{}] [{}] {}",
                (i + 1).to_string().bold(),
                format!("{:.2}", result.score).dimmed(),
                result.source.to_string().yellow(),
                result.path.cyan()
            );

            // char-aware truncation for display
            let snippet: String = result.content.chars().take(120).collect();
            let snippet = snippet.replace('\n', " ");
            if result.content.chars().count() > 120 {
                println!("   {}...", snippet.dimmed());
            } else {
                println!("   {}", snippet.dimmed());
            }
            println!();
        }
    }

    engine.close()?;
    Ok(())
}
