//! Orphans command - notes with no links in either direction

use anyhow::Result;
use colored::Colorize;

use crate::core::paths::CorpusPaths;
use crate::graph::NoteGraph;

pub fn run(paths: &CorpusPaths, json: bool) -> Result<()> {
    let mut graph = NoteGraph::new();
    graph.scan(paths, true);

    let orphans = graph.orphan_notes();

    if json {
        println!("{}", serde_json::to_string_pretty(&orphans)?);
    } else if orphans.is_empty() {
        println!("{} No orphan notes", "✓".green().bold());
    } else {
        println!("{} ({})", "Orphan notes".bold(), orphans.len());
        println!();
        for path in &orphans {
            println!("  {} {}", "•".dimmed(), path);
        }
    }

    Ok(())
}
