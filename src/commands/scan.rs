//! Scan command - rebuild the link graph and report statistics

use anyhow::Result;
use colored::Colorize;

use crate::core::paths::CorpusPaths;
use crate::graph::NoteGraph;

pub fn run(paths: &CorpusPaths, include_cold: bool, json: bool) -> Result<()> {
    let mut graph = NoteGraph::new();
    let stats = graph.scan(paths, include_cold);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("{} Scanned {}", "✓".green().bold(), paths.root.display());
        println!();
        println!("  {} {} files", "→".dimmed(), stats.files.to_string().cyan());
        println!("  {} {} notes", "→".dimmed(), stats.nodes.to_string().cyan());
        println!("  {} {} links", "→".dimmed(), stats.links.to_string().cyan());
        if stats.errors > 0 {
            println!("  {} {} files with errors", "!".yellow(), stats.errors);
        }
    }

    Ok(())
}
