//! Links command - outgoing and incoming links for one note

use anyhow::Result;
use colored::Colorize;

use crate::core::paths::CorpusPaths;
use crate::graph::NoteGraph;

pub fn run(paths: &CorpusPaths, note_path: &str, json: bool) -> Result<()> {
    let mut graph = NoteGraph::new();
    graph.scan(paths, true);

    if !graph.contains(note_path) {
        if json {
            println!(
                "{}",
                serde_json::json!({ "error": "note not found", "path": note_path })
            );
        } else {
            eprintln!("{} Note not found: {}", "✗".red().bold(), note_path);
        }
        std::process::exit(1);
    }

    let outlinks = graph.outlinks(note_path);
    let backlinks = graph.backlinks(note_path);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "path": note_path,
                "outlinks": outlinks,
                "backlinks": backlinks,
            }))?
        );
    } else {
        println!("{}", note_path.bold());
        println!();
        println!("{} ({})", "Outlinks".cyan(), outlinks.len());
        for link in &outlinks {
            println!("  {} {}", "→".dimmed(), link);
        }
        println!();
        println!("{} ({})", "Backlinks".cyan(), backlinks.len());
        for link in &backlinks {
            println!("  {} {}", "←".dimmed(), link);
        }
    }

    Ok(())
}
