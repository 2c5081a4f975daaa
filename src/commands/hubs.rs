//! Hubs command - the most connected notes

use anyhow::Result;
use colored::Colorize;

use crate::core::paths::CorpusPaths;
use crate::graph::NoteGraph;

pub fn run(paths: &CorpusPaths, count: usize, json: bool) -> Result<()> {
    let mut graph = NoteGraph::new();
    graph.scan(paths, true);

    let hubs = graph.hub_notes(count);

    if json {
        let entries: Vec<_> = hubs
            .iter()
            .map(|(path, degree)| serde_json::json!({ "path": path, "degree": degree }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        if hubs.is_empty() {
            println!("{} No notes found", "!".yellow());
            return Ok(());
        }
        println!("{}", "Hub notes".bold());
        println!();
        for (i, (path, degree)) in hubs.iter().enumerate() {
            println!(
                "{}. [{}] {}",
                (i + 1).to_string().bold(),
                degree.to_string().cyan(),
                path
            );
        }
    }

    Ok(())
}
