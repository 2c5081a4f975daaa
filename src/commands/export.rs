//! Export command - serialize the link graph

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use crate::core::paths::CorpusPaths;
use crate::graph::{export, ExportError, ExportFormat, NoteGraph};

pub fn run(paths: &CorpusPaths, output: &Path, format: &str) -> Result<()> {
    let format: ExportFormat = match format.parse() {
        Ok(f) => f,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    let mut graph = NoteGraph::new();
    let stats = graph.scan(paths, true);

    match export(&graph, output, format) {
        Ok(()) => {
            println!(
                "{} Exported {} notes, {} links to {}",
                "✓".green().bold(),
                stats.nodes.to_string().cyan(),
                stats.links.to_string().cyan(),
                output.display()
            );
            Ok(())
        }
        Err(ExportError::RendererUnavailable) => {
            // the one failure a caller is expected to react to
            eprintln!("{} {}", "✗".red().bold(), ExportError::RendererUnavailable);
            eprintln!(
                "  {} rebuild with: cargo install notemesh --features graph-html",
                "→".dimmed()
            );
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}
