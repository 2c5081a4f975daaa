mod commands;
mod core;
mod graph;
mod search;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "notemesh")]
#[command(about = "Note corpus indexer: link graph and hybrid search", long_about = None)]
#[command(version)]
struct Cli {
    /// Corpus root (defaults to the current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the corpus and report link-graph statistics
    Scan {
        #[arg(long, help = "Exclude the archive partition")]
        no_cold: bool,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Show outgoing and incoming links for a note
    Links {
        /// Corpus-relative note path, e.g. notes/topic.md
        path: String,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// List the most connected notes
    Hubs {
        #[arg(short = 'n', long, default_value_t = 10, help = "Number of notes")]
        count: usize,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// List notes with no links in either direction
    Orphans {
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Export the link graph to a file
    Export {
        /// Output file
        output: PathBuf,
        #[arg(long, default_value = "dot", help = "Format: dot, json, or html")]
        format: String,
    },
    /// Update the search index (incremental by default)
    Index {
        #[arg(long, help = "Re-index every file regardless of mtime")]
        rebuild: bool,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Hybrid keyword+semantic search
    Search {
        query: String,
        #[arg(short, long, default_value_t = 5, help = "Limit results")]
        limit: usize,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Show index status
    Status {
        #[arg(long, help = "JSON output")]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    let paths = crate::core::paths::CorpusPaths::from_root(root);

    match cli.command {
        Commands::Scan { no_cold, json } => commands::scan::run(&paths, !no_cold, json),
        Commands::Links { path, json } => commands::links::run(&paths, &path, json),
        Commands::Hubs { count, json } => commands::hubs::run(&paths, count, json),
        Commands::Orphans { json } => commands::orphans::run(&paths, json),
        Commands::Export { output, format } => commands::export::run(&paths, &output, &format),
        Commands::Index { rebuild, json } => commands::index::run(paths, rebuild, json),
        Commands::Search { query, limit, json } => {
            commands::search::run(paths, &query, limit, json)
        }
        Commands::Status { json } => commands::status::run(&paths, json),
    }
}
