//! Ivy CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "ivy")]
#[command(about = "Live module graph maintenance for hot-reloading build pipelines", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Project root path (defaults to current directory)
    #[arg(short, long, default_value = ".")]
    root: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay compile records into the graph and print update events
    Apply {
        /// JSONL file of compile records, one per line
        #[arg(short, long)]
        events: PathBuf,

        /// Persist a graph snapshot under the project root afterwards
        #[arg(short, long)]
        snapshot: bool,
    },
    /// Replay compile records, then watch registered dependencies and
    /// report which modules a change would invalidate
    Watch {
        /// JSONL file of compile records, one per line
        #[arg(short, long)]
        events: PathBuf,
    },
    /// Clear the graph snapshot
    Clear,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "ivy={0},ivy_graph={0},ivy_reconcile={0},ivy_watcher={0}",
            log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Ivy v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Project root: {}", cli.root.display());

    match cli.command {
        Commands::Apply { events, snapshot } => commands::apply(cli.root, events, snapshot).await,
        Commands::Watch { events } => commands::watch(cli.root, events).await,
        Commands::Clear => commands::clear(cli.root),
        Commands::Version => {
            println!("Ivy v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
