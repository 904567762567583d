//! datasweep CLI - unused-asset analysis for project snapshots.
//!
//! Usage:
//!   datasweep scan <snapshot.json>                 # Full scan, report unused
//!   datasweep scan <snapshot.json> --probe         # Existence check only
//!   datasweep scan <snapshot.json> -c material     # Restrict categories
//!   datasweep classify <snapshot.json> <id>        # Verdict for one asset
//!   datasweep stats <snapshot.json>                # Graph statistics

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use datasweep::{Advance, Analyzer, AssetId, Category, MemSnapshot, ScanConfig, ScanMode};

#[derive(Parser)]
#[command(name = "datasweep")]
#[command(about = "datasweep - unused-asset analysis for project snapshots", long_about = None)]
struct Cli {
    /// Configuration file (TOML); defaults apply when absent
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a snapshot and report unused assets
    Scan {
        /// Snapshot file (JSON)
        snapshot: PathBuf,

        /// Restrict the report to these categories (snake_case names);
        /// repeatable. Default: all categories
        #[arg(short, long = "category")]
        categories: Vec<String>,

        /// Stop at the first unused asset per category
        #[arg(long)]
        probe: bool,
    },

    /// Classify a single asset as used or unused
    Classify {
        /// Snapshot file (JSON)
        snapshot: PathBuf,

        /// Numeric asset id
        id: u64,
    },

    /// Show dependency graph statistics for a snapshot
    Stats {
        /// Snapshot file (JSON)
        snapshot: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ScanConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ScanConfig::default(),
    };
    let mut analyzer = Analyzer::new(config);

    match cli.command {
        Commands::Scan {
            snapshot,
            categories,
            probe,
        } => {
            let snap = load_snapshot(&snapshot)?;
            let categories = categories
                .iter()
                .map(|name| parse_category(name))
                .collect::<Result<Vec<_>>>()?;
            let mode = if probe { ScanMode::Probe } else { ScanMode::Full };

            let handle = analyzer.start_scan(categories, mode);
            let result = loop {
                match analyzer.advance(&snap, handle)? {
                    Advance::Done(result) => break result,
                    Advance::Progress(event) if event.total > 0 => {
                        eprint!(
                            "\rscanning {}/{} {:<40}",
                            event.processed, event.total, event.current_label
                        );
                    }
                    Advance::Progress(_) => {}
                    Advance::Cancelled => anyhow::bail!("scan cancelled"),
                }
            };
            eprintln!();

            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Classify { snapshot, id } => {
            let snap = load_snapshot(&snapshot)?;
            let verdict = analyzer.classify(&snap, AssetId(id))?;
            println!("{} {}", AssetId(id), verdict);
        }

        Commands::Stats { snapshot } => {
            let snap = load_snapshot(&snapshot)?;
            let handle = analyzer.start_scan(vec![], ScanMode::Full);
            let result = loop {
                match analyzer.advance(&snap, handle)? {
                    Advance::Done(result) => break result,
                    Advance::Progress(_) => {}
                    Advance::Cancelled => anyhow::bail!("scan cancelled"),
                }
            };
            println!("Nodes:  {}", result.stats.total_nodes);
            println!("Edges:  {}", result.stats.total_edges);
            println!("Unused: {}", result.unused.len());
        }
    }

    Ok(())
}

fn load_snapshot(path: &PathBuf) -> Result<MemSnapshot> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing snapshot {}", path.display()))
}

fn parse_category(name: &str) -> Result<Category> {
    serde_json::from_value(serde_json::Value::String(name.to_string()))
        .with_context(|| format!("unknown category '{name}'"))
}
