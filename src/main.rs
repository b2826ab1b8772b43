//! Epicenter CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "epicenter")]
#[command(about = "Business-rule and change-impact analysis for TypeScript codebases", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a project and print the full report as JSON
    Analyze {
        /// Project root path
        #[arg(default_value = ".")]
        root: PathBuf,
    },
    /// Simulate the impact of changing one rule
    Impact {
        /// Project root path
        root: PathBuf,
        /// Rule identifier, e.g. STATE_TRANSITION:src/order.ts:120
        rule_id: String,
    },
    /// Show version
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Diagnostics go to stderr; stdout carries only the JSON report.
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(log_level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Analyze { root } => commands::analyze(root),
        Commands::Impact { root, rule_id } => commands::impact(root, rule_id),
        Commands::Version => {
            println!("epicenter v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
