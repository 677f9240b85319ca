use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands;

#[derive(Parser)]
#[command(name = "chartgraph")]
#[command(about = "Derived chart series resolution engine", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve one chart id to a series
    Resolve {
        /// Chart id from the catalog
        chart_id: String,
        /// Visible window in days (clamped to the supported buckets)
        #[arg(short, long, default_value_t = 365)]
        days: i64,
        /// Quote currency for market leaves
        #[arg(short, long, default_value = "usd")]
        currency: String,
        /// Print raw points as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Validate the full catalog across all timeframes
    Sweep {
        /// Number of passes over the catalog
        #[arg(short, long, default_value_t = 1)]
        passes: u32,
        /// Write the machine-readable report here
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// List catalog definitions
    Catalog {
        /// Check for dangling references and static cycles
        #[arg(long)]
        lint: bool,
    },
}

pub async fn run() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve { chart_id, days, currency, json } => {
            commands::resolve::run(&chart_id, days, &currency, json).await;
        }
        Commands::Sweep { passes, out } => {
            commands::sweep::run(passes, out).await;
        }
        Commands::Catalog { lint } => {
            commands::catalog::run(lint);
        }
    }
}
