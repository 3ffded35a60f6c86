use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::io::output;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Full analysis result as pretty-printed JSON
    Json,
    /// Human-readable summary
    Terminal,
}

impl From<OutputFormat> for output::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => output::OutputFormat::Json,
            OutputFormat::Terminal => output::OutputFormat::Terminal,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "attackmap")]
#[command(about = "Attack-path analysis for STRIDE threat models", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a component graph plus threat inventory for attack paths
    Analyze {
        /// DFD model JSON (entities, processes, assets, data flows)
        #[arg(long = "model", visible_alias = "dfd")]
        model: PathBuf,

        /// Threat inventory JSON
        #[arg(long = "threats")]
        threats: PathBuf,

        /// Optional engine configuration (TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Add the betweenness-centrality bonus to asset scoring
        #[arg(long = "centrality")]
        centrality: bool,

        /// Soft wall-clock limit in seconds; a timed-out run still
        /// returns the consistent result accumulated so far
        #[arg(long = "deadline-secs")]
        deadline_secs: Option<u64>,
    },

    /// Parse and sanity-check the two inputs without running analysis
    Validate {
        /// DFD model JSON
        #[arg(long = "model", visible_alias = "dfd")]
        model: PathBuf,

        /// Threat inventory JSON
        #[arg(long = "threats")]
        threats: PathBuf,
    },
}
