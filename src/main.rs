use anyhow::Result;
use clap::Parser;

use attackmap::cli::{Cli, Commands};
use attackmap::commands::{self, AnalyzeOptions};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze {
            model,
            threats,
            config,
            format,
            output,
            centrality,
            deadline_secs,
        } => commands::analyze(AnalyzeOptions {
            model,
            threats,
            config,
            format,
            output,
            centrality,
            deadline_secs,
        }),
        Commands::Validate { model, threats } => commands::validate(&model, &threats),
    }
}
