//! Command handlers behind the CLI surface.

use anyhow::{Context, Result};
use log::info;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::cli;
use crate::config::AnalysisConfig;
use crate::graph::GraphBuilder;
use crate::io::input::{load_threat_records, resolve_threats, DfdModel};
use crate::io::output::{create_writer, OutputFormat};
use crate::orchestrator::{AnalysisOrchestrator, SystemModel};
use crate::pathfinder::CancelFlag;
use crate::scoring::BetweennessCentrality;

pub struct AnalyzeOptions {
    pub model: PathBuf,
    pub threats: PathBuf,
    pub config: Option<PathBuf>,
    pub format: cli::OutputFormat,
    pub output: Option<PathBuf>,
    pub centrality: bool,
    pub deadline_secs: Option<u64>,
}

pub fn analyze(options: AnalyzeOptions) -> Result<()> {
    let config = match &options.config {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };

    let dfd = DfdModel::load(&options.model)?;
    let records = load_threat_records(&options.threats)?;
    let threats = resolve_threats(&records);

    let model = SystemModel {
        entities: dfd.external_entities.clone(),
        processes: dfd.processes.clone(),
        assets: dfd.assets.clone(),
        flows: dfd.resolve_flows(config.bidirectional_default),
    };

    let cancel = match options.deadline_secs {
        Some(secs) => CancelFlag::with_deadline(Instant::now() + Duration::from_secs(secs)),
        None => CancelFlag::new(),
    };

    let mut orchestrator = AnalysisOrchestrator::new(config);
    if options.centrality {
        orchestrator = orchestrator.with_centrality(Box::new(BetweennessCentrality));
    }

    let result = orchestrator.analyze(&model, &threats, &cancel);

    let format = OutputFormat::from(options.format);
    match &options.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create output file {}", path.display()))?;
            create_writer(file, format).write_result(&result)?;
        }
        None => {
            create_writer(io::stdout(), format).write_result(&result)?;
        }
    }
    Ok(())
}

/// Parse both inputs and report what the engine would see, without
/// running the analysis.
pub fn validate(model_path: &Path, threats_path: &Path) -> Result<()> {
    let config = AnalysisConfig::default();
    let dfd = DfdModel::load(model_path)?;
    let records = load_threat_records(threats_path)?;
    let threats = resolve_threats(&records);

    let flows = dfd.resolve_flows(config.bidirectional_default);
    let graph = GraphBuilder::new(config.bidirectional_default, config.primary_entity.clone())
        .build(&dfd.external_entities, &dfd.processes, &dfd.assets, &flows);

    let mut out = io::stdout().lock();
    writeln!(out, "components: {}", graph.component_count())?;
    writeln!(
        out,
        "  entities={} processes={} assets={}",
        dfd.external_entities.len(),
        dfd.processes.len(),
        dfd.assets.len()
    )?;
    writeln!(
        out,
        "flows: {} kept, {} dropped (dangling endpoints)",
        graph.flow_count(),
        graph.dropped_flow_count()
    )?;
    writeln!(
        out,
        "threats: {} usable of {} records",
        threats.len(),
        records.len()
    )?;
    info!("inputs validated");
    Ok(())
}
