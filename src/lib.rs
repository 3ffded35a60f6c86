// Export modules for library usage
pub mod aggregation;
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod coverage;
pub mod defense;
pub mod enrichment;
pub mod errors;
pub mod graph;
pub mod io;
pub mod orchestrator;
pub mod pathfinder;
pub mod scoring;
pub mod threats;

// Re-export commonly used types
pub use crate::core::{
    AnalysisResult, AttackPath, AttackStep, Component, ComponentKind, Criticality, DataFlow,
    DefensePriority, Feasibility, Impact, Likelihood, StrideCategory, Threat, ThreatCoverage,
    TrustLevel,
};

pub use crate::config::AnalysisConfig;
pub use crate::coverage::calculate_coverage;
pub use crate::defense::generate_defense_priorities;
pub use crate::enrichment::{apply_enrichment, EnrichmentResponse, InsightStore, PathEnricher};
pub use crate::errors::{EngineError, EngineResult};
pub use crate::graph::{GraphBuilder, SystemGraph};
pub use crate::io::output::{create_writer, OutputFormat, OutputWriter};
pub use crate::orchestrator::{AnalysisOrchestrator, AnalysisState, SystemModel};
pub use crate::pathfinder::{find_paths, CancelFlag};
pub use crate::scoring::{
    score_critical_assets, score_entry_points, BetweennessCentrality, CentralityStrategy,
    NoopCentrality,
};
pub use crate::threats::{attach_threats, build_threat_index, ThreatIndex};
