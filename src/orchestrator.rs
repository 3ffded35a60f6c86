//! Analysis orchestration.
//!
//! Wires the stages in dependency order and tracks the run through an
//! explicit state machine:
//!
//! Ready -> GraphBuilt -> CandidatesSelected -> PathsEnumerated ->
//! PathsScored -> Done, with an Empty terminal state reachable from
//! CandidatesSelected (no entry points or no targets) and from
//! PathsEnumerated (zero surviving paths).
//!
//! Empty is not an error: it yields a valid result with empty
//! collections and `metadata.error` describing why.

use chrono::Utc;
use log::{info, warn};
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;

use crate::aggregation;
use crate::config::AnalysisConfig;
use crate::core::{AnalysisMetadata, AnalysisResult, AttackPath, Impact, Threat};
use crate::coverage::calculate_coverage;
use crate::defense::generate_defense_priorities;
use crate::enrichment::{enrich_paths, InsightStore, PathEnricher};
use crate::graph::{GraphBuilder, SystemGraph};
use crate::pathfinder::{find_paths, CancelFlag};
use crate::scoring::{score_entry_points, CentralityStrategy, CriticalAssetScorer};
use crate::threats::{attach_threats, build_threat_index};

const MAX_CRITICAL_SCENARIOS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisState {
    Ready,
    GraphBuilt,
    CandidatesSelected,
    PathsEnumerated,
    PathsScored,
    Done,
    Empty,
}

/// Typed system description, resolved at the ingestion boundary.
#[derive(Debug, Clone, Default)]
pub struct SystemModel {
    pub entities: Vec<String>,
    pub processes: Vec<String>,
    pub assets: Vec<String>,
    pub flows: Vec<crate::core::DataFlow>,
}

pub struct AnalysisOrchestrator {
    config: AnalysisConfig,
    centrality: Option<Box<dyn CentralityStrategy>>,
    enricher: Option<Arc<dyn PathEnricher>>,
    insight_store: Option<Box<dyn InsightStore>>,
    state: AnalysisState,
}

impl AnalysisOrchestrator {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            centrality: None,
            enricher: None,
            insight_store: None,
            state: AnalysisState::Ready,
        }
    }

    pub fn with_centrality(mut self, strategy: Box<dyn CentralityStrategy>) -> Self {
        self.centrality = Some(strategy);
        self
    }

    pub fn with_enricher(mut self, enricher: Arc<dyn PathEnricher>) -> Self {
        self.enricher = Some(enricher);
        self
    }

    pub fn with_insight_store(mut self, store: Box<dyn InsightStore>) -> Self {
        self.insight_store = Some(store);
        self
    }

    pub fn state(&self) -> AnalysisState {
        self.state
    }

    /// Run the full pipeline. Never fails: degraded conditions produce
    /// the Empty-state result with `metadata.error` set.
    pub fn analyze(
        &mut self,
        model: &SystemModel,
        threats: &[Threat],
        cancel: &CancelFlag,
    ) -> AnalysisResult {
        let started = Instant::now();
        self.state = AnalysisState::Ready;

        let graph = GraphBuilder::new(
            self.config.bidirectional_default,
            self.config.primary_entity.clone(),
        )
        .build(&model.entities, &model.processes, &model.assets, &model.flows);
        self.state = AnalysisState::GraphBuilt;

        let entries = score_entry_points(&graph, self.config.max_entry_points);
        let targets = match &self.centrality {
            Some(strategy) => CriticalAssetScorer::with_centrality(strategy.as_ref())
                .score(&graph, self.config.max_target_assets),
            None => CriticalAssetScorer::default().score(&graph, self.config.max_target_assets),
        };
        self.state = AnalysisState::CandidatesSelected;

        if entries.is_empty() {
            return self.empty_result(&graph, threats, started, "no viable entry points identified");
        }
        if targets.is_empty() {
            return self.empty_result(&graph, threats, started, "no critical assets identified");
        }

        let raw_paths = find_paths(&graph, &entries, &targets, &self.config, cancel);
        self.state = AnalysisState::PathsEnumerated;

        if raw_paths.is_empty() {
            return self.empty_result(
                &graph,
                threats,
                started,
                "no attack paths discovered between entry points and critical assets",
            );
        }

        let index = build_threat_index(threats, &graph);

        // Per-path detail building is pure over the shared graph and
        // index; order is restored by the explicit sort below.
        let mut paths: Vec<AttackPath> = raw_paths
            .par_iter()
            .filter_map(|raw| {
                let steps = attach_threats(raw, &index)?;
                Some(aggregation::aggregate(raw, steps, &index))
            })
            .collect();

        if paths.is_empty() {
            return self.empty_result(
                &graph,
                threats,
                started,
                "no attack path retained at least two threat-backed steps",
            );
        }

        if let Some(enricher) = &self.enricher {
            if cancel.is_cancelled() {
                info!("cancelled before enrichment; emitting unenriched result");
            } else {
                enrich_paths(&mut paths, Arc::clone(enricher), &self.config.enrichment);
            }
        }

        // Ranking is always an explicit sort pass, never insertion
        // order: risk weight descending, path_id as the deterministic
        // tie-break.
        paths.sort_by(|a, b| {
            b.risk_weight()
                .cmp(&a.risk_weight())
                .then_with(|| a.path_id.cmp(&b.path_id))
        });
        self.state = AnalysisState::PathsScored;

        let critical_scenarios: Vec<AttackPath> = paths
            .iter()
            .filter(|p| p.combined_impact == Impact::Critical)
            .take(MAX_CRITICAL_SCENARIOS)
            .cloned()
            .collect();

        let defense_priorities = generate_defense_priorities(&paths);
        let threat_coverage = calculate_coverage(&paths, threats.len());

        let mut metadata = self.base_metadata(&graph, started);
        metadata.raw_path_count = raw_paths.len();

        if let Some(store) = &self.insight_store {
            match store.insights(&paths) {
                Ok(blob) => metadata.vector_store_insights = Some(blob),
                Err(e) => warn!("insight store unavailable, section omitted: {e}"),
            }
        }

        self.state = AnalysisState::Done;
        info!(
            "analysis complete: {} paths, {} critical scenarios, {:.2}% coverage",
            paths.len(),
            critical_scenarios.len(),
            threat_coverage.coverage_percentage
        );

        AnalysisResult {
            attack_paths: paths,
            critical_scenarios,
            defense_priorities,
            threat_coverage: Some(threat_coverage),
            metadata,
        }
    }

    fn base_metadata(&self, graph: &SystemGraph, started: Instant) -> AnalysisMetadata {
        AnalysisMetadata {
            generated_at: Some(Utc::now()),
            component_count: graph.component_count(),
            flow_count: graph.flow_count(),
            dropped_flows: graph.dropped_flow_count(),
            analysis_duration_ms: started.elapsed().as_millis() as u64,
            ..Default::default()
        }
    }

    fn empty_result(
        &mut self,
        graph: &SystemGraph,
        threats: &[Threat],
        started: Instant,
        reason: &str,
    ) -> AnalysisResult {
        info!("empty analysis: {reason}");
        self.state = AnalysisState::Empty;
        let mut metadata = self.base_metadata(graph, started);
        metadata.error = Some(reason.to_string());
        AnalysisResult {
            attack_paths: Vec::new(),
            critical_scenarios: Vec::new(),
            defense_priorities: Vec::new(),
            threat_coverage: Some(calculate_coverage(&[], threats.len())),
            metadata,
        }
    }
}
