//! Collaborator boundaries: narrative enrichment and the optional
//! cross-project insight store.
//!
//! The engine never talks to an LLM or a vector store itself; callers
//! inject implementations of the traits below. Enrichment runs through
//! a bounded worker pool with a per-call timeout and a small retry
//! budget. One path failing never blocks another, and a failed path
//! stays in the result unenriched.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::config::EnrichmentConfig;
use crate::core::{AttackPath, Feasibility, Likelihood, PathComplexity};
use crate::errors::EngineError;

/// What the enrichment collaborator sees: a compact summary, never the
/// mutable path itself.
#[derive(Debug, Clone, Serialize)]
pub struct PathSummary {
    pub path_id: String,
    pub entry_point: String,
    pub target_asset: String,
    pub components: Vec<String>,
    pub threat_descriptions: Vec<String>,
}

impl PathSummary {
    pub fn of(path: &AttackPath) -> Self {
        Self {
            path_id: path.path_id.clone(),
            entry_point: path.entry_point.clone(),
            target_asset: path.target_asset.clone(),
            components: path.steps.iter().map(|s| s.component.clone()).collect(),
            threat_descriptions: path.steps.iter().map(|s| s.description.clone()).collect(),
        }
    }
}

/// Raw collaborator response. Enum-valued fields arrive as free text
/// and are parsed defensively: an unrecognized value is discarded and
/// the path keeps its prior default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnrichmentResponse {
    #[serde(default)]
    pub scenario_name: Option<String>,
    #[serde(default)]
    pub attacker_profile: Option<String>,
    #[serde(default)]
    pub path_feasibility: Option<String>,
    #[serde(default)]
    pub time_to_compromise: Option<String>,
    #[serde(default)]
    pub combined_likelihood: Option<String>,
    #[serde(default)]
    pub key_chokepoints: Vec<String>,
    #[serde(default)]
    pub detection_opportunities: Vec<String>,
    #[serde(default)]
    pub required_resources: Vec<String>,
    #[serde(default)]
    pub path_complexity: Option<String>,
}

/// Narrative/feasibility enrichment collaborator (LLM-backed outside
/// this crate). Calls may block; the pool bounds and times them.
pub trait PathEnricher: Send + Sync {
    fn enrich(&self, summary: &PathSummary) -> Result<EnrichmentResponse, EngineError>;
}

/// Optional cross-project similarity store. Its entire response is
/// treated as an opaque blob merged into result metadata.
pub trait InsightStore: Send + Sync {
    fn insights(&self, paths: &[AttackPath]) -> Result<serde_json::Value, EngineError>;
}

/// Merge a response into a path. Annotates only; the step structure is
/// never altered.
pub fn apply_enrichment(path: &mut AttackPath, response: &EnrichmentResponse) {
    if let Some(name) = &response.scenario_name {
        path.narrative.scenario_name = Some(name.clone());
    }
    if let Some(profile) = &response.attacker_profile {
        path.narrative.attacker_profile = Some(profile.clone());
    }
    if let Some(ttc) = &response.time_to_compromise {
        path.narrative.time_to_compromise = Some(ttc.clone());
    }
    if !response.key_chokepoints.is_empty() {
        path.narrative.key_chokepoints = response.key_chokepoints.clone();
    }
    if !response.detection_opportunities.is_empty() {
        path.narrative.detection_opportunities = response.detection_opportunities.clone();
    }
    if !response.required_resources.is_empty() {
        path.narrative.required_resources = response.required_resources.clone();
    }

    if let Some(raw) = &response.path_feasibility {
        match Feasibility::parse(raw) {
            Some(feasibility) => path.feasibility = feasibility,
            None => debug!(
                "path {}: unrecognized feasibility {raw:?}, keeping {:?}",
                path.path_id, path.feasibility
            ),
        }
    }
    if let Some(raw) = &response.combined_likelihood {
        match Likelihood::parse(raw) {
            Some(likelihood) => path.combined_likelihood = likelihood,
            None => debug!(
                "path {}: unrecognized likelihood {raw:?}, keeping {:?}",
                path.path_id, path.combined_likelihood
            ),
        }
    }
    if let Some(raw) = &response.path_complexity {
        match PathComplexity::parse(raw) {
            Some(complexity) => path.complexity = complexity,
            None => debug!(
                "path {}: unrecognized complexity {raw:?}, keeping {:?}",
                path.path_id, path.complexity
            ),
        }
    }
}

/// Enrich every path through a bounded pool. Per path: up to
/// `max_attempts` tries, exponential backoff between them, each attempt
/// under `timeout_ms`. Failures are logged and swallowed.
pub fn enrich_paths(
    paths: &mut [AttackPath],
    enricher: Arc<dyn PathEnricher>,
    config: &EnrichmentConfig,
) {
    if paths.is_empty() {
        return;
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.concurrency.max(1))
        .enable_time()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            warn!("enrichment pool unavailable ({e}); paths kept unenriched");
            return;
        }
    };

    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let summaries: Vec<PathSummary> = paths.iter().map(PathSummary::of).collect();
    let timeout = Duration::from_millis(config.timeout_ms);
    let max_attempts = config.max_attempts;
    let backoff_base = Duration::from_millis(config.backoff_base_ms);

    let responses: Vec<Option<EnrichmentResponse>> = runtime.block_on(async {
        let mut handles = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let semaphore = Arc::clone(&semaphore);
            let enricher = Arc::clone(&enricher);
            handles.push(tokio::spawn(async move {
                // Closing the semaphore is not part of this flow, so
                // acquisition only fails on shutdown.
                let Ok(_permit) = semaphore.acquire().await else {
                    return None;
                };
                enrich_one(summary, enricher, timeout, max_attempts, backoff_base).await
            }));
        }
        let mut out = Vec::with_capacity(handles.len());
        for handle in handles {
            out.push(handle.await.ok().flatten());
        }
        out
    });

    for (path, response) in paths.iter_mut().zip(responses) {
        if let Some(response) = response {
            apply_enrichment(path, &response);
        }
    }
}

async fn enrich_one(
    summary: PathSummary,
    enricher: Arc<dyn PathEnricher>,
    timeout: Duration,
    max_attempts: usize,
    backoff_base: Duration,
) -> Option<EnrichmentResponse> {
    let mut backoff = backoff_base;
    for attempt in 1..=max_attempts {
        // The collaborator call may block, so it runs on the blocking
        // pool and the timeout races the join handle.
        let enricher = Arc::clone(&enricher);
        let call_summary = summary.clone();
        let call = tokio::task::spawn_blocking(move || enricher.enrich(&call_summary));
        match tokio::time::timeout(timeout, call).await {
            Ok(Ok(Ok(response))) => return Some(response),
            Ok(Ok(Err(e))) => {
                warn!(
                    "enrichment attempt {attempt}/{max_attempts} for path {} failed: {e}",
                    summary.path_id
                );
            }
            Ok(Err(join_err)) => {
                warn!(
                    "enrichment attempt {attempt}/{max_attempts} for path {} panicked: {join_err}",
                    summary.path_id
                );
            }
            Err(_) => {
                warn!(
                    "enrichment attempt {attempt}/{max_attempts} for path {} timed out",
                    summary.path_id
                );
            }
        }
        if attempt < max_attempts {
            tokio::time::sleep(backoff).await;
            backoff *= 2;
        }
    }
    None
}
