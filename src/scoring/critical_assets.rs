//! Critical-asset candidate scoring.
//!
//! Identifies the graph nodes worth reaching. Asset-kind nodes get a
//! fixed base; every data flow then feeds its classification score to
//! the destination (full) and source (half). Nodes over the threshold
//! become path-finding targets.

use crate::core::ComponentKind;
use crate::graph::SystemGraph;
use crate::scoring::centrality::{CentralityStrategy, NoopCentrality};
use crate::scoring::entry_points::ScoredCandidate;
use std::collections::HashMap;

const ASSET_BASE_SCORE: u32 = 10;
const KEEP_THRESHOLD: u32 = 5;
const UNKNOWN_CLASSIFICATION_SCORE: u32 = 3;

/// Fixed classification table; unknown classifications score 3.
fn classification_score(classification: &str) -> u32 {
    match classification.trim().to_ascii_uppercase().as_str() {
        "PII" => 8,
        "PHI" => 9,
        "PCI" => 8,
        "CONFIDENTIAL" => 7,
        "INTERNAL" => 5,
        "PUBLIC" => 1,
        _ => UNKNOWN_CLASSIFICATION_SCORE,
    }
}

pub struct CriticalAssetScorer<'a> {
    centrality: &'a dyn CentralityStrategy,
}

impl Default for CriticalAssetScorer<'_> {
    fn default() -> Self {
        static NOOP: NoopCentrality = NoopCentrality;
        Self { centrality: &NOOP }
    }
}

impl<'a> CriticalAssetScorer<'a> {
    pub fn with_centrality(centrality: &'a dyn CentralityStrategy) -> Self {
        Self { centrality }
    }

    /// Score and rank target candidates, capped at `max_candidates`.
    pub fn score(&self, graph: &SystemGraph, max_candidates: usize) -> Vec<ScoredCandidate> {
        let mut scores: HashMap<&str, u32> = HashMap::new();

        for id in graph.component_ids() {
            if let Some(component) = graph.component(id) {
                if component.kind == ComponentKind::Asset {
                    scores.insert(id.as_str(), ASSET_BASE_SCORE);
                }
            }
        }

        for flow in graph.flows() {
            let value = classification_score(&flow.data_classification);
            *scores.entry(flow.destination.as_str()).or_insert(0) += value;
            *scores.entry(flow.source.as_str()).or_insert(0) += value / 2;
        }

        let bonuses = self.centrality.bonuses(graph);
        for (id, bonus) in bonuses.iter() {
            if let Some(score) = scores.get_mut(id.as_str()) {
                *score += bonus;
            }
        }

        // Walk declaration order so the stable sort's tie-break matches
        // the entry-point scorer's.
        let mut candidates: Vec<ScoredCandidate> = graph
            .component_ids()
            .filter_map(|id| {
                let score = *scores.get(id.as_str())?;
                (score > KEEP_THRESHOLD).then(|| ScoredCandidate {
                    component_id: id.clone(),
                    score,
                })
            })
            .collect();

        candidates.sort_by(|a, b| b.score.cmp(&a.score));
        candidates.truncate(max_candidates);
        candidates
    }
}

/// Convenience wrapper with the no-op centrality default.
pub fn score_critical_assets(graph: &SystemGraph, max_candidates: usize) -> Vec<ScoredCandidate> {
    CriticalAssetScorer::default().score(graph, max_candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DataFlow;
    use crate::graph::GraphBuilder;
    use crate::scoring::centrality::BetweennessCentrality;

    fn flow(source: &str, destination: &str, classification: &str) -> DataFlow {
        DataFlow {
            source: source.into(),
            destination: destination.into(),
            data_classification: classification.into(),
            protocol: "HTTPS".into(),
            auth_mechanism: "mTLS".into(),
            bidirectional: false,
        }
    }

    #[test]
    fn classification_table_matches_policy() {
        assert_eq!(classification_score("PHI"), 9);
        assert_eq!(classification_score("pii"), 8);
        assert_eq!(classification_score("Confidential"), 7);
        assert_eq!(classification_score("Public"), 1);
        assert_eq!(classification_score("made-up"), 3);
    }

    #[test]
    fn destination_gets_full_source_gets_half() {
        let graph = GraphBuilder::default().build(
            &["User".into()],
            &["Api".into()],
            &["Vault".into()],
            &[flow("Api", "Vault", "PHI")],
        );
        let candidates = score_critical_assets(&graph, 8);
        let vault = candidates.iter().find(|c| c.component_id == "Vault").unwrap();
        // Asset base 10 + destination PHI 9.
        assert_eq!(vault.score, 19);
        // Api: source half of 9 = 4 (integer division), below threshold.
        assert!(candidates.iter().all(|c| c.component_id != "Api"));
    }

    #[test]
    fn nodes_at_or_below_threshold_are_dropped() {
        let graph = GraphBuilder::default().build(
            &["User".into()],
            &["Api".into()],
            &[],
            &[flow("User", "Api", "Internal")],
        );
        // Api scores exactly 5; the keep rule is strictly greater-than.
        assert!(score_critical_assets(&graph, 8).is_empty());
    }

    #[test]
    fn all_public_flows_leave_no_targets_without_assets() {
        let graph = GraphBuilder::default().build(
            &["User".into()],
            &["Api".into(), "Cache".into()],
            &[],
            &[flow("User", "Api", "Public"), flow("Api", "Cache", "Public")],
        );
        assert!(score_critical_assets(&graph, 8).is_empty());
    }

    #[test]
    fn centrality_bonus_is_additive_and_optional() {
        let graph = GraphBuilder::default().build(
            &["User".into()],
            &["Gateway".into()],
            &["Store".into()],
            &[
                flow("User", "Gateway", "PII"),
                flow("Gateway", "Store", "PII"),
            ],
        );
        let plain = score_critical_assets(&graph, 8);
        let centrality = BetweennessCentrality;
        let boosted = CriticalAssetScorer::with_centrality(&centrality).score(&graph, 8);
        for candidate in &plain {
            let with_bonus = boosted
                .iter()
                .find(|c| c.component_id == candidate.component_id)
                .unwrap();
            assert!(with_bonus.score >= candidate.score);
        }
    }
}
