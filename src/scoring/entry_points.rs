//! Entry-point candidate scoring.
//!
//! Ranks every node as a potential start of an attack chain. The scored
//! list is capped before path finding, which bounds the pair
//! combinatorics of everything downstream.

use crate::core::{ComponentKind, TrustLevel};
use crate::graph::SystemGraph;

/// A graph node with its candidate score. Shared by both scorers so
/// the path finder sees one candidate shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredCandidate {
    pub component_id: String,
    pub score: u32,
}

/// Score all nodes as entry-point candidates, keep those with score
/// > 0, sort descending with declaration order as the tie-break, and
/// cap the list at `max_candidates`.
pub fn score_entry_points(graph: &SystemGraph, max_candidates: usize) -> Vec<ScoredCandidate> {
    let mut candidates: Vec<ScoredCandidate> = graph
        .component_ids()
        .filter_map(|id| {
            let component = graph.component(id)?;
            let mut score = 0u32;
            if component.kind == ComponentKind::ExternalEntity {
                score += 10;
            }
            if component.trust_level == TrustLevel::Untrusted {
                score += 5;
            }
            if graph.fed_by_primary_entity(id) {
                score += 3;
            }
            if graph.degree(id) > 3 {
                score += 2;
            }
            (score > 0).then(|| ScoredCandidate {
                component_id: id.clone(),
                score,
            })
        })
        .collect();

    // Input order is declaration order, so a stable sort on score alone
    // gives the documented tie-break.
    candidates.sort_by(|a, b| b.score.cmp(&a.score));
    candidates.truncate(max_candidates);
    candidates
}
