//! Optional centrality bonus for asset scoring.
//!
//! The asset scorer is correct without any centrality signal; this
//! seam exists so deployments that want a topology-aware boost can
//! inject one. The default is a no-op.

use im::HashMap as ImHashMap;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use crate::graph::SystemGraph;

/// Injectable per-node score bonus.
pub trait CentralityStrategy: Send + Sync {
    /// Bonus added to each node's asset score. Missing nodes get 0.
    fn bonuses(&self, graph: &SystemGraph) -> ImHashMap<String, u32>;

    fn name(&self) -> &str;
}

/// Default strategy: contributes nothing.
#[derive(Debug, Default)]
pub struct NoopCentrality;

impl CentralityStrategy for NoopCentrality {
    fn bonuses(&self, _graph: &SystemGraph) -> ImHashMap<String, u32> {
        ImHashMap::new()
    }

    fn name(&self) -> &str {
        "noop"
    }
}

/// Betweenness-style bonus: counts how often a node sits on a BFS
/// shortest path between two other nodes, scaled into a small additive
/// score so it nudges rather than dominates the classification table.
#[derive(Debug, Default)]
pub struct BetweennessCentrality;

impl BetweennessCentrality {
    fn build_petgraph(graph: &SystemGraph) -> (DiGraph<String, ()>, HashMap<String, NodeIndex>) {
        let mut pg = DiGraph::new();
        let mut indices = HashMap::new();
        for id in graph.component_ids() {
            let idx = pg.add_node(id.clone());
            indices.insert(id.clone(), idx);
        }
        for id in graph.component_ids() {
            for succ in graph.successors(id) {
                if let (Some(&a), Some(&b)) = (indices.get(id.as_str()), indices.get(succ)) {
                    pg.add_edge(a, b, ());
                }
            }
        }
        (pg, indices)
    }
}

impl CentralityStrategy for BetweennessCentrality {
    fn bonuses(&self, graph: &SystemGraph) -> ImHashMap<String, u32> {
        let (pg, indices) = Self::build_petgraph(graph);
        let mut on_path_counts: HashMap<String, u32> = HashMap::new();

        let ids: Vec<&String> = graph.component_ids().collect();
        for source in &ids {
            let Some(&start) = indices.get(source.as_str()) else {
                continue;
            };
            // Single-source BFS predecessor tree over the petgraph view.
            let mut preds: HashMap<NodeIndex, NodeIndex> = HashMap::new();
            let mut queue = std::collections::VecDeque::from([start]);
            let mut seen = std::collections::HashSet::from([start]);
            while let Some(node) = queue.pop_front() {
                for next in pg.neighbors(node) {
                    if seen.insert(next) {
                        preds.insert(next, node);
                        queue.push_back(next);
                    }
                }
            }
            for target in &ids {
                if target == source {
                    continue;
                }
                let Some(&end) = indices.get(target.as_str()) else {
                    continue;
                };
                let mut cursor = end;
                while let Some(&prev) = preds.get(&cursor) {
                    if prev != start {
                        *on_path_counts.entry(pg[prev].clone()).or_insert(0) += 1;
                    }
                    cursor = prev;
                }
            }
        }

        let max = on_path_counts.values().copied().max().unwrap_or(0);
        if max == 0 {
            return ImHashMap::new();
        }
        // Scale to a 0..=3 bonus.
        on_path_counts
            .into_iter()
            .map(|(id, count)| (id, count * 3 / max))
            .filter(|(_, bonus)| *bonus > 0)
            .collect()
    }

    fn name(&self) -> &str {
        "betweenness"
    }
}
