//! Bounded path enumeration between ranked candidates.
//!
//! For every (entry, target) pair: the BFS shortest path, then up to
//! `max_paths_per_pair` simple paths from a bounded depth-first walk.
//! Paths are deduplicated globally by exact node sequence. Output is
//! discovery-ordered; ranking happens later in an explicit sort pass.

use log::debug;
use rayon::prelude::*;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::config::AnalysisConfig;
use crate::graph::SystemGraph;
use crate::scoring::ScoredCandidate;

/// Cooperative cancellation handle. Cloned freely; checking is a
/// relaxed atomic load.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        if self.cancelled.load(Ordering::Relaxed) {
            return true;
        }
        matches!(self.deadline, Some(d) if Instant::now() >= d)
    }
}

/// An enumerated component sequence, before threat attachment.
pub type RawPath = Vec<String>;

/// Enumerate raw paths for every (entry, target) pair. Cancellation is
/// checked between pairs, so a cancelled run returns the consistent
/// subset accumulated so far.
pub fn find_paths(
    graph: &SystemGraph,
    entries: &[ScoredCandidate],
    targets: &[ScoredCandidate],
    config: &AnalysisConfig,
    cancel: &CancelFlag,
) -> Vec<RawPath> {
    let pairs: Vec<(&str, &str)> = entries
        .iter()
        .flat_map(|entry| {
            targets.iter().filter_map(move |target| {
                (entry.component_id != target.component_id)
                    .then_some((entry.component_id.as_str(), target.component_id.as_str()))
            })
        })
        .filter(|(entry, target)| graph.contains(entry) && graph.contains(target))
        .collect();

    let mut raw: Vec<RawPath> = Vec::new();
    let mut seen: HashSet<RawPath> = HashSet::new();

    // Pairs are independent pure computations over the immutable graph;
    // enumerate them in parallel, then merge in pair order so the
    // discovery order stays deterministic.
    let per_pair: Vec<Vec<RawPath>> = pairs
        .par_iter()
        .map(|(entry, target)| {
            if cancel.is_cancelled() {
                return Vec::new();
            }
            enumerate_pair(graph, entry, target, config)
        })
        .collect();

    for pair_paths in per_pair {
        for path in pair_paths {
            if seen.insert(path.clone()) {
                raw.push(path);
            }
        }
    }

    let raw = drop_subsumed(raw);

    debug!(
        "path enumeration: {} pairs -> {} unique raw paths",
        pairs.len(),
        raw.len()
    );
    raw
}

/// Remove any path that is a contiguous sub-chain of a longer kept
/// path. A chain wholly contained in another reported chain carries no
/// additional defensive information. Discovery order is preserved for
/// the survivors.
fn drop_subsumed(paths: Vec<RawPath>) -> Vec<RawPath> {
    let keep: Vec<bool> = paths
        .iter()
        .map(|p| {
            !paths
                .iter()
                .any(|q| q.len() > p.len() && q.windows(p.len()).any(|w| w == p.as_slice()))
        })
        .collect();
    paths
        .into_iter()
        .zip(keep)
        .filter_map(|(path, keep)| keep.then_some(path))
        .collect()
}

fn enumerate_pair(
    graph: &SystemGraph,
    entry: &str,
    target: &str,
    config: &AnalysisConfig,
) -> Vec<RawPath> {
    let mut found: Vec<RawPath> = Vec::new();

    if let Some(shortest) = bfs_shortest_path(graph, entry, target) {
        if shortest.len() <= config.max_path_length {
            found.push(shortest);
        }
    }

    let mut budget = config.max_paths_per_pair;
    let mut current = vec![entry.to_string()];
    let mut visited: HashSet<&str> = HashSet::from([entry]);
    dfs_simple_paths(
        graph,
        target,
        config.max_path_length,
        &mut current,
        &mut visited,
        &mut budget,
        &mut |path| {
            if !found.contains(&path) {
                found.push(path);
            }
        },
    );

    found
}

/// Standard BFS over the forward adjacency; successor order is the
/// graph's deterministic sorted order.
fn bfs_shortest_path(graph: &SystemGraph, entry: &str, target: &str) -> Option<RawPath> {
    let mut queue = VecDeque::from([entry]);
    let mut preds: std::collections::HashMap<&str, &str> = std::collections::HashMap::new();
    let mut seen: HashSet<&str> = HashSet::from([entry]);

    while let Some(node) = queue.pop_front() {
        if node == target {
            let mut path = vec![target.to_string()];
            let mut cursor = target;
            while let Some(&prev) = preds.get(cursor) {
                path.push(prev.to_string());
                cursor = prev;
            }
            path.reverse();
            return Some(path);
        }
        for next in graph.successors(node) {
            if seen.insert(next) {
                preds.insert(next, node);
                queue.push_back(next);
            }
        }
    }
    None
}

/// Bounded DFS over simple paths (no repeated node). `budget` caps how
/// many paths this pair may emit.
fn dfs_simple_paths<'g>(
    graph: &'g SystemGraph,
    target: &str,
    max_len: usize,
    current: &mut Vec<String>,
    visited: &mut HashSet<&'g str>,
    budget: &mut usize,
    emit: &mut impl FnMut(RawPath),
) {
    if *budget == 0 {
        return;
    }
    let last = current.last().cloned().unwrap_or_default();
    if last == target {
        *budget -= 1;
        emit(current.clone());
        return;
    }
    if current.len() >= max_len {
        return;
    }
    for next in graph.successors(&last) {
        if *budget == 0 {
            return;
        }
        if visited.contains(next) {
            continue;
        }
        visited.insert(next);
        current.push(next.to_string());
        dfs_simple_paths(graph, target, max_len, current, visited, budget, emit);
        current.pop();
        visited.remove(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DataFlow;
    use crate::graph::GraphBuilder;

    fn flow(source: &str, destination: &str) -> DataFlow {
        DataFlow {
            source: source.into(),
            destination: destination.into(),
            data_classification: "PII".into(),
            protocol: "HTTPS".into(),
            auth_mechanism: "OAuth2".into(),
            bidirectional: false,
        }
    }

    fn candidate(id: &str) -> ScoredCandidate {
        ScoredCandidate {
            component_id: id.into(),
            score: 10,
        }
    }

    fn diamond_graph() -> SystemGraph {
        // User -> {Api, Batch} -> Store
        GraphBuilder::default().build(
            &["User".into()],
            &["Api".into(), "Batch".into()],
            &["Store".into()],
            &[
                flow("User", "Api"),
                flow("User", "Batch"),
                flow("Api", "Store"),
                flow("Batch", "Store"),
            ],
        )
    }

    #[test]
    fn finds_shortest_and_alternates() {
        let graph = diamond_graph();
        let paths = find_paths(
            &graph,
            &[candidate("User")],
            &[candidate("Store")],
            &AnalysisConfig::default(),
            &CancelFlag::new(),
        );
        assert_eq!(paths.len(), 2);
        assert!(paths.contains(&vec!["User".into(), "Api".into(), "Store".into()]));
        assert!(paths.contains(&vec!["User".into(), "Batch".into(), "Store".into()]));
    }

    #[test]
    fn respects_max_path_length() {
        let graph = GraphBuilder::default().build(
            &["A".into()],
            &["B".into(), "C".into(), "D".into()],
            &["E".into()],
            &[
                flow("A", "B"),
                flow("B", "C"),
                flow("C", "D"),
                flow("D", "E"),
            ],
        );
        let config = AnalysisConfig {
            max_path_length: 3,
            ..Default::default()
        };
        let paths = find_paths(
            &graph,
            &[candidate("A")],
            &[candidate("E")],
            &config,
            &CancelFlag::new(),
        );
        // The only route has 5 components; nothing fits in 3.
        assert!(paths.is_empty());
    }

    #[test]
    fn caps_paths_per_pair() {
        // Four parallel middle hops.
        let middles: Vec<String> = (0..4).map(|i| format!("M{i}")).collect();
        let mut flows = Vec::new();
        for m in &middles {
            flows.push(flow("Start", m));
            flows.push(flow(m, "End"));
        }
        let graph = GraphBuilder::default().build(
            &["Start".into()],
            &middles,
            &["End".into()],
            &flows,
        );
        let config = AnalysisConfig {
            max_paths_per_pair: 2,
            ..Default::default()
        };
        let paths = find_paths(
            &graph,
            &[candidate("Start")],
            &[candidate("End")],
            &config,
            &CancelFlag::new(),
        );
        // BFS shortest plus at most 2 DFS paths, minus the overlap
        // between the two enumerations.
        assert!(paths.len() <= 3);
        assert!(!paths.is_empty());
    }

    #[test]
    fn deduplicates_across_pairs() {
        let graph = diamond_graph();
        let paths = find_paths(
            &graph,
            &[candidate("User"), candidate("User")],
            &[candidate("Store")],
            &AnalysisConfig::default(),
            &CancelFlag::new(),
        );
        let unique: HashSet<&RawPath> = paths.iter().collect();
        assert_eq!(paths.len(), unique.len());
    }

    #[test]
    fn entry_equal_to_target_is_skipped() {
        let graph = diamond_graph();
        let paths = find_paths(
            &graph,
            &[candidate("Store")],
            &[candidate("Store")],
            &AnalysisConfig::default(),
            &CancelFlag::new(),
        );
        assert!(paths.is_empty());
    }

    #[test]
    fn cancelled_flag_stops_enumeration() {
        let graph = diamond_graph();
        let cancel = CancelFlag::new();
        cancel.cancel();
        let paths = find_paths(
            &graph,
            &[candidate("User")],
            &[candidate("Store")],
            &AnalysisConfig::default(),
            &cancel,
        );
        assert!(paths.is_empty());
    }

    #[test]
    fn sub_chains_of_longer_paths_are_dropped() {
        // WebServer qualifies as both a mid-node and an entry
        // candidate; the WebServer -> Store sub-chain duplicates the
        // tail of the full chain and is subsumed.
        let graph = GraphBuilder::default().build(
            &["User".into()],
            &["WebServer".into()],
            &["Store".into()],
            &[flow("User", "WebServer"), flow("WebServer", "Store")],
        );
        let paths = find_paths(
            &graph,
            &[candidate("User"), candidate("WebServer")],
            &[candidate("Store"), candidate("WebServer")],
            &AnalysisConfig::default(),
            &CancelFlag::new(),
        );
        assert_eq!(
            paths,
            vec![vec![
                "User".to_string(),
                "WebServer".to_string(),
                "Store".to_string()
            ]]
        );
    }

    #[test]
    fn determinism_same_input_same_order() {
        let graph = diamond_graph();
        let run = || {
            find_paths(
                &graph,
                &[candidate("User")],
                &[candidate("Store")],
                &AnalysisConfig::default(),
                &CancelFlag::new(),
            )
        };
        assert_eq!(run(), run());
    }
}
