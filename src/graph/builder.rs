//! System graph construction.
//!
//! `GraphBuilder` turns the three component lists plus data-flow records
//! into an immutable `SystemGraph`. Once built the graph is never
//! mutated, so it can be shared freely across worker threads.

use im::{HashMap, HashSet, Vector};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::core::{Component, ComponentKind, Criticality, DataFlow, TrustLevel};

/// Immutable directed system graph: components plus forward and reverse
/// adjacency indices, with declaration order preserved for stable
/// tie-breaking downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemGraph {
    components: HashMap<String, Component>,
    /// Component ids in declaration order (entities, processes, assets).
    order: Vector<String>,
    flows: Vector<DataFlow>,
    outgoing: HashMap<String, HashSet<String>>,
    incoming: HashMap<String, HashSet<String>>,
    primary_entity: Option<String>,
    dropped_flows: usize,
}

impl SystemGraph {
    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.components.contains_key(id)
    }

    /// Ids in declaration order.
    pub fn component_ids(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn flows(&self) -> impl Iterator<Item = &DataFlow> {
        self.flows.iter()
    }

    pub fn flow_count(&self) -> usize {
        self.flows.len()
    }

    /// Successors along forward (and, for bidirectional flows, reverse)
    /// edges, in a deterministic order.
    pub fn successors(&self, id: &str) -> Vec<&str> {
        let mut out: Vec<&str> = self
            .outgoing
            .get(id)
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default();
        out.sort_unstable();
        out
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.outgoing
            .get(from)
            .map(|set| set.contains(to))
            .unwrap_or(false)
    }

    /// Total in-plus-out degree of a node.
    pub fn degree(&self, id: &str) -> usize {
        let out = self.outgoing.get(id).map(|s| s.len()).unwrap_or(0);
        let inc = self.incoming.get(id).map(|s| s.len()).unwrap_or(0);
        out + inc
    }

    /// The designated primary external entity, if any was declared.
    pub fn primary_entity(&self) -> Option<&str> {
        self.primary_entity.as_deref()
    }

    /// True when `id` has an incoming edge from the primary entity.
    pub fn fed_by_primary_entity(&self, id: &str) -> bool {
        match &self.primary_entity {
            Some(primary) => self
                .incoming
                .get(id)
                .map(|set| set.contains(primary))
                .unwrap_or(false),
            None => false,
        }
    }

    /// Flows skipped at build time for referencing unknown components.
    pub fn dropped_flow_count(&self) -> usize {
        self.dropped_flows
    }

    /// Declaration index used for stable candidate tie-breaking.
    pub fn declaration_index(&self, id: &str) -> usize {
        self.order
            .iter()
            .position(|c| c == id)
            .unwrap_or(usize::MAX)
    }
}

pub struct GraphBuilder {
    /// Added when a flow omits `bidirectional`.
    bidirectional_default: bool,
    /// Entity treated as the system's primary user; first declared
    /// entity when unset.
    primary_entity: Option<String>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self {
            bidirectional_default: true,
            primary_entity: None,
        }
    }
}

impl GraphBuilder {
    pub fn new(bidirectional_default: bool, primary_entity: Option<String>) -> Self {
        Self {
            bidirectional_default,
            primary_entity,
        }
    }

    /// Build the immutable graph. Flows with a dangling endpoint are
    /// dropped and logged, never fatal.
    pub fn build(
        &self,
        entities: &[String],
        processes: &[String],
        assets: &[String],
        flows: &[DataFlow],
    ) -> SystemGraph {
        let primary = self
            .primary_entity
            .clone()
            .or_else(|| entities.first().cloned());

        let mut components = HashMap::new();
        let mut order = Vector::new();

        for id in entities {
            let criticality = if Some(id) == primary.as_ref() {
                Criticality::High
            } else {
                Criticality::Medium
            };
            self.insert_component(
                &mut components,
                &mut order,
                id,
                ComponentKind::ExternalEntity,
                criticality,
                TrustLevel::Untrusted,
            );
        }
        for id in processes {
            self.insert_component(
                &mut components,
                &mut order,
                id,
                ComponentKind::Process,
                Criticality::Medium,
                TrustLevel::SemiTrusted,
            );
        }
        for id in assets {
            self.insert_component(
                &mut components,
                &mut order,
                id,
                ComponentKind::Asset,
                Criticality::Critical,
                TrustLevel::Trusted,
            );
        }

        let mut kept = Vector::new();
        let mut outgoing: HashMap<String, HashSet<String>> = HashMap::new();
        let mut incoming: HashMap<String, HashSet<String>> = HashMap::new();
        let mut dropped = 0usize;

        for flow in flows {
            if !components.contains_key(&flow.source) || !components.contains_key(&flow.destination)
            {
                warn!(
                    "dropping flow {} -> {}: unknown endpoint",
                    flow.source, flow.destination
                );
                dropped += 1;
                continue;
            }

            outgoing
                .entry(flow.source.clone())
                .or_default()
                .insert(flow.destination.clone());
            incoming
                .entry(flow.destination.clone())
                .or_default()
                .insert(flow.source.clone());

            if flow.bidirectional {
                outgoing
                    .entry(flow.destination.clone())
                    .or_default()
                    .insert(flow.source.clone());
                incoming
                    .entry(flow.source.clone())
                    .or_default()
                    .insert(flow.destination.clone());
            }

            kept.push_back(flow.clone());
        }

        let primary_entity = primary.filter(|p| components.contains_key(p));

        SystemGraph {
            components,
            order,
            flows: kept,
            outgoing,
            incoming,
            primary_entity,
            dropped_flows: dropped,
        }
    }

    fn insert_component(
        &self,
        components: &mut HashMap<String, Component>,
        order: &mut Vector<String>,
        id: &str,
        kind: ComponentKind,
        criticality: Criticality,
        trust_level: TrustLevel,
    ) {
        if components.contains_key(id) {
            warn!("duplicate component declaration ignored: {id}");
            return;
        }
        components.insert(
            id.to_string(),
            Component {
                id: id.to_string(),
                kind,
                criticality,
                trust_level,
            },
        );
        order.push_back(id.to_string());
    }
}

/// Resolve the `bidirectional` field of a raw flow record against the
/// configured default.
pub fn resolve_bidirectional(raw: Option<bool>, default: bool) -> bool {
    raw.unwrap_or(default)
}
