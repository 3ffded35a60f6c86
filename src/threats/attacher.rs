//! Threat attachment.
//!
//! Maps the threat inventory onto graph components, then walks each raw
//! path picking the single most relevant unused threat per component.
//! Components with no eligible threat contribute no step; a path that
//! ends up with fewer than two steps is discarded outright.

use im::{HashMap, Vector};
use log::debug;

use crate::core::{
    AttackStep, DetectionDifficulty, RequiredAccess, StrideCategory, Threat,
};
use crate::graph::SystemGraph;
use crate::pathfinder::RawPath;

/// Immutable component-id → threats index. A flow-style name
/// ("A to B") registers the threat under both endpoints.
pub type ThreatIndex = HashMap<String, Vector<Threat>>;

/// Build the index once; downstream path processing shares it
/// read-only. Threat order within a component follows inventory order,
/// which is what makes tie-breaking stable.
pub fn build_threat_index(threats: &[Threat], graph: &SystemGraph) -> ThreatIndex {
    let mut index: ThreatIndex = HashMap::new();

    for threat in threats {
        for component in resolve_component_names(&threat.component_name) {
            if !graph.contains(&component) {
                continue;
            }
            index.entry(component).or_default().push_back(threat.clone());
        }
    }

    index
}

/// "A to B" resolves to both endpoints; anything else is a direct
/// component name.
fn resolve_component_names(name: &str) -> Vec<String> {
    match name.split_once(" to ") {
        Some((a, b)) => vec![a.trim().to_string(), b.trim().to_string()],
        None => vec![name.trim().to_string()],
    }
}

/// Positional relevance of a STRIDE category within a chain: spoofing
/// opens chains, tampering/disclosure/denial close them, privilege
/// escalation and tampering carry the middle.
fn positional_bonus(category: StrideCategory, position: usize, last: usize) -> u32 {
    if position == 0 {
        match category {
            StrideCategory::Spoofing => 10,
            _ => 0,
        }
    } else if position == last {
        match category {
            StrideCategory::Tampering
            | StrideCategory::InformationDisclosure
            | StrideCategory::DenialOfService => 10,
            _ => 0,
        }
    } else {
        match category {
            StrideCategory::ElevationOfPrivilege | StrideCategory::Tampering => 5,
            _ => 0,
        }
    }
}

fn relevance_score(threat: &Threat, position: usize, last: usize) -> u32 {
    positional_bonus(threat.stride_category, position, last)
        + threat.impact.attach_score()
        + threat.likelihood.attach_score()
}

fn required_access_for(position: usize, last: usize) -> RequiredAccess {
    if position == 0 {
        RequiredAccess::External
    } else if position == last {
        RequiredAccess::Privileged
    } else {
        RequiredAccess::Foothold
    }
}

/// Attach threats to one raw path. Returns `None` when fewer than two
/// components end up with a step.
pub fn attach_threats(path: &RawPath, index: &ThreatIndex) -> Option<Vec<AttackStep>> {
    let last = path.len().saturating_sub(1);
    let mut used: std::collections::HashSet<&str> = std::collections::HashSet::new();
    let mut steps: Vec<AttackStep> = Vec::new();

    for (position, component) in path.iter().enumerate() {
        let Some(candidates) = index.get(component) else {
            continue;
        };

        // Stable max: strictly-greater comparison keeps the first
        // encountered threat on ties.
        let mut best: Option<(&Threat, u32)> = None;
        for threat in candidates.iter() {
            if used.contains(threat.threat_id.as_str()) {
                continue;
            }
            let score = relevance_score(threat, position, last);
            if best.map(|(_, s)| score > s).unwrap_or(true) {
                best = Some((threat, score));
            }
        }

        let Some((threat, _)) = best else {
            continue;
        };
        used.insert(threat.threat_id.as_str());
        steps.push(AttackStep {
            position: steps.len() + 1,
            component: component.clone(),
            threat_id: threat.threat_id.clone(),
            stride_category: threat.stride_category,
            description: threat.description.clone(),
            required_access: required_access_for(position, last),
            detection_difficulty: DetectionDifficulty::from_stride(threat.stride_category),
        });
    }

    if steps.len() < 2 {
        debug!(
            "discarding path {:?}: only {} step(s) after threat attachment",
            path,
            steps.len()
        );
        return None;
    }
    Some(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DataFlow, Impact, Likelihood};
    use crate::graph::GraphBuilder;

    fn threat(
        id: &str,
        component_name: &str,
        category: StrideCategory,
        impact: Impact,
        likelihood: Likelihood,
    ) -> Threat {
        Threat {
            threat_id: id.into(),
            component_name: component_name.into(),
            stride_category: category,
            description: format!("{id} description"),
            impact,
            likelihood,
        }
    }

    fn graph() -> SystemGraph {
        let flow = |source: &str, destination: &str| DataFlow {
            source: source.into(),
            destination: destination.into(),
            data_classification: "PII".into(),
            protocol: "HTTPS".into(),
            auth_mechanism: "OAuth2".into(),
            bidirectional: true,
        };
        GraphBuilder::default().build(
            &["User".into()],
            &["WebServer".into()],
            &["CustomerDB".into()],
            &[flow("User", "WebServer"), flow("WebServer", "CustomerDB")],
        )
    }

    #[test]
    fn flow_style_name_maps_to_both_endpoints() {
        let graph = graph();
        let threats = vec![threat(
            "T1",
            "User to WebServer",
            StrideCategory::Spoofing,
            Impact::High,
            Likelihood::Medium,
        )];
        let index = build_threat_index(&threats, &graph);
        assert!(index.get("User").is_some());
        assert!(index.get("WebServer").is_some());
    }

    #[test]
    fn unknown_component_names_are_ignored() {
        let graph = graph();
        let threats = vec![threat(
            "T1",
            "Phantom",
            StrideCategory::Tampering,
            Impact::High,
            Likelihood::High,
        )];
        let index = build_threat_index(&threats, &graph);
        assert!(index.is_empty());
    }

    #[test]
    fn reference_scenario_attaches_two_steps() {
        let graph = graph();
        let threats = vec![
            threat(
                "T1",
                "User to WebServer",
                StrideCategory::Spoofing,
                Impact::High,
                Likelihood::Medium,
            ),
            threat(
                "T2",
                "WebServer to CustomerDB",
                StrideCategory::Tampering,
                Impact::Critical,
                Likelihood::Medium,
            ),
        ];
        let index = build_threat_index(&threats, &graph);
        let path: RawPath = vec!["User".into(), "WebServer".into(), "CustomerDB".into()];
        let steps = attach_threats(&path, &index).expect("path should survive");

        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].threat_id, "T1");
        assert_eq!(steps[0].component, "User");
        assert_eq!(steps[0].required_access, RequiredAccess::External);
        assert_eq!(steps[1].threat_id, "T2");
        assert_eq!(steps[1].component, "WebServer");
        // Positions are 1-based and strictly increasing.
        assert_eq!(steps[0].position, 1);
        assert_eq!(steps[1].position, 2);
    }

    #[test]
    fn threat_ids_never_repeat_within_a_path() {
        let graph = graph();
        // One threat mapped to both User and WebServer via flow name.
        let threats = vec![threat(
            "T1",
            "User to WebServer",
            StrideCategory::Spoofing,
            Impact::High,
            Likelihood::High,
        )];
        let index = build_threat_index(&threats, &graph);
        let path: RawPath = vec!["User".into(), "WebServer".into(), "CustomerDB".into()];
        // T1 can only be used once, leaving a single step: discarded.
        assert!(attach_threats(&path, &index).is_none());
    }

    #[test]
    fn first_step_prefers_spoofing() {
        let graph = graph();
        let threats = vec![
            // Higher impact but wrong position.
            threat(
                "T-dos",
                "User",
                StrideCategory::DenialOfService,
                Impact::Critical,
                Likelihood::Medium,
            ),
            // Spoofing bonus dominates at the first step:
            // 10 + 6 + 3 = 19 vs 0 + 8 + 3 = 11.
            threat(
                "T-spoof",
                "User",
                StrideCategory::Spoofing,
                Impact::High,
                Likelihood::Medium,
            ),
            threat(
                "T2",
                "WebServer to CustomerDB",
                StrideCategory::Tampering,
                Impact::Critical,
                Likelihood::Medium,
            ),
        ];
        let index = build_threat_index(&threats, &graph);
        let path: RawPath = vec!["User".into(), "WebServer".into(), "CustomerDB".into()];
        let steps = attach_threats(&path, &index).unwrap();
        assert_eq!(steps[0].threat_id, "T-spoof");
    }

    #[test]
    fn score_ties_keep_first_encountered() {
        let graph = graph();
        let threats = vec![
            threat(
                "T-a",
                "User",
                StrideCategory::Spoofing,
                Impact::High,
                Likelihood::Medium,
            ),
            threat(
                "T-b",
                "User",
                StrideCategory::Spoofing,
                Impact::High,
                Likelihood::Medium,
            ),
            threat(
                "T2",
                "WebServer",
                StrideCategory::Tampering,
                Impact::Critical,
                Likelihood::Medium,
            ),
        ];
        let index = build_threat_index(&threats, &graph);
        let path: RawPath = vec!["User".into(), "WebServer".into(), "CustomerDB".into()];
        let steps = attach_threats(&path, &index).unwrap();
        assert_eq!(steps[0].threat_id, "T-a");
    }

    #[test]
    fn threatless_component_contributes_no_step() {
        let graph = graph();
        let threats = vec![
            threat(
                "T1",
                "User",
                StrideCategory::Spoofing,
                Impact::High,
                Likelihood::Medium,
            ),
            threat(
                "T3",
                "CustomerDB",
                StrideCategory::InformationDisclosure,
                Impact::Critical,
                Likelihood::Low,
            ),
        ];
        let index = build_threat_index(&threats, &graph);
        // WebServer has no mapped threat: skipped, not an error.
        let path: RawPath = vec!["User".into(), "WebServer".into(), "CustomerDB".into()];
        let steps = attach_threats(&path, &index).unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].component, "CustomerDB");
        assert_eq!(steps[1].position, 2);
    }
}
