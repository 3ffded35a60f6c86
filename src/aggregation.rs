//! Path-level aggregation.
//!
//! Reduces a step list into the path's combined impact (worst case),
//! combined likelihood (weakest link), and deterministic identifier.

use sha2::{Digest, Sha256};

use crate::core::{
    AttackPath, AttackStep, Feasibility, Impact, Likelihood, PathComplexity, PathNarrative, Threat,
};
use crate::pathfinder::RawPath;
use crate::threats::ThreatIndex;

/// First 8 hex chars of a SHA-256 over the ordered component sequence.
/// Same graph and path always hash to the same id.
pub fn path_id(components: &RawPath) -> String {
    let joined = components.join("->");
    let digest = Sha256::digest(joined.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..8].to_string()
}

fn threat_for<'a>(step: &AttackStep, index: &'a ThreatIndex) -> Option<&'a Threat> {
    index
        .get(&step.component)
        .and_then(|threats| threats.iter().find(|t| t.threat_id == step.threat_id))
}

/// Worst-case impact across the path's step threats. Defensive default
/// Medium for a threatless path; the attacher's discard rule means that
/// should never happen in practice.
pub fn combined_impact(steps: &[AttackStep], index: &ThreatIndex) -> Impact {
    steps
        .iter()
        .filter_map(|step| threat_for(step, index))
        .map(|threat| threat.impact)
        .max_by_key(|impact| impact.rank())
        .unwrap_or(Impact::Medium)
}

/// Weakest-link likelihood: the chain is no more likely than its least
/// likely step. Same defensive Medium default.
pub fn combined_likelihood(steps: &[AttackStep], index: &ThreatIndex) -> Likelihood {
    steps
        .iter()
        .filter_map(|step| threat_for(step, index))
        .map(|threat| threat.likelihood)
        .min_by_key(|likelihood| likelihood.rank())
        .unwrap_or(Likelihood::Medium)
}

/// Assemble the full `AttackPath` value from an enumerated component
/// sequence and its attached steps.
pub fn aggregate(components: &RawPath, steps: Vec<AttackStep>, index: &ThreatIndex) -> AttackPath {
    let impact = combined_impact(&steps, index);
    let likelihood = combined_likelihood(&steps, index);
    let total_steps = steps.len();
    AttackPath {
        path_id: path_id(components),
        entry_point: components.first().cloned().unwrap_or_default(),
        target_asset: components.last().cloned().unwrap_or_default(),
        steps,
        total_steps,
        combined_impact: impact,
        combined_likelihood: likelihood,
        feasibility: Feasibility::default(),
        complexity: PathComplexity::from_step_count(total_steps),
        narrative: PathNarrative::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DataFlow, StrideCategory};
    use crate::graph::GraphBuilder;
    use crate::threats::{attach_threats, build_threat_index};

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
            description: String::new(),
            impact,
            likelihood,
        }
    }

    fn fixture() -> (RawPath, Vec<AttackStep>, ThreatIndex) {
        let flow = |source: &str, destination: &str| DataFlow {
            source: source.into(),
            destination: destination.into(),
            data_classification: "PII".into(),
            protocol: "HTTPS".into(),
            auth_mechanism: "OAuth2".into(),
            bidirectional: true,
        };
        let graph = GraphBuilder::default().build(
            &["User".into()],
            &["WebServer".into()],
            &["CustomerDB".into()],
            &[flow("User", "WebServer"), flow("WebServer", "CustomerDB")],
        );
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
        let steps = attach_threats(&path, &index).unwrap();
        (path, steps, index)
    }

    #[test]
    fn combined_impact_is_worst_case() {
        let (_, steps, index) = fixture();
        assert_eq!(combined_impact(&steps, &index), Impact::Critical);
    }

    #[test]
    fn combined_likelihood_is_weakest_link() {
        let (_, steps, index) = fixture();
        assert_eq!(combined_likelihood(&steps, &index), Likelihood::Medium);
    }

    #[test]
    fn empty_steps_default_to_medium() {
        let index = ThreatIndex::new();
        assert_eq!(combined_impact(&[], &index), Impact::Medium);
        assert_eq!(combined_likelihood(&[], &index), Likelihood::Medium);
    }

    #[test]
    fn path_id_is_deterministic_and_8_hex() {
        let path: RawPath = vec!["User".into(), "WebServer".into(), "CustomerDB".into()];
        let id = path_id(&path);
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, path_id(&path));
    }

    #[test]
    fn path_id_distinguishes_order() {
        let forward: RawPath = vec!["A".into(), "B".into()];
        let backward: RawPath = vec!["B".into(), "A".into()];
        assert_ne!(path_id(&forward), path_id(&backward));
    }

    #[test]
    fn aggregate_fills_endpoints_and_defaults() {
        let (path, steps, index) = fixture();
        let attack_path = aggregate(&path, steps, &index);
        assert_eq!(attack_path.entry_point, "User");
        assert_eq!(attack_path.target_asset, "CustomerDB");
        assert_eq!(attack_path.total_steps, attack_path.steps.len());
        assert_eq!(attack_path.feasibility, Feasibility::Realistic);
        assert_eq!(attack_path.complexity, PathComplexity::Low);
    }
}
