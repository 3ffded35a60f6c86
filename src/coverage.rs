//! Threat coverage reporting: what fraction of the inventory the
//! emitted paths actually exercise.

use std::collections::HashSet;

use crate::core::{AttackPath, ThreatCoverage};

pub fn calculate_coverage(paths: &[AttackPath], total_threats: usize) -> ThreatCoverage {
    let covered: HashSet<&str> = paths
        .iter()
        .flat_map(|path| path.steps.iter())
        .map(|step| step.threat_id.as_str())
        .collect();

    let coverage_percentage = if total_threats == 0 {
        0.0
    } else {
        let raw = covered.len() as f64 / total_threats as f64 * 100.0;
        (raw * 100.0).round() / 100.0
    };

    ThreatCoverage {
        covered_threats: covered.len(),
        total_threats,
        coverage_percentage,
    }
}
