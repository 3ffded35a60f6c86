//! Defense priority generation.
//!
//! Weights every ranked path by feasibility and impact, accumulates
//! those weights per chokepoint, per component, and per detection gap,
//! then emits the top recommendations in each category.

use std::collections::BTreeMap;

use crate::core::{
    AttackPath, DefenseKind, DefensePriority, DetectionDifficulty, PriorityTier,
};

const TOP_CHOKEPOINTS: usize = 5;
const TOP_COMPONENTS: usize = 5;
const TOP_DETECTION: usize = 3;
const HIGH_TIER_THRESHOLD: u32 = 20;

fn tier_for(weighted_score: u32) -> PriorityTier {
    if weighted_score > HIGH_TIER_THRESHOLD {
        PriorityTier::High
    } else {
        PriorityTier::Medium
    }
}

/// Generate prioritized recommendations from the ranked path list.
/// BTreeMap accumulation keeps the ranking deterministic: equal scores
/// fall back to name order.
pub fn generate_defense_priorities(paths: &[AttackPath]) -> Vec<DefensePriority> {
    let mut chokepoints: BTreeMap<String, u32> = BTreeMap::new();
    let mut components: BTreeMap<String, u32> = BTreeMap::new();
    let mut detection_gaps: BTreeMap<String, u32> = BTreeMap::new();

    for path in paths {
        let weight = path.defense_weight();

        for chokepoint in &path.narrative.key_chokepoints {
            *chokepoints.entry(chokepoint.clone()).or_insert(0) += weight;
        }

        for step in &path.steps {
            *components.entry(step.component.clone()).or_insert(0) += weight;
            if step.detection_difficulty == DetectionDifficulty::Hard {
                *detection_gaps.entry(step.component.clone()).or_insert(0) += weight;
            }
        }
    }

    let mut priorities = Vec::new();
    priorities.extend(top_of(
        &chokepoints,
        TOP_CHOKEPOINTS,
        DefenseKind::Chokepoint,
        |name| format!("Implement control: {name}"),
    ));
    priorities.extend(top_of(
        &components,
        TOP_COMPONENTS,
        DefenseKind::ComponentHardening,
        |name| format!("Harden component: {name}"),
    ));
    priorities.extend(top_of(
        &detection_gaps,
        TOP_DETECTION,
        DefenseKind::DetectionEnhancement,
        |name| format!("Improve detection coverage at: {name}"),
    ));
    priorities
}

fn top_of(
    scores: &BTreeMap<String, u32>,
    limit: usize,
    kind: DefenseKind,
    describe: impl Fn(&str) -> String,
) -> Vec<DefensePriority> {
    let mut ranked: Vec<(&String, &u32)> = scores.iter().collect();
    // Stable sort over name-ordered input: score ties rank by name.
    ranked.sort_by(|a, b| b.1.cmp(a.1));
    ranked
        .into_iter()
        .take(limit)
        .map(|(name, &weighted_score)| DefensePriority {
            kind,
            recommendation: describe(name),
            weighted_score,
            priority_tier: tier_for(weighted_score),
        })
        .collect()
}
