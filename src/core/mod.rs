pub mod types;

pub use types::{
    AnalysisMetadata, AnalysisResult, AttackPath, AttackStep, Component, ComponentKind,
    Criticality, DataFlow, DefenseKind, DefensePriority, DetectionDifficulty, Feasibility, Impact,
    Likelihood, PathComplexity, PathNarrative, PriorityTier, RequiredAccess, StrideCategory,
    Threat, ThreatCoverage, TrustLevel,
};
