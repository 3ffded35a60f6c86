use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How sensitive a component is if compromised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criticality {
    Low,
    Medium,
    High,
    Critical,
}

/// Trust placed in a component by the rest of the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrustLevel {
    Untrusted,
    SemiTrusted,
    Trusted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    ExternalEntity,
    Process,
    Asset,
}

/// A node in the system graph. Built once by the graph builder and
/// immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub id: String,
    pub kind: ComponentKind,
    pub criticality: Criticality,
    pub trust_level: TrustLevel,
}

/// A directed data flow between two declared components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFlow {
    pub source: String,
    pub destination: String,
    pub data_classification: String,
    pub protocol: String,
    pub auth_mechanism: String,
    pub bidirectional: bool,
}

/// STRIDE threat taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrideCategory {
    Spoofing,
    Tampering,
    Repudiation,
    InformationDisclosure,
    DenialOfService,
    ElevationOfPrivilege,
}

impl StrideCategory {
    /// Parse a category from either the one-letter STRIDE code or the
    /// full name. Unrecognized input yields `None`; callers fall back to
    /// a default rather than erroring on collaborator output.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "S" | "s" => Some(Self::Spoofing),
            "T" | "t" => Some(Self::Tampering),
            "R" | "r" => Some(Self::Repudiation),
            "I" | "i" => Some(Self::InformationDisclosure),
            "D" | "d" => Some(Self::DenialOfService),
            "E" | "e" => Some(Self::ElevationOfPrivilege),
            other => match other.to_ascii_lowercase().replace([' ', '_', '-'], "").as_str() {
                "spoofing" => Some(Self::Spoofing),
                "tampering" => Some(Self::Tampering),
                "repudiation" => Some(Self::Repudiation),
                "informationdisclosure" => Some(Self::InformationDisclosure),
                "denialofservice" => Some(Self::DenialOfService),
                "elevationofprivilege" => Some(Self::ElevationOfPrivilege),
                _ => None,
            },
        }
    }

    pub fn code(&self) -> char {
        match self {
            Self::Spoofing => 'S',
            Self::Tampering => 'T',
            Self::Repudiation => 'R',
            Self::InformationDisclosure => 'I',
            Self::DenialOfService => 'D',
            Self::ElevationOfPrivilege => 'E',
        }
    }
}

impl fmt::Display for StrideCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Spoofing => "Spoofing",
            Self::Tampering => "Tampering",
            Self::Repudiation => "Repudiation",
            Self::InformationDisclosure => "Information Disclosure",
            Self::DenialOfService => "Denial of Service",
            Self::ElevationOfPrivilege => "Elevation of Privilege",
        };
        f.write_str(name)
    }
}

/// Impact of a single threat if realized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Impact {
    Low,
    Medium,
    High,
    Critical,
}

impl Impact {
    /// Rank used for worst-case aggregation across a path.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Critical => 4,
        }
    }

    /// Contribution to the threat-attachment score.
    pub fn attach_score(&self) -> u32 {
        match self {
            Self::Critical => 8,
            Self::High => 6,
            Self::Medium => 4,
            Self::Low => 2,
        }
    }

    /// Weight used when ranking defense priorities.
    pub fn weight(&self) -> u32 {
        match self {
            Self::Critical => 4,
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// Likelihood of a single threat being exercised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Likelihood {
    Low,
    Medium,
    High,
}

impl Likelihood {
    /// Rank used for weakest-link aggregation across a path.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    pub fn attach_score(&self) -> u32 {
        match self {
            Self::High => 5,
            Self::Medium => 3,
            Self::Low => 1,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// A discrete threat from the inventory. Read-only input; referenced by
/// id, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Threat {
    pub threat_id: String,
    /// Component name as written in the inventory. A flow-style name
    /// ("A to B") resolves to both endpoints.
    pub component_name: String,
    pub stride_category: StrideCategory,
    pub description: String,
    pub impact: Impact,
    pub likelihood: Likelihood,
}

/// How hard exploitation of a step is to spot in monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectionDifficulty {
    Easy,
    Medium,
    Hard,
}

impl DetectionDifficulty {
    /// Derived from the STRIDE category of the attached threat.
    /// Repudiation, disclosure, and privilege escalation leave the
    /// thinnest audit trail; denial of service is inherently loud.
    pub fn from_stride(category: StrideCategory) -> Self {
        match category {
            StrideCategory::Repudiation
            | StrideCategory::InformationDisclosure
            | StrideCategory::ElevationOfPrivilege => Self::Hard,
            StrideCategory::Spoofing | StrideCategory::Tampering => Self::Medium,
            StrideCategory::DenialOfService => Self::Easy,
        }
    }
}

/// Qualitative likelihood tier for an entire attack path, distinct from
/// per-threat likelihood. Defaults to Realistic until enrichment says
/// otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feasibility {
    Theoretical,
    Realistic,
    HighlyLikely,
}

impl Feasibility {
    pub fn weight(&self) -> u32 {
        match self {
            Self::HighlyLikely => 3,
            Self::Realistic => 2,
            Self::Theoretical => 1,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace([' ', '_', '-'], "").as_str() {
            "theoretical" => Some(Self::Theoretical),
            "realistic" => Some(Self::Realistic),
            "highlylikely" => Some(Self::HighlyLikely),
            _ => None,
        }
    }
}

impl Default for Feasibility {
    fn default() -> Self {
        Self::Realistic
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathComplexity {
    Low,
    Medium,
    High,
}

impl PathComplexity {
    /// Pre-enrichment default, from step count alone.
    pub fn from_step_count(steps: usize) -> Self {
        match steps {
            0..=2 => Self::Low,
            3..=4 => Self::Medium,
            _ => Self::High,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Access an attacker needs before attempting a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequiredAccess {
    /// First hop: reachable without any prior compromise.
    External,
    /// Mid-path: a foothold on the previous component.
    Foothold,
    /// Final hop onto the target asset.
    Privileged,
}

/// One hop of an attack path, tied to the single most relevant threat
/// at that component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackStep {
    /// 1-based, strictly increasing within a path.
    pub position: usize,
    pub component: String,
    pub threat_id: String,
    pub stride_category: StrideCategory,
    pub description: String,
    pub required_access: RequiredAccess,
    pub detection_difficulty: DetectionDifficulty,
}

/// Enrichment annotations attached to a path by the external narrative
/// collaborator. Never structurally alters the path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathNarrative {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attacker_profile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_compromise: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_chokepoints: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub detection_opportunities: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_resources: Vec<String>,
}

/// A complete multi-step attack chain from an entry point to a target
/// asset. Built once, optionally annotated by enrichment, then read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackPath {
    /// First 8 hex chars of a content hash of the component sequence.
    pub path_id: String,
    pub entry_point: String,
    pub target_asset: String,
    pub steps: Vec<AttackStep>,
    pub total_steps: usize,
    pub combined_impact: Impact,
    pub combined_likelihood: Likelihood,
    pub feasibility: Feasibility,
    pub complexity: PathComplexity,
    #[serde(default)]
    pub narrative: PathNarrative,
}

impl AttackPath {
    /// Ranking weight: worst-case impact scaled by weakest-link
    /// likelihood and path feasibility.
    pub fn risk_weight(&self) -> u32 {
        self.combined_impact.weight()
            * self.combined_likelihood.rank() as u32
            * self.feasibility.weight()
    }

    /// Weight used when accumulating defense priorities.
    pub fn defense_weight(&self) -> u32 {
        self.feasibility.weight() * self.combined_impact.weight()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriorityTier {
    High,
    Medium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefenseKind {
    Chokepoint,
    ComponentHardening,
    DetectionEnhancement,
}

/// A ranked defensive recommendation derived from the weighted paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefensePriority {
    pub kind: DefenseKind,
    pub recommendation: String,
    pub weighted_score: u32,
    pub priority_tier: PriorityTier,
}

/// What fraction of the threat inventory the emitted paths exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatCoverage {
    pub covered_threats: usize,
    pub total_threats: usize,
    pub coverage_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub engine_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    pub component_count: usize,
    pub flow_count: usize,
    /// Flows dropped for referencing an undeclared component.
    pub dropped_flows: usize,
    pub raw_path_count: usize,
    pub analysis_duration_ms: u64,
    /// Set for degraded or empty results; absent on full success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Opaque blob from the optional cross-project insight store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_store_insights: Option<serde_json::Value>,
}

/// Final report produced by the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub attack_paths: Vec<AttackPath>,
    pub critical_scenarios: Vec<AttackPath>,
    pub defense_priorities: Vec<DefensePriority>,
    pub threat_coverage: Option<ThreatCoverage>,
    pub metadata: AnalysisMetadata,
}

impl Default for AnalysisMetadata {
    fn default() -> Self {
        Self {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: None,
            component_count: 0,
            flow_count: 0,
            dropped_flows: 0,
            raw_path_count: 0,
            analysis_duration_ms: 0,
            error: None,
            vector_store_insights: None,
        }
    }
}
