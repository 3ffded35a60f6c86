//! Input ingestion.
//!
//! The two JSON inputs arrive shaped but untrusted: optional fields may
//! be absent and enum-valued strings may be garbage. All defaults are
//! resolved here, once, so the scoring and path algorithms downstream
//! never do defensive lookups.

use log::warn;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::core::{DataFlow, Impact, Likelihood, StrideCategory, Threat};
use crate::errors::{EngineError, EngineResult};
use crate::graph::builder::resolve_bidirectional;

/// The DFD as produced by the generator collaborator.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DfdModel {
    #[serde(default)]
    pub external_entities: Vec<String>,
    #[serde(default)]
    pub processes: Vec<String>,
    #[serde(default)]
    pub assets: Vec<String>,
    #[serde(default)]
    pub data_flows: Vec<RawDataFlow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawDataFlow {
    pub source: String,
    pub destination: String,
    #[serde(default = "default_classification")]
    pub data_classification: String,
    #[serde(default = "default_unspecified")]
    pub protocol: String,
    #[serde(default = "default_unspecified", alias = "auth_mechanism")]
    pub authentication_mechanism: String,
    /// Absent means "use the configured default".
    #[serde(default)]
    pub bidirectional: Option<bool>,
}

fn default_classification() -> String {
    "Unclassified".to_string()
}

fn default_unspecified() -> String {
    "unspecified".to_string()
}

/// One threat inventory record. Unknown extra fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ThreatRecord {
    #[serde(default)]
    pub threat_id: Option<String>,
    pub component_name: String,
    #[serde(default)]
    pub stride_category: String,
    #[serde(default, alias = "description")]
    pub threat_description: String,
    #[serde(default)]
    pub impact: String,
    #[serde(default)]
    pub likelihood: String,
}

impl DfdModel {
    pub fn load(path: &Path) -> EngineResult<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| EngineError::input_at(format!("cannot read DFD model: {e}"), path))?;
        serde_json::from_str(&raw)
            .map_err(|e| EngineError::input_at(format!("cannot parse DFD model: {e}"), path))
    }

    /// Resolve raw flows into the typed model, filling the configured
    /// bidirectional default.
    pub fn resolve_flows(&self, bidirectional_default: bool) -> Vec<DataFlow> {
        self.data_flows
            .iter()
            .map(|raw| DataFlow {
                source: raw.source.clone(),
                destination: raw.destination.clone(),
                data_classification: raw.data_classification.clone(),
                protocol: raw.protocol.clone(),
                auth_mechanism: raw.authentication_mechanism.clone(),
                bidirectional: resolve_bidirectional(raw.bidirectional, bidirectional_default),
            })
            .collect()
    }
}

pub fn load_threat_records(path: &Path) -> EngineResult<Vec<ThreatRecord>> {
    let raw = fs::read_to_string(path)
        .map_err(|e| EngineError::input_at(format!("cannot read threat list: {e}"), path))?;
    serde_json::from_str(&raw)
        .map_err(|e| EngineError::input_at(format!("cannot parse threat list: {e}"), path))
}

/// Resolve raw records into typed threats. Missing ids are assigned
/// (`T-<n>` in declaration order); unparsable impact/likelihood fall
/// back to Medium; a record with an unparsable STRIDE category is
/// skipped with a warning since positional scoring cannot place it.
pub fn resolve_threats(records: &[ThreatRecord]) -> Vec<Threat> {
    records
        .iter()
        .enumerate()
        .filter_map(|(i, record)| {
            let Some(stride_category) = StrideCategory::parse(&record.stride_category) else {
                warn!(
                    "skipping threat record {} ({:?}): unrecognized STRIDE category {:?}",
                    i + 1,
                    record.component_name,
                    record.stride_category
                );
                return None;
            };
            let threat_id = record
                .threat_id
                .clone()
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| format!("T-{}", i + 1));
            let impact = Impact::parse(&record.impact).unwrap_or(Impact::Medium);
            let likelihood = Likelihood::parse(&record.likelihood).unwrap_or(Likelihood::Medium);
            Some(Threat {
                threat_id,
                component_name: record.component_name.clone(),
                stride_category,
                description: record.threat_description.clone(),
                impact,
                likelihood,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_parses_with_missing_optional_fields() {
        let json = r#"{
            "external_entities": ["User"],
            "processes": ["WebServer"],
            "assets": ["CustomerDB"],
            "data_flows": [
                {"source": "User", "destination": "WebServer"}
            ]
        }"#;
        let model: DfdModel = serde_json::from_str(json).unwrap();
        let flows = model.resolve_flows(true);
        assert_eq!(flows.len(), 1);
        assert!(flows[0].bidirectional);
        assert_eq!(flows[0].data_classification, "Unclassified");
        assert_eq!(flows[0].protocol, "unspecified");
    }

    #[test]
    fn explicit_bidirectional_overrides_default() {
        let json = r#"{
            "data_flows": [
                {"source": "A", "destination": "B", "bidirectional": false}
            ]
        }"#;
        let model: DfdModel = serde_json::from_str(json).unwrap();
        let flows = model.resolve_flows(true);
        assert!(!flows[0].bidirectional);
    }

    #[test]
    fn threat_ids_are_assigned_in_declaration_order() {
        let records = vec![
            ThreatRecord {
                threat_id: None,
                component_name: "User to WebServer".into(),
                stride_category: "S".into(),
                threat_description: "spoofing".into(),
                impact: "High".into(),
                likelihood: "Medium".into(),
            },
            ThreatRecord {
                threat_id: Some("CUSTOM-9".into()),
                component_name: "WebServer".into(),
                stride_category: "T".into(),
                threat_description: "tampering".into(),
                impact: "Critical".into(),
                likelihood: "Medium".into(),
            },
        ];
        let threats = resolve_threats(&records);
        assert_eq!(threats[0].threat_id, "T-1");
        assert_eq!(threats[1].threat_id, "CUSTOM-9");
    }

    #[test]
    fn garbage_enums_degrade_not_crash() {
        let records = vec![
            ThreatRecord {
                threat_id: None,
                component_name: "WebServer".into(),
                stride_category: "???".into(),
                threat_description: String::new(),
                impact: "High".into(),
                likelihood: "Medium".into(),
            },
            ThreatRecord {
                threat_id: None,
                component_name: "WebServer".into(),
                stride_category: "Tampering".into(),
                threat_description: String::new(),
                impact: "catastrophic".into(),
                likelihood: "certain".into(),
            },
        ];
        let threats = resolve_threats(&records);
        // First record skipped; second degrades to Medium/Medium.
        assert_eq!(threats.len(), 1);
        assert_eq!(threats[0].impact, Impact::Medium);
        assert_eq!(threats[0].likelihood, Likelihood::Medium);
    }

    #[test]
    fn record_extra_fields_are_ignored() {
        let json = r#"[{
            "threat_id": "T1",
            "component_name": "WebServer",
            "stride_category": "T",
            "threat_description": "tamper",
            "impact": "High",
            "likelihood": "Low",
            "mitigation": "input validation",
            "cvss": 8.1
        }]"#;
        let records: Vec<ThreatRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records.len(), 1);
        let threats = resolve_threats(&records);
        assert_eq!(threats[0].impact, Impact::High);
    }
}
