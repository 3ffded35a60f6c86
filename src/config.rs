//! Engine configuration.
//!
//! Every knob has a serde default so a partial `attackmap.toml` (or a
//! partial JSON blob from a caller) fills in the rest. Loaded once;
//! stages receive `&AnalysisConfig` and never mutate it.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::errors::{EngineError, EngineResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Maximum components in any enumerated path, BFS and DFS alike.
    #[serde(default = "default_max_path_length")]
    pub max_path_length: usize,

    /// DFS paths kept per (entry, target) pair beyond the BFS shortest.
    #[serde(default = "default_max_paths_per_pair")]
    pub max_paths_per_pair: usize,

    /// Cap on ranked entry-point candidates handed to the path finder.
    #[serde(default = "default_max_entry_points")]
    pub max_entry_points: usize,

    /// Cap on ranked target-asset candidates handed to the path finder.
    #[serde(default = "default_max_target_assets")]
    pub max_target_assets: usize,

    /// The external entity treated as the primary user of the system.
    /// Defaults to the first declared external entity when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_entity: Option<String>,

    /// Reverse-edge behavior when a flow omits `bidirectional`.
    /// DFD flows usually describe request/response conversations, so
    /// the default is true.
    #[serde(default = "default_bidirectional")]
    pub bidirectional_default: bool,

    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Concurrent in-flight enrichment calls.
    #[serde(default = "default_enrichment_concurrency")]
    pub concurrency: usize,

    /// Per-call timeout in milliseconds.
    #[serde(default = "default_enrichment_timeout_ms")]
    pub timeout_ms: u64,

    /// Attempts per path, including the first.
    #[serde(default = "default_enrichment_attempts")]
    pub max_attempts: usize,

    /// Initial backoff in milliseconds; doubles per retry.
    #[serde(default = "default_enrichment_backoff_ms")]
    pub backoff_base_ms: u64,
}

fn default_max_path_length() -> usize {
    6
}

fn default_max_paths_per_pair() -> usize {
    3
}

fn default_max_entry_points() -> usize {
    8
}

fn default_max_target_assets() -> usize {
    8
}

fn default_bidirectional() -> bool {
    true
}

fn default_enrichment_concurrency() -> usize {
    5
}

fn default_enrichment_timeout_ms() -> u64 {
    10_000
}

fn default_enrichment_attempts() -> usize {
    3
}

fn default_enrichment_backoff_ms() -> u64 {
    250
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_path_length: default_max_path_length(),
            max_paths_per_pair: default_max_paths_per_pair(),
            max_entry_points: default_max_entry_points(),
            max_target_assets: default_max_target_assets(),
            primary_entity: None,
            bidirectional_default: default_bidirectional(),
            enrichment: EnrichmentConfig::default(),
        }
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            concurrency: default_enrichment_concurrency(),
            timeout_ms: default_enrichment_timeout_ms(),
            max_attempts: default_enrichment_attempts(),
            backoff_base_ms: default_enrichment_backoff_ms(),
        }
    }
}

impl AnalysisConfig {
    pub fn load(path: &Path) -> EngineResult<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            EngineError::input_at(format!("cannot read config: {e}"), path)
        })?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| EngineError::input_at(format!("cannot parse config: {e}"), path))?;
        config.validate()?;
        Ok(config)
    }

    /// Zero-valued bounds would silently disable whole stages, so
    /// reject them up front.
    pub fn validate(&self) -> EngineResult<()> {
        if self.max_path_length < 2 {
            return Err(EngineError::input(
                "max_path_length must be at least 2 (a path needs two components)",
            ));
        }
        if self.max_paths_per_pair == 0 {
            return Err(EngineError::input("max_paths_per_pair must be positive"));
        }
        if self.max_entry_points == 0 || self.max_target_assets == 0 {
            return Err(EngineError::input("candidate caps must be positive"));
        }
        if self.enrichment.concurrency == 0 || self.enrichment.max_attempts == 0 {
            return Err(EngineError::input(
                "enrichment concurrency and max_attempts must be positive",
            ));
        }
        Ok(())
    }
}
