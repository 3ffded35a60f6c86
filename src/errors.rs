//! Engine error taxonomy.
//!
//! Only `Input` aborts a run. Everything else degrades: dangling flow
//! endpoints are dropped with a warning, an empty analysis returns a
//! valid result with `metadata.error` set, and collaborator failures
//! leave paths unenriched or the insights section absent.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Missing or unparsable graph/threat input. Fatal.
    #[error("invalid input: {message}")]
    Input {
        message: String,
        path: Option<PathBuf>,
    },

    /// A data flow referenced an undeclared component. Recoverable;
    /// the edge is dropped and logged, never returned to callers of
    /// the orchestrator.
    #[error("graph inconsistency: flow {flow_source} -> {destination} references an unknown component")]
    GraphInconsistency {
        flow_source: String,
        destination: String,
    },

    /// No entry points, no target assets, or zero surviving paths.
    /// Recoverable; the orchestrator converts this into the empty-state
    /// result rather than propagating it.
    #[error("no viable analysis: {0}")]
    NoViableAnalysis(String),

    /// Narrative enrichment failed for one path. Recoverable; the path
    /// is kept unenriched.
    #[error("enrichment failed for path {path_id}: {message}")]
    Enrichment { path_id: String, message: String },

    /// The optional insight store was unreachable. Recoverable; the
    /// insights section is omitted.
    #[error("collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),
}

impl EngineError {
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
            path: None,
        }
    }

    pub fn input_at(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Input {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// True for the one variant that should abort the run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Input { .. })
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_input_errors_are_fatal() {
        assert!(EngineError::input("bad json").is_fatal());
        assert!(!EngineError::NoViableAnalysis("no entry points".into()).is_fatal());
        assert!(!EngineError::CollaboratorUnavailable("vector store down".into()).is_fatal());
        assert!(!EngineError::Enrichment {
            path_id: "abcd1234".into(),
            message: "timeout".into()
        }
        .is_fatal());
    }

    #[test]
    fn messages_name_the_offending_flow() {
        let err = EngineError::GraphInconsistency {
            flow_source: "WebServer".into(),
            destination: "Ghost".into(),
        };
        assert!(err.to_string().contains("WebServer -> Ghost"));
    }
}
