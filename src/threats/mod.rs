pub mod attacher;

pub use attacher::{attach_threats, build_threat_index, ThreatIndex};
