pub mod centrality;
pub mod critical_assets;
pub mod entry_points;

pub use centrality::{BetweennessCentrality, CentralityStrategy, NoopCentrality};
pub use critical_assets::{score_critical_assets, CriticalAssetScorer};
pub use entry_points::{score_entry_points, ScoredCandidate};
