pub mod latest;
pub mod stats;

pub use latest::LatestRunsResponse;
pub use stats::{SourceStats, StatsResponse};
