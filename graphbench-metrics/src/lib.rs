pub mod failures;
pub mod histogram;

pub use failures::{FailureGroup, FailureGroups};
pub use histogram::{Error, LatencyHistogram, LatencySummary, Result};
