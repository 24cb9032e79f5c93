use graphbench_metrics::{FailureGroups, LatencyHistogram};

use crate::error::{Error, Result};
use crate::worker::WorkerResult;

/// Aggregate of every worker that finished without a fatal error.
#[derive(Debug, Clone)]
pub struct BenchResult {
    pub scenario: String,
    pub succeeded: u64,
    pub failed: u64,
    /// Sum of the per-worker rates.
    pub rate: f64,
    pub histogram: LatencyHistogram,
    pub failures: FailureGroups,
    /// Raw per-worker results, including the ones that failed.
    pub workers: Vec<WorkerResult>,
}

impl BenchResult {
    /// Folds worker results together. Fails only if no worker finished cleanly.
    pub fn merge(scenario: String, workers: Vec<WorkerResult>) -> Result<Self> {
        let healthy: Vec<&WorkerResult> = workers.iter().filter(|w| w.error.is_none()).collect();
        if healthy.is_empty() {
            let first = workers
                .iter()
                .find_map(|w| w.error.clone())
                .unwrap_or_else(|| "no workers ran".to_string());
            return Err(Error::AllWorkersFailed {
                workers: workers.len(),
                first,
            });
        }

        let histogram = LatencyHistogram::merged(healthy.iter().map(|w| &w.histogram))?;
        let mut failures = FailureGroups::new();
        let (mut succeeded, mut failed, mut rate) = (0u64, 0u64, 0.0f64);
        for w in &healthy {
            succeeded += w.succeeded;
            failed += w.failed;
            rate += w.rate;
            failures.merge(&w.failures);
        }

        Ok(Self {
            scenario,
            succeeded,
            failed,
            rate,
            histogram,
            failures,
            workers,
        })
    }

    /// Workers that aborted, with their error.
    pub fn crashed(&self) -> impl Iterator<Item = (usize, &str)> {
        self.workers
            .iter()
            .filter_map(|w| w.error.as_deref().map(|e| (w.index, e)))
    }
}
