use std::sync::Arc;
use std::time::{Duration, SystemTime};

use graphbench_driver::{Connection, Driver, normalize_signature};
use graphbench_metrics::{FailureGroups, LatencyHistogram};
use graphbench_script::{Client, Transaction};
use tokio::time::Instant;

use crate::pacing::Pacing;
use crate::stop::StopSignal;

/// What one worker hands back when it is done.
#[derive(Debug, Clone)]
pub struct WorkerResult {
    pub index: usize,
    pub succeeded: u64,
    pub failed: u64,
    /// Successful transactions per second over [`active`](Self::active).
    pub rate: f64,
    pub active: Duration,
    pub histogram: LatencyHistogram,
    pub failures: FailureGroups,
    /// Set when the worker aborted on a fatal error; its numbers are then left out of the merge.
    pub error: Option<String>,
}

impl WorkerResult {
    pub(crate) fn crashed(index: usize, error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::idle(index)
        }
    }

    /// A worker that never got to run a transaction.
    pub(crate) fn idle(index: usize) -> Self {
        Self {
            index,
            succeeded: 0,
            failed: 0,
            rate: 0.0,
            active: Duration::ZERO,
            histogram: LatencyHistogram::new(),
            failures: FailureGroups::new(),
            error: None,
        }
    }
}

#[derive(Debug, Default)]
struct Tally {
    succeeded: u64,
    failed: u64,
    histogram: LatencyHistogram,
    failures: FailureGroups,
}

impl Tally {
    fn fail(&mut self, worker: usize, message: &str) {
        self.failed += 1;
        let signature = normalize_signature(message);
        if self.failures.record(&signature, SystemTime::now()) {
            tracing::debug!(worker, %signature, "new failure group");
        }
    }
}

/// Connects, then runs `client` until `stop` is raised or the connection fails fatally.
///
/// Open-loop slots are counted from `started`, the run's start, so time spent connecting is
/// charged to the first transactions. A fatal error raises `stop` for every other worker as well.
pub(crate) async fn run<D: Driver>(
    index: usize,
    driver: Arc<D>,
    client: Client,
    pacing: Pacing,
    started: Instant,
    stop: Arc<StopSignal>,
) -> WorkerResult {
    let connected = tokio::select! {
        biased;
        () = stop.stopped() => return WorkerResult::idle(index),
        res = driver.connect() => res,
    };
    let connection = match connected {
        Ok(c) => c,
        Err(err) => {
            tracing::warn!(worker = index, error = %err, "failed to connect");
            stop.stop();
            return WorkerResult::crashed(index, err.to_string());
        }
    };
    drive(index, connection, client, pacing, started, &stop).await
}

async fn drive<C: Connection>(
    index: usize,
    mut connection: C,
    mut client: Client,
    pacing: Pacing,
    started: Instant,
    stop: &StopSignal,
) -> WorkerResult {
    let mut schedule = pacing.schedule(started);
    let mut tally = Tally::default();

    let error = loop {
        if stop.is_stopped() {
            break None;
        }

        // Latency is measured from the slot, so time spent behind schedule is counted.
        let due = match schedule.next_slot() {
            Some(at) => {
                tokio::select! {
                    biased;
                    () = stop.stopped() => break None,
                    () = tokio::time::sleep_until(at) => {}
                }
                at
            }
            None => Instant::now(),
        };

        let queries = match client.next_transaction() {
            Ok(Transaction::Queries(queries)) => queries,
            Ok(Transaction::Sleep(pause)) => {
                tokio::select! {
                    biased;
                    () = stop.stopped() => break None,
                    () = tokio::time::sleep(pause) => {}
                }
                continue;
            }
            Err(err) => {
                tally.fail(index, &err.to_string());
                tokio::task::yield_now().await;
                continue;
            }
        };
        if queries.is_empty() {
            tokio::task::yield_now().await;
            continue;
        }

        let outcome = tokio::select! {
            biased;
            () = stop.stopped() => break None,
            res = connection.execute(&queries) => res,
        };
        match outcome {
            Ok(_) => {
                tally.succeeded += 1;
                tally.histogram.record(due.elapsed());
            }
            Err(err) if err.is_fatal() => {
                tracing::warn!(worker = index, error = %err, "worker aborted");
                stop.stop();
                break Some(err.to_string());
            }
            Err(err) => tally.fail(index, &err.signature()),
        }
    };

    drop(connection);

    let active = started.elapsed();
    let rate = if active.is_zero() {
        0.0
    } else {
        tally.succeeded as f64 / active.as_secs_f64()
    };
    WorkerResult {
        index,
        succeeded: tally.succeeded,
        failed: tally.failed,
        rate,
        active,
        histogram: tally.histogram,
        failures: tally.failures,
        error,
    }
}
