use std::sync::Arc;
use std::time::Duration;

use graphbench_driver::Driver;
use graphbench_script::Client;
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::BenchConfig;
use crate::error::Result;
use crate::pacing::Pacing;
use crate::progress::{ProgressFn, ProgressReport, report};
use crate::result::BenchResult;
use crate::stop::StopSignal;
use crate::worker::{self, WorkerResult};

const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// Runs one benchmark: `config.clients` workers for `config.duration`, or until `stop` is raised.
///
/// `stop` is shared with the caller so that Ctrl-C can end the run early; the deadline and any
/// fatal worker error raise the same signal. Every worker is joined before this returns.
pub async fn run_benchmark<D: Driver>(
    config: &BenchConfig,
    driver: Arc<D>,
    stop: Arc<StopSignal>,
    progress: Option<ProgressFn>,
) -> Result<BenchResult> {
    config.validate()?;
    let pacing = Pacing::for_mode(config.mode, config.clients)?;
    let globals = config.globals();

    tracing::info!(
        clients = config.clients,
        duration = ?config.duration,
        mode = %config.mode,
        "starting benchmark"
    );

    let started = Instant::now();
    let mut handles = Vec::with_capacity(config.clients);
    for index in 0..config.clients {
        let client = Client::new(
            config.scripts.clone(),
            &globals,
            config.seed.wrapping_add(index as u64),
        );
        handles.push(tokio::spawn(worker::run(
            index,
            driver.clone(),
            client,
            pacing,
            started,
            stop.clone(),
        )));
    }

    report(progress.as_ref(), ProgressReport::new("benchmark", "run", 0.0));
    await_completion(&stop, started, config.duration, progress.as_ref()).await;
    stop.stop();
    report(progress.as_ref(), ProgressReport::new("benchmark", "stopping", 0.0));

    let mut workers = Vec::with_capacity(handles.len());
    for (index, handle) in handles.into_iter().enumerate() {
        workers.push(match handle.await {
            Ok(result) => result,
            Err(err) => WorkerResult::crashed(index, format!("worker task failed: {err}")),
        });
    }

    tracing::info!(workers = workers.len(), "all workers joined");
    BenchResult::merge(config.describe_scenario(), workers)
}

/// Waits for the deadline or an early stop, reporting progress along the way.
async fn await_completion(
    stop: &StopSignal,
    started: Instant,
    duration: Duration,
    progress: Option<&ProgressFn>,
) {
    let deadline = started + duration;
    let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = stop.stopped() => return,
            () = tokio::time::sleep_until(deadline) => return,
            _ = ticker.tick(), if progress.is_some() => {
                let fraction = started.elapsed().as_secs_f64() / duration.as_secs_f64();
                report(progress, ProgressReport::new("benchmark", "run", fraction));
            }
        }
    }
}
