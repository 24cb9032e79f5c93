use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context as _;
use graphbench_core::{BenchConfig, Mode, StopSignal, initialize, run_benchmark};
use graphbench_driver::{ConnectOptions, HttpDriver};
use graphbench_script::{ScriptSet, load_script};

use crate::cli::Cli;
use crate::exit_codes::ExitCode;
use crate::output;
use crate::run_error::RunError;

pub async fn run(cli: Cli) -> Result<ExitCode, RunError> {
    let config = bench_config(&cli)?;
    let driver = HttpDriver::new(&connect_options(&cli))
        .context("invalid connection settings")
        .map_err(RunError::InvalidInput)?;
    tracing::debug!(endpoint = %driver.endpoint(), "driver ready");

    let out = output::formatter(cli.output);
    out.print_header(&config);
    let progress = out.progress();

    if config.init {
        initialize(&config, &driver, progress.as_ref())
            .await
            .context("failed to initialize dataset")
            .map_err(RunError::RuntimeError)?;
    }

    let stop = Arc::new(StopSignal::new());
    let interrupt = {
        let stop = stop.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupted; stopping workers");
                stop.stop();
            }
        })
    };

    let outcome = run_benchmark(&config, Arc::new(driver), stop, progress).await;
    interrupt.abort();

    let result = match outcome {
        Ok(result) => result,
        Err(err @ graphbench_core::Error::AllWorkersFailed { .. }) => {
            return Err(RunError::NoUsableResults(err.into()));
        }
        Err(err) => return Err(RunError::RuntimeError(err.into())),
    };

    for (index, error) in result.crashed() {
        out.error(&format!("worker {index} crashed: {error}"));
    }
    out.print_result(&result, config.mode)
        .map_err(RunError::RuntimeError)?;

    Ok(ExitCode::Success)
}

fn bench_config(cli: &Cli) -> Result<BenchConfig, RunError> {
    let mut scripts = Vec::with_capacity(cli.workloads.len());
    for spec in &cli.workloads {
        let script = load_script(spec)
            .with_context(|| format!("failed to load workload `{spec}`"))
            .map_err(RunError::ScriptError)?;
        scripts.push(script);
    }
    let scripts = ScriptSet::new(scripts)
        .context("invalid workload mix")
        .map_err(RunError::ScriptError)?;

    let config = BenchConfig {
        scripts: Arc::new(scripts),
        workloads: cli.workloads.clone(),
        defines: cli.defines.clone(),
        clients: cli.clients,
        scale: cli.scale,
        duration: cli.duration,
        mode: if cli.latency {
            Mode::Latency { rate: cli.rate }
        } else {
            Mode::Throughput
        },
        encryption: cli.encryption,
        init: cli.init,
        seed: cli.seed.unwrap_or_else(clock_seed),
    };
    config
        .validate()
        .context("invalid benchmark settings")
        .map_err(RunError::InvalidInput)?;
    Ok(config)
}

fn connect_options(cli: &Cli) -> ConnectOptions {
    let mut opts = ConnectOptions::new(cli.address.clone())
        .with_credentials(cli.user.clone(), cli.password.clone());
    opts.database = cli.database.clone();
    opts.encryption = cli.encryption;
    opts
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}
