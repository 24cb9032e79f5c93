//! Benchmark execution: configuration, workers, pacing, result merging and dataset setup.

mod config;
mod error;
mod init;
mod pacing;
mod progress;
mod result;
mod run;
mod stop;
mod worker;

pub use config::{BenchConfig, Mode};
pub use error::{Error, Result};
pub use init::{
    ACCOUNTS_PER_BRANCH, BATCH_SIZE, TELLERS_PER_BRANCH, init_tpcb_dataset, initialize,
};
pub use pacing::Pacing;
pub use progress::{ProgressFn, ProgressReport};
pub use result::BenchResult;
pub use run::run_benchmark;
pub use stop::StopSignal;
pub use worker::WorkerResult;
