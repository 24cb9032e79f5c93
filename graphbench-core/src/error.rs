use graphbench_driver::DriverError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("`clients` must be a positive integer")]
    InvalidClients,

    #[error("`duration` must be a positive duration")]
    InvalidDuration,

    #[error("`rate` must be a positive number of transactions per second (got {0})")]
    InvalidRate(f64),

    #[error("`scale` must be a positive integer to initialize a dataset (got {0})")]
    InvalidScale(i64),

    #[error("dataset initialization failed during {step}: {source}")]
    Init {
        step: &'static str,
        #[source]
        source: DriverError,
    },

    #[error(transparent)]
    Metrics(#[from] graphbench_metrics::Error),

    #[error("all {workers} workers failed; first error: {first}")]
    AllWorkersFailed { workers: usize, first: String },
}
