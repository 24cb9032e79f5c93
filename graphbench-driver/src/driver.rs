use std::future::Future;

use graphbench_value::QueryRequest;

use crate::error::DriverError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxOutcome {
    pub rows: u64,
}

/// Shared, thread-safe factory for per-worker connections.
pub trait Driver: Send + Sync + 'static {
    type Connection: Connection;

    /// Opens a session. Failures here are always fatal for the caller.
    fn connect(&self) -> impl Future<Output = Result<Self::Connection, DriverError>> + Send;
}

/// A single session, owned by exactly one worker.
pub trait Connection: Send + 'static {
    /// Runs `queries` as one logical transaction.
    fn execute(
        &mut self,
        queries: &[QueryRequest],
    ) -> impl Future<Output = Result<TxOutcome, DriverError>> + Send;
}
