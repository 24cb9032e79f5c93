#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use graphbench_core::{BenchConfig, Mode};
use graphbench_driver::{Connection, Driver, DriverError, EncryptionMode, TxOutcome};
use graphbench_script::{QueryRequest, ScriptSet, WorkloadSpec, parse};
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct Call {
    pub connection: usize,
    pub at: Instant,
    pub text: String,
}

/// Decides the outcome of the `call`-th execute (0-based) on `connection`.
pub type Behavior = fn(connection: usize, call: usize) -> Result<(), DriverError>;

/// In-memory driver: every execute takes `latency` of (virtual) time and is logged.
pub struct MockDriver {
    next_connection: AtomicUsize,
    calls: Arc<Mutex<Vec<Call>>>,
    latency: Duration,
    behavior: Behavior,
    refuse_connect: bool,
}

impl MockDriver {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            next_connection: AtomicUsize::new(0),
            calls: Arc::new(Mutex::new(Vec::new())),
            latency: Duration::from_millis(1),
            behavior,
            refuse_connect: false,
        }
    }

    pub fn healthy() -> Self {
        Self::new(|_, _| Ok(()))
    }

    pub fn refusing() -> Self {
        Self {
            refuse_connect: true,
            ..Self::healthy()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn calls_on(&self, connection: usize) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.connection == connection)
            .collect()
    }
}

impl Driver for MockDriver {
    type Connection = MockConnection;

    async fn connect(&self) -> Result<MockConnection, DriverError> {
        if self.refuse_connect {
            return Err(DriverError::Connect("connection refused".to_string()));
        }
        Ok(MockConnection {
            id: self.next_connection.fetch_add(1, Ordering::Relaxed),
            executed: 0,
            calls: self.calls.clone(),
            latency: self.latency,
            behavior: self.behavior,
        })
    }
}

pub struct MockConnection {
    id: usize,
    executed: usize,
    calls: Arc<Mutex<Vec<Call>>>,
    latency: Duration,
    behavior: Behavior,
}

impl Connection for MockConnection {
    async fn execute(&mut self, queries: &[QueryRequest]) -> Result<TxOutcome, DriverError> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Call {
                connection: self.id,
                at: Instant::now(),
                text: queries.iter().map(|q| &*q.text).collect::<Vec<_>>().join(" "),
            });
        let call = self.executed;
        self.executed += 1;
        tokio::time::sleep(self.latency).await;
        (self.behavior)(self.id, call).map(|()| TxOutcome {
            rows: queries.len() as u64,
        })
    }
}

pub fn syntax_error() -> DriverError {
    DriverError::Database {
        code: "Neo.ClientError.Statement.SyntaxError".to_string(),
        message: "Invalid input 'X'".to_string(),
    }
}

pub fn config(script: &str, clients: usize, duration: Duration, mode: Mode) -> BenchConfig {
    let parsed = parse("inline", script, 1).unwrap_or_else(|e| panic!("{e}"));
    BenchConfig {
        scripts: Arc::new(ScriptSet::new(vec![parsed]).unwrap_or_else(|e| panic!("{e}"))),
        workloads: vec![WorkloadSpec {
            source: "inline".to_string(),
            weight: 1,
        }],
        defines: Vec::new(),
        clients,
        scale: 1,
        duration,
        mode,
        encryption: EncryptionMode::Auto,
        init: false,
        seed: 42,
    }
}
