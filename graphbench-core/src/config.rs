use std::sync::Arc;
use std::time::Duration;

use graphbench_driver::EncryptionMode;
use graphbench_script::{Environment, ScriptSet, Value, WorkloadSpec, uses_tpcb_dataset};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Mode {
    /// Closed loop: every worker submits its next transaction as soon as the last one returns.
    Throughput,
    /// Open loop at `rate` transactions per second, summed over all workers.
    Latency { rate: f64 },
}

/// Everything a run needs, fixed before the first worker starts.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub scripts: Arc<ScriptSet>,
    /// The `-w` arguments the scripts were loaded from, in order.
    pub workloads: Vec<WorkloadSpec>,
    /// `-D` definitions; applied after `scale`, so they may override it.
    pub defines: Vec<(String, Value)>,
    pub clients: usize,
    pub scale: i64,
    pub duration: Duration,
    pub mode: Mode,
    pub encryption: EncryptionMode,
    pub init: bool,
    /// Worker `i` seeds its RNG with `seed + i`.
    pub seed: u64,
}

impl BenchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.clients == 0 {
            return Err(Error::InvalidClients);
        }
        if self.duration.is_zero() {
            return Err(Error::InvalidDuration);
        }
        if let Mode::Latency { rate } = self.mode
            && (!rate.is_finite() || rate <= 0.0)
        {
            return Err(Error::InvalidRate(rate));
        }
        Ok(())
    }

    /// Variables every client starts with.
    #[must_use]
    pub fn globals(&self) -> Environment {
        let mut env = Environment::new();
        env.set("scale", Value::Int(self.scale));
        for (name, value) in &self.defines {
            env.set(name.as_str(), value.clone());
        }
        env
    }

    #[must_use]
    pub fn needs_dataset(&self) -> bool {
        self.workloads.iter().any(|w| uses_tpcb_dataset(&w.source))
    }

    /// Command-line style summary of the effective settings, e.g.
    /// ` -w builtin:tpcb-like -c 4 -s 1 -d 60 -e auto`.
    #[must_use]
    pub fn describe_scenario(&self) -> String {
        let mut out: String = self.workloads.iter().map(|w| format!(" -w {w}")).collect();
        out.push_str(&format!(" -c {} -s {}", self.clients, self.scale));
        if self.duration.subsec_nanos() == 0 {
            out.push_str(&format!(" -d {}", self.duration.as_secs()));
        } else {
            out.push_str(&format!(" -d {}ms", self.duration.as_millis()));
        }
        out.push_str(&format!(" -e {}", self.encryption));
        if let Mode::Latency { rate } = self.mode {
            out.push_str(&format!(" -l -r {rate}"));
        }
        if self.init {
            out.push_str(" -i");
        }
        out
    }
}
