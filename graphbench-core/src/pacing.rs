use std::time::Duration;

use tokio::time::Instant;

use crate::config::Mode;
use crate::error::{Error, Result};

/// How a worker spaces its transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Next transaction as soon as the previous one returns.
    Closed,
    /// Transaction `k` is due at `start + k * interval`, regardless of how long earlier ones took.
    Open { interval: Duration },
}

impl Pacing {
    /// Splits the total target rate evenly across `clients` workers.
    pub fn for_mode(mode: Mode, clients: usize) -> Result<Self> {
        match mode {
            Mode::Throughput => Ok(Self::Closed),
            Mode::Latency { rate } => {
                if !rate.is_finite() || rate <= 0.0 {
                    return Err(Error::InvalidRate(rate));
                }
                let per_worker = rate / clients.max(1) as f64;
                let interval = Duration::try_from_secs_f64(1.0 / per_worker)
                    .map_err(|_| Error::InvalidRate(rate))?;
                Ok(Self::Open { interval })
            }
        }
    }

    pub(crate) fn schedule(self, start: Instant) -> Schedule {
        Schedule {
            start,
            pacing: self,
            next: 0,
        }
    }
}

/// Per-worker dispatch clock.
#[derive(Debug)]
pub(crate) struct Schedule {
    start: Instant,
    pacing: Pacing,
    next: u64,
}

impl Schedule {
    /// The instant the next transaction is due, or `None` in closed loop.
    ///
    /// Open-loop instants are computed from the start, never from the previous completion, so a
    /// slow transaction leaves later slots where they were.
    pub(crate) fn next_slot(&mut self) -> Option<Instant> {
        let Pacing::Open { interval } = self.pacing else {
            return None;
        };
        let k = self.next;
        self.next += 1;
        let offset_ns = interval.as_nanos().saturating_mul(u128::from(k));
        let offset = Duration::from_nanos(u64::try_from(offset_ns).unwrap_or(u64::MAX));
        Some(self.start + offset)
    }
}
