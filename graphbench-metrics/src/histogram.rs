use std::time::Duration;

use hdrhistogram::Histogram;
use hdrhistogram::serialization::{Deserializer, Serializer, V2Serializer};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to merge histograms: {0}")]
    Merge(String),

    #[error("failed to export histogram: {0}")]
    Export(String),

    #[error("failed to import histogram: {0}")]
    Import(String),
}

/// Upper bound: 1 hour in microseconds.
const HIGHEST_TRACKABLE_US: u64 = 3_600_000_000;
const SIGNIFICANT_FIGURES: u8 = 3;

fn new_default_histogram() -> Histogram<u64> {
    match Histogram::<u64>::new_with_bounds(1, HIGHEST_TRACKABLE_US, SIGNIFICANT_FIGURES) {
        Ok(h) => h,
        Err(err) => panic!("failed to create histogram: {err}"),
    }
}

/// Latency distribution recorded in microseconds.
///
/// Every instance shares the same bounds, so merging is exact: the merged histogram equals the
/// one that would have been recorded from all samples directly.
#[derive(Debug, Clone)]
pub struct LatencyHistogram {
    inner: Histogram<u64>,
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for LatencyHistogram {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencySummary {
    pub count: u64,
    pub min: Duration,
    pub max: Duration,
    pub mean: Duration,
    pub stdev: Duration,
    pub p50: Duration,
    pub p75: Duration,
    pub p90: Duration,
    pub p95: Duration,
    pub p99: Duration,
    pub p999: Duration,
}

impl LatencyHistogram {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: new_default_histogram(),
        }
    }

    /// Records one sample. Values outside the trackable range are clamped.
    pub fn record(&mut self, latency: Duration) {
        let us = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.record_us(us);
    }

    pub fn record_us(&mut self, us: u64) {
        self.inner.saturating_record(us.max(1));
    }

    #[must_use]
    pub fn len(&self) -> u64 {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.len() == 0
    }

    /// Adds all of `other`'s samples into `self`.
    pub fn merge(&mut self, other: &Self) -> Result<()> {
        self.inner
            .add(&other.inner)
            .map_err(|e| Error::Merge(format!("{e:?}")))
    }

    /// Folds any number of histograms into a fresh one.
    pub fn merged<'a>(parts: impl IntoIterator<Item = &'a LatencyHistogram>) -> Result<Self> {
        let mut out = Self::new();
        for part in parts {
            out.merge(part)?;
        }
        Ok(out)
    }

    #[must_use]
    pub fn quantile(&self, q: f64) -> Duration {
        Duration::from_micros(self.inner.value_at_quantile(q))
    }

    /// `None` when nothing was recorded.
    #[must_use]
    pub fn summary(&self) -> Option<LatencySummary> {
        if self.inner.len() == 0 {
            return None;
        }
        let h = &self.inner;
        let q = |q: f64| Duration::from_micros(h.value_at_quantile(q));
        Some(LatencySummary {
            count: h.len(),
            min: Duration::from_micros(h.min()),
            max: Duration::from_micros(h.max()),
            mean: Duration::from_secs_f64(h.mean() / 1_000_000.0),
            stdev: Duration::from_secs_f64(h.stdev() / 1_000_000.0),
            p50: q(0.50),
            p75: q(0.75),
            p90: q(0.90),
            p95: q(0.95),
            p99: q(0.99),
            p999: q(0.999),
        })
    }

    /// Encodes in the HdrHistogram V2 wire format.
    pub fn export(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        V2Serializer::new()
            .serialize(&self.inner, &mut buf)
            .map_err(|e| Error::Export(format!("{e:?}")))?;
        Ok(buf)
    }

    pub fn import(bytes: &[u8]) -> Result<Self> {
        let mut reader = bytes;
        let decoded: Histogram<u64> = Deserializer::new()
            .deserialize(&mut reader)
            .map_err(|e| Error::Import(format!("{e:?}")))?;
        let mut out = Self::new();
        out.inner
            .add(&decoded)
            .map_err(|e| Error::Import(format!("{e:?}")))?;
        Ok(out)
    }
}
