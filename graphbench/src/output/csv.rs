use std::io::Write as _;
use std::time::Duration;

use graphbench_core::{BenchConfig, BenchResult, Mode, ProgressFn};

use super::OutputFormatter;

pub(crate) struct CsvOutput;

impl OutputFormatter for CsvOutput {
    fn print_header(&self, _config: &BenchConfig) {}

    fn progress(&self) -> Option<ProgressFn> {
        None
    }

    fn error(&self, message: &str) {
        eprintln!("error: {message}");
    }

    fn print_result(&self, result: &BenchResult, mode: Mode) -> anyhow::Result<()> {
        let rendered = render(result, mode)?;
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&rendered)?;
        stdout.flush()?;
        Ok(())
    }
}

const THROUGHPUT_HEADER: [&str; 5] = ["mode", "scenario", "succeeded", "failed", "rate_tps"];
const LATENCY_HEADER: [&str; 10] = [
    "mean_ms", "stdev_ms", "min_ms", "max_ms", "p50_ms", "p75_ms", "p90_ms", "p95_ms", "p99_ms",
    "p999_ms",
];

/// Summary row plus one `failure` row per group. Failure rows are narrower than the header.
pub(crate) fn render(result: &BenchResult, mode: Mode) -> anyhow::Result<Vec<u8>> {
    let latency = matches!(mode, Mode::Latency { .. });
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let mut header: Vec<&str> = THROUGHPUT_HEADER.to_vec();
    if latency {
        header.extend(LATENCY_HEADER);
    }
    writer.write_record(&header)?;

    let mut row = vec![
        mode.to_string(),
        result.scenario.clone(),
        result.succeeded.to_string(),
        result.failed.to_string(),
        format!("{:.3}", result.rate),
    ];
    if latency {
        match result.histogram.summary() {
            Some(s) => row.extend(
                [s.mean, s.stdev, s.min, s.max, s.p50, s.p75, s.p90, s.p95, s.p99, s.p999]
                    .into_iter()
                    .map(|d| format!("{:.3}", millis(d))),
            ),
            None => row.extend(std::iter::repeat_n(String::new(), LATENCY_HEADER.len())),
        }
    }
    writer.write_record(&row)?;

    for (signature, group) in result.failures.sorted() {
        writer.write_record([
            "failure".to_string(),
            group.count.to_string(),
            humantime::format_rfc3339_millis(group.first_failure).to_string(),
            signature.to_string(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush csv report: {}", e.error()))
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1_000.0
}
