use std::fmt::Write as _;
use std::time::Duration;

use graphbench_core::{BenchResult, Mode};

pub(crate) fn render(result: &BenchResult, mode: Mode) -> String {
    let mut out = String::new();

    out.push_str("== Results ==\n");
    writeln!(out, "scenario:{}", result.scenario).ok();
    writeln!(out, "mode: {mode}").ok();
    writeln!(out, "succeeded: {}", result.succeeded).ok();
    writeln!(out, "failed: {}", result.failed).ok();
    writeln!(out, "throughput: {:.3} tx/s", result.rate).ok();

    if let Mode::Latency { rate } = mode {
        writeln!(out, "target rate: {rate} tx/s").ok();
        match result.histogram.summary() {
            Some(s) => {
                out.push_str("latency (ms):\n");
                writeln!(
                    out,
                    "  mean {}  stdev {}  min {}  max {}",
                    ms(s.mean),
                    ms(s.stdev),
                    ms(s.min),
                    ms(s.max)
                )
                .ok();
                for (label, d) in [
                    ("p50", s.p50),
                    ("p75", s.p75),
                    ("p90", s.p90),
                    ("p95", s.p95),
                    ("p99", s.p99),
                    ("p99.9", s.p999),
                ] {
                    writeln!(out, "  {label:>5} {}", ms(d)).ok();
                }
            }
            None => out.push_str("latency: n/a (no successful transactions)\n"),
        }
    }

    let crashed: Vec<_> = result.crashed().collect();
    if !crashed.is_empty() {
        writeln!(out, "crashed workers: {}", crashed.len()).ok();
        for (index, error) in crashed {
            writeln!(out, "  worker {index}: {error}").ok();
        }
    }

    let failures = result.failures.sorted();
    if !failures.is_empty() {
        out.push_str("failures:\n");
        for (signature, group) in failures {
            writeln!(
                out,
                "  {}x (first at {}): {signature}",
                group.count,
                humantime::format_rfc3339_millis(group.first_failure)
            )
            .ok();
        }
    }

    out
}

fn ms(d: Duration) -> String {
    format!("{:.3}", d.as_secs_f64() * 1_000.0)
}
