use std::time::Duration;

use clap::Parser;
use graphbench_driver::{ConnectOptions, EncryptionMode};
use graphbench_script::{TPCB_LIKE, Value, WorkloadSpec};

fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("duration cannot be empty (expected e.g. 60, 30s, 2m)".to_string());
    }

    let number_end = s
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit())
        .map_or(s.len(), |(idx, _)| idx);

    if number_end == 0 {
        return Err(format!("invalid duration '{s}' (expected e.g. 60, 30s, 2m)"));
    }

    let (number_str, unit_str) = s.split_at(number_end);
    let value: u64 = number_str
        .parse()
        .map_err(|_| format!("invalid duration '{s}' (expected e.g. 60, 30s, 2m)"))?;

    // A bare number is seconds.
    match unit_str.trim() {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => Ok(Duration::from_secs(value)),
        "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => {
            Ok(Duration::from_millis(value))
        }
        "m" | "min" | "mins" | "minute" | "minutes" => {
            let secs = value
                .checked_mul(60)
                .ok_or_else(|| format!("duration '{s}' is too large"))?;
            Ok(Duration::from_secs(secs))
        }
        "h" | "hr" | "hrs" | "hour" | "hours" => {
            let secs = value
                .checked_mul(60)
                .and_then(|v| v.checked_mul(60))
                .ok_or_else(|| format!("duration '{s}' is too large"))?;
            Ok(Duration::from_secs(secs))
        }
        _ => Err(format!("invalid duration '{s}' (expected e.g. 60, 30s, 2m)")),
    }
}

/// `KEY=VALUE`, where the value must be an integer or a float.
fn parse_define(input: &str) -> Result<(String, Value), String> {
    let (key, raw) = input
        .split_once('=')
        .ok_or_else(|| format!("invalid define '{input}' (expected KEY=VALUE)"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("invalid define '{input}' (empty key)"));
    }
    let raw = raw.trim();
    if let Ok(v) = raw.parse::<i64>() {
        return Ok((key.to_string(), Value::Int(v)));
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok((key.to_string(), Value::Float(v))),
        _ => Err(format!(
            "-D and --define values must be integers or floats, failed to parse '{raw}'"
        )),
    }
}

fn parse_workload(input: &str) -> Result<WorkloadSpec, String> {
    input.parse().map_err(|e| format!("{e}"))
}

fn parse_encryption(input: &str) -> Result<EncryptionMode, String> {
    input.parse().map_err(|_| {
        format!("invalid encryption mode '{input}', needs to be one of 'auto', 'true' or 'false'")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// `interactive` on a terminal, `csv` otherwise.
    Auto,
    /// Progress bar and human-readable report.
    Interactive,
    /// Machine-readable report on stdout, no progress.
    Csv,
}

#[derive(Debug, Parser)]
#[command(
    name = "graphbench",
    author,
    version,
    about = "Scriptable benchmarks for graph databases",
    long_about = "graphbench runs a canned or user-defined workload against a graph database over its transactional HTTP endpoint.\n\nBy default it measures the maximum throughput it can achieve; with --latency it holds a fixed transaction rate and reports the latency distribution.\n\nThe default workload, builtin:tpcb-like, is modelled on pgbench's tpcb-like; run once with --init to create its dataset.",
    after_help = "Examples:\n  graphbench -i -s 10 -d 10\n  graphbench -c 8 -d 2m -w builtin:tpcb-like@9 -w builtin:match-only\n  graphbench -l -r 200 -c 4 -w ./workload.script -D limit=25\n  GRAPHBENCH_PASSWORD=secret graphbench -a https://db.example.com:7473"
)]
pub struct Cli {
    /// Create the dataset for builtin workloads before running
    #[arg(short = 'i', long)]
    pub init: bool,

    /// Sets the `scale` variable; its impact depends on the workload
    #[arg(short = 's', long, default_value_t = 1, allow_negative_numbers = true)]
    pub scale: i64,

    /// Number of concurrent clients (one connection each)
    #[arg(short = 'c', long, default_value_t = 1)]
    pub clients: usize,

    /// In latency mode, transactions per second summed over all clients
    #[arg(short = 'r', long, default_value_t = 1.0)]
    pub rate: f64,

    /// Address of the database's HTTP endpoint
    #[arg(short = 'a', long, env = "GRAPHBENCH_ADDRESS", default_value = ConnectOptions::DEFAULT_ADDRESS)]
    pub address: String,

    #[arg(short = 'u', long, env = "GRAPHBENCH_USER", default_value = "neo4j")]
    pub user: String,

    #[arg(
        short = 'p',
        long,
        env = "GRAPHBENCH_PASSWORD",
        default_value = "neo4j",
        hide_env_values = true
    )]
    pub password: String,

    /// Whether to use encryption: `auto`, `true` or `false`
    #[arg(
        short = 'e',
        long,
        env = "GRAPHBENCH_ENCRYPTION",
        default_value = "auto",
        value_parser = parse_encryption
    )]
    pub encryption: EncryptionMode,

    /// How long to run (e.g. 60, 30s, 2m)
    #[arg(short = 'd', long, default_value = "60", value_parser = parse_duration)]
    pub duration: Duration,

    /// Defines a variable for workload scripts (repeatable, KEY=VALUE)
    #[arg(short = 'D', long = "define", value_name = "KEY=VALUE", value_parser = parse_define)]
    pub defines: Vec<(String, Value)>,

    /// Workload to run: a builtin: name or a script path, optionally weighted with @N (repeatable)
    #[arg(short = 'w', long = "workload", default_value = TPCB_LIKE, value_parser = parse_workload)]
    pub workloads: Vec<WorkloadSpec>,

    /// Run at a fixed rate (see --rate) and report latencies instead of throughput
    #[arg(short = 'l', long)]
    pub latency: bool,

    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Auto)]
    pub output: OutputFormat,

    /// Database to run against
    #[arg(long, env = "GRAPHBENCH_DATABASE", default_value = ConnectOptions::DEFAULT_DATABASE)]
    pub database: String,

    /// Base RNG seed; client N uses seed + N. Defaults to the current time
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log progress of the run itself (overridden by RUST_LOG)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_accepts_common_units() {
        assert_eq!(parse_duration("60"), Ok(Duration::from_secs(60)));
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("30s"), Ok(Duration::from_secs(30)));
        assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
        assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("10x").is_err());
    }

    #[test]
    fn defines_are_numbers_only() {
        assert_eq!(parse_define("limit=25"), Ok(("limit".to_string(), Value::Int(25))));
        assert_eq!(parse_define("ratio=0.5"), Ok(("ratio".to_string(), Value::Float(0.5))));
        assert!(parse_define("name=alice").is_err());
        assert!(parse_define("=1").is_err());
        assert!(parse_define("novalue").is_err());
    }

    #[test]
    fn defaults_mirror_a_plain_throughput_run() {
        let cli = match Cli::try_parse_from(["graphbench"]) {
            Ok(v) => v,
            Err(err) => panic!("failed to parse args: {err}"),
        };
        assert!(!cli.init);
        assert!(!cli.latency);
        assert_eq!(cli.scale, 1);
        assert_eq!(cli.clients, 1);
        assert_eq!(cli.rate, 1.0);
        assert_eq!(cli.duration, Duration::from_secs(60));
        assert_eq!(cli.encryption, EncryptionMode::Auto);
        assert_eq!(cli.database, "neo4j");
        assert_eq!(cli.output, OutputFormat::Auto);
        assert_eq!(
            cli.workloads,
            vec![WorkloadSpec {
                source: TPCB_LIKE.to_string(),
                weight: 1
            }]
        );
    }

    #[test]
    fn cli_parses_full_latency_run() {
        let parsed = Cli::try_parse_from([
            "graphbench",
            "-l",
            "-r",
            "12.5",
            "-c",
            "4",
            "-s",
            "3",
            "-d",
            "250ms",
            "-e",
            "no",
            "-w",
            "a.script@3",
            "-w",
            "builtin:match-only",
            "-D",
            "limit=5",
            "-o",
            "csv",
            "--seed",
            "9",
            "-a",
            "https://db:7473",
            "-u",
            "bench",
            "-p",
            "pw",
        ]);
        let cli = match parsed {
            Ok(v) => v,
            Err(err) => panic!("failed to parse args: {err}"),
        };

        assert!(cli.latency);
        assert_eq!(cli.rate, 12.5);
        assert_eq!(cli.clients, 4);
        assert_eq!(cli.scale, 3);
        assert_eq!(cli.duration, Duration::from_millis(250));
        assert_eq!(cli.encryption, EncryptionMode::Off);
        assert_eq!(
            cli.workloads,
            vec![
                WorkloadSpec {
                    source: "a.script".to_string(),
                    weight: 3
                },
                WorkloadSpec {
                    source: "builtin:match-only".to_string(),
                    weight: 1
                },
            ]
        );
        assert_eq!(cli.defines, vec![("limit".to_string(), Value::Int(5))]);
        assert_eq!(cli.output, OutputFormat::Csv);
        assert_eq!(cli.seed, Some(9));
        assert_eq!(cli.address, "https://db:7473");
        assert_eq!(cli.user, "bench");
        assert_eq!(cli.password, "pw");
    }

    #[test]
    fn rejects_bad_encryption_and_weight() {
        assert!(Cli::try_parse_from(["graphbench", "-e", "maybe"]).is_err());
        assert!(Cli::try_parse_from(["graphbench", "-w", "x.script@0"]).is_err());
    }
}
