use std::io::IsTerminal as _;

use graphbench_core::{BenchConfig, BenchResult, Mode, ProgressFn};

use crate::cli::OutputFormat;

mod csv;
mod human;

pub(crate) trait OutputFormatter: Send + Sync {
    fn print_header(&self, config: &BenchConfig);
    fn progress(&self) -> Option<ProgressFn>;
    /// Non-fatal problems during the run, e.g. a crashed worker.
    fn error(&self, message: &str);
    fn print_result(&self, result: &BenchResult, mode: Mode) -> anyhow::Result<()>;
}

pub(crate) fn resolve(format: OutputFormat) -> OutputFormat {
    match format {
        OutputFormat::Auto if std::io::stderr().is_terminal() => OutputFormat::Interactive,
        OutputFormat::Auto => OutputFormat::Csv,
        other => other,
    }
}

pub(crate) fn formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match resolve(format) {
        OutputFormat::Csv => Box::new(csv::CsvOutput),
        OutputFormat::Interactive | OutputFormat::Auto => Box::new(human::HumanReadableOutput::new()),
    }
}
