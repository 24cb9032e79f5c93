use std::sync::Arc;

use graphbench_core::{BenchConfig, BenchResult, Mode, ProgressFn};

mod progress;
mod summary;

use progress::HumanProgress;
use summary::render;

use super::OutputFormatter;

pub(crate) struct HumanReadableOutput {
    progress: Arc<HumanProgress>,
}

impl HumanReadableOutput {
    pub(crate) fn new() -> Self {
        Self {
            progress: Arc::new(HumanProgress::new()),
        }
    }
}

impl OutputFormatter for HumanReadableOutput {
    fn print_header(&self, config: &BenchConfig) {
        println!("scenario:{}", config.describe_scenario());
        println!("seed: {}", config.seed);
        println!();
    }

    fn progress(&self) -> Option<ProgressFn> {
        let progress = self.progress.clone();
        Some(Arc::new(move |r| progress.update(&r)))
    }

    fn error(&self, message: &str) {
        self.progress.println(&format!("error: {message}"));
    }

    fn print_result(&self, result: &BenchResult, mode: Mode) -> anyhow::Result<()> {
        self.progress.finish();
        print!("{}", render(result, mode));
        Ok(())
    }
}
