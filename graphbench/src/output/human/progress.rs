use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use graphbench_core::ProgressReport;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Bar resolution; completeness is a fraction, the bar counts per-mille.
const BAR_LENGTH: u64 = 1_000;

pub(crate) struct HumanProgress {
    inner: Mutex<Inner>,
}

impl HumanProgress {
    pub(crate) fn new() -> Self {
        let multi = MultiProgress::new();
        multi.set_draw_target(ProgressDrawTarget::stderr_with_hz(5));

        Self {
            inner: Mutex::new(Inner {
                multi,
                bars: HashMap::new(),
            }),
        }
    }

    pub(crate) fn update(&self, report: &ProgressReport) {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let pb = inner.get_or_create_bar(report.section);
        pb.set_message(report.step);
        // "stopping" arrives with completeness 0; keep the bar where it was.
        if report.completeness > 0.0 || pb.position() == 0 {
            pb.set_position((report.completeness * BAR_LENGTH as f64).round() as u64);
        }
    }

    pub(crate) fn println(&self, line: &str) {
        let inner = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if inner.multi.println(line).is_err() {
            eprintln!("{line}");
        }
    }

    pub(crate) fn finish(&self) {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        for (_, pb) in inner.bars.drain() {
            pb.finish_and_clear();
        }

        let _ = inner.multi.clear();
    }
}

struct Inner {
    multi: MultiProgress,
    bars: HashMap<&'static str, ProgressBar>,
}

impl Inner {
    fn get_or_create_bar(&mut self, section: &'static str) -> &ProgressBar {
        self.bars.entry(section).or_insert_with(|| {
            let pb = self.multi.add(ProgressBar::new(BAR_LENGTH));
            pb.set_style(bar_style());
            pb.set_prefix(section);
            pb.enable_steady_tick(Duration::from_millis(200));
            pb
        })
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:>10.cyan.bold} [{bar:40.cyan/blue}] {percent:>3}% {msg} ({elapsed})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}
