use std::sync::Arc;

/// Side-channel status update for renderers.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressReport {
    /// `"benchmark"` or `"init"`.
    pub section: &'static str,
    pub step: &'static str,
    /// Fraction in `0.0..=1.0`.
    pub completeness: f64,
}

impl ProgressReport {
    #[must_use]
    pub fn new(section: &'static str, step: &'static str, completeness: f64) -> Self {
        Self {
            section,
            step,
            completeness: if completeness.is_finite() {
                completeness.clamp(0.0, 1.0)
            } else {
                0.0
            },
        }
    }
}

pub type ProgressFn = Arc<dyn Fn(ProgressReport) + Send + Sync + 'static>;

pub(crate) fn report(progress: Option<&ProgressFn>, report: ProgressReport) {
    if let Some(progress) = progress {
        progress(report);
    }
}
