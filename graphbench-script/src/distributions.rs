//! Integer random distributions with pgbench-compatible shapes.

use rand::Rng;
use rand::rngs::StdRng;

pub const MIN_GAUSSIAN_PARAM: f64 = 2.0;

/// Uniform integer in `[min, max]`. Callers guarantee `min <= max`.
pub fn uniform(rng: &mut StdRng, min: i64, max: i64) -> i64 {
    rng.gen_range(min..=max)
}

/// Truncated gaussian over `[min, max]`, centered on the middle of the range.
///
/// `param` is the number of standard deviations between the center and either bound; values
/// outside `[-param, param)` are redrawn.
pub fn gaussian(rng: &mut StdRng, min: i64, max: i64, param: f64) -> i64 {
    let stdev = loop {
        // Box-Muller; `1 - gen()` keeps the log argument in (0, 1].
        let rand1: f64 = 1.0 - rng.r#gen::<f64>();
        let rand2: f64 = rng.r#gen::<f64>();
        let candidate = (-2.0 * rand1.ln()).sqrt() * (2.0 * std::f64::consts::PI * rand2).sin();
        if candidate >= -param && candidate < param {
            break candidate;
        }
    };

    let rand = (stdev + param) / (2.0 * param);
    scale_into(min, max, rand)
}

/// Truncated exponential over `[min, max]`; larger `param` concentrates draws near `min`.
pub fn exponential(rng: &mut StdRng, min: i64, max: i64, param: f64) -> i64 {
    let cut = (-param).exp();
    let uniform = 1.0 - rng.r#gen::<f64>();
    let rand = -(cut + (1.0 - cut) * uniform).ln() / param;
    scale_into(min, max, rand)
}

fn scale_into(min: i64, max: i64, rand: f64) -> i64 {
    let span = (max as f64) - (min as f64) + 1.0;
    let offset = (span * rand) as i64;
    min.saturating_add(offset).clamp(min, max)
}
