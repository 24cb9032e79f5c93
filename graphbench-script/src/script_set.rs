use rand::Rng;
use rand::rngs::StdRng;

use crate::ast::Script;
use crate::error::{Error, Result};

/// Immutable, weighted collection of scripts shared by all clients.
#[derive(Debug, Clone)]
pub struct ScriptSet {
    scripts: Vec<Script>,
    /// Running sum of weights; `cumulative[i]` is the exclusive upper bound of script `i`.
    cumulative: Vec<u64>,
}

impl ScriptSet {
    pub fn new(scripts: Vec<Script>) -> Result<Self> {
        if scripts.is_empty() {
            return Err(Error::EmptyScriptSet);
        }

        let mut total = 0u64;
        let mut cumulative = Vec::with_capacity(scripts.len());
        for script in &scripts {
            if script.weight == 0 {
                return Err(Error::InvalidWeight(format!("{}@0", script.source)));
            }
            total += u64::from(script.weight);
            cumulative.push(total);
        }

        Ok(Self {
            scripts,
            cumulative,
        })
    }

    #[must_use]
    pub fn scripts(&self) -> &[Script] {
        &self.scripts
    }

    #[must_use]
    pub fn total_weight(&self) -> u64 {
        self.cumulative.last().copied().unwrap_or(0)
    }

    /// Weighted-random selection with replacement. A single script costs no RNG draw.
    pub fn pick(&self, rng: &mut StdRng) -> &Script {
        &self.scripts[self.pick_index(rng)]
    }

    pub(crate) fn pick_index(&self, rng: &mut StdRng) -> usize {
        if self.scripts.len() == 1 {
            return 0;
        }
        let draw = rng.gen_range(0..self.total_weight());
        let idx = self.cumulative.partition_point(|&upper| upper <= draw);
        idx.min(self.scripts.len() - 1)
    }
}

#[cfg(test)]
mod tests {
    use rand::{RngCore, SeedableRng};

    use super::*;
    use crate::parser::parse;

    fn script(name: &str, weight: u32) -> Script {
        parse(name, "RETURN 1;", weight).unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn weighted_selection_converges() {
        let set = ScriptSet::new(vec![script("a", 1), script("b", 3)]).unwrap_or_else(|e| panic!("{e}"));
        let mut rng = StdRng::seed_from_u64(42);
        let draws: u32 = 40_000;
        let b = (0..draws).filter(|_| set.pick(&mut rng).source == "b").count();
        let freq = b as f64 / f64::from(draws);
        assert!((freq - 0.75).abs() <= 0.02, "frequency of b was {freq}");
    }

    #[test]
    fn single_script_consumes_no_randomness() {
        let set = ScriptSet::new(vec![script("only", 5)]).unwrap_or_else(|e| panic!("{e}"));
        let mut rng = StdRng::seed_from_u64(9);
        let mut untouched = StdRng::seed_from_u64(9);
        for _ in 0..10 {
            assert_eq!(set.pick(&mut rng).source, "only");
        }
        assert_eq!(rng.next_u64(), untouched.next_u64());
    }

    #[test]
    fn rejects_empty_and_zero_weight() {
        assert!(matches!(ScriptSet::new(vec![]), Err(Error::EmptyScriptSet)));
        assert!(matches!(
            ScriptSet::new(vec![script("z", 0)]),
            Err(Error::InvalidWeight(_))
        ));
    }
}
