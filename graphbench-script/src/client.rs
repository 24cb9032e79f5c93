use std::sync::Arc;
use std::time::Duration;

use graphbench_value::{MapValue, QueryRequest, Value};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::ast::{Query, SleepUnit, Statement};
use crate::csv_cache::CsvCache;
use crate::error::EvalError;
use crate::eval::{self, Environment, EvalContext, Scope};
use crate::script_set::ScriptSet;

/// Next unit of work for a worker.
#[derive(Debug, Clone, PartialEq)]
pub enum Transaction {
    Sleep(Duration),
    /// Submitted together as one logical transaction. May be empty for scripts with no queries.
    Queries(Vec<QueryRequest>),
}

/// Per-worker script interpreter.
///
/// Owns the environment, RNG stream and CSV cache; walks the statements of one picked script
/// at a time and yields a [`Transaction`] at each `:sleep` boundary and at the end of the script.
#[derive(Debug)]
pub struct Client {
    scripts: Arc<ScriptSet>,
    env: Environment,
    rng: StdRng,
    files: CsvCache,
    /// `(script index, next statement)` when a script is partway through.
    cursor: Option<(usize, usize)>,
}

impl Client {
    #[must_use]
    pub fn new(scripts: Arc<ScriptSet>, globals: &Environment, seed: u64) -> Self {
        Self {
            scripts,
            env: globals.clone(),
            rng: StdRng::seed_from_u64(seed),
            files: CsvCache::new(),
            cursor: None,
        }
    }

    /// Evaluates statements up to the next transaction boundary.
    ///
    /// On error the current script is abandoned; the next call starts a freshly picked one.
    pub fn next_transaction(&mut self) -> Result<Transaction, EvalError> {
        let (script_idx, start) = match self.cursor.take() {
            Some(cursor) => cursor,
            None => (self.scripts.pick_index(&mut self.rng), 0),
        };

        let script = &self.scripts.scripts()[script_idx];
        let mut queries = Vec::new();
        let mut pos = start;

        while let Some(statement) = script.statements.get(pos) {
            let mut ctx = EvalContext {
                rng: &mut self.rng,
                files: &mut self.files,
                base_dir: script.base_dir(),
            };

            match statement {
                Statement::Set { name, expr } => {
                    let value = eval::evaluate(expr, &Scope::Root(&self.env), &mut ctx)?;
                    self.env.set(Arc::clone(name), value);
                }
                Statement::Sleep { duration, unit } => {
                    if !queries.is_empty() {
                        self.cursor = Some((script_idx, pos));
                        return Ok(Transaction::Queries(queries));
                    }
                    let value = eval::evaluate(duration, &Scope::Root(&self.env), &mut ctx)?;
                    let sleep = sleep_duration(&value, *unit)?;
                    if pos + 1 < script.statements.len() {
                        self.cursor = Some((script_idx, pos + 1));
                    }
                    return Ok(Transaction::Sleep(sleep));
                }
                Statement::Query(query) => queries.push(bind(query, &self.env)?),
            }
            pos += 1;
        }

        Ok(Transaction::Queries(queries))
    }
}

fn bind(query: &Query, env: &Environment) -> Result<QueryRequest, EvalError> {
    let mut params = MapValue::with_capacity(query.params.len());
    for name in &query.params {
        let value = env
            .get(name)
            .ok_or_else(|| EvalError::UnboundVariable(name.to_string()))?;
        params.insert(Arc::clone(name), value.clone());
    }
    Ok(QueryRequest {
        text: Arc::clone(&query.text),
        params,
    })
}

fn sleep_duration(value: &Value, unit: SleepUnit) -> Result<Duration, EvalError> {
    let amount = match value {
        Value::Int(v) if *v >= 0 => *v as f64,
        Value::Float(v) if v.is_finite() && *v >= 0.0 => *v,
        other => return Err(EvalError::InvalidSleep(other.to_string())),
    };
    let secs = match unit {
        SleepUnit::Millis => amount / 1000.0,
        SleepUnit::Seconds => amount,
    };
    Duration::try_from_secs_f64(secs).map_err(|_| EvalError::InvalidSleep(value.to_string()))
}
