use graphbench_value::Value;

use crate::distributions;
use crate::error::EvalError;
use crate::eval::EvalContext;

/// Upper bound on the number of elements `range()` will materialize.
pub const MAX_RANGE_LEN: u64 = 10_000_000;

pub(crate) fn call(name: &str, args: Vec<Value>, ctx: &mut EvalContext<'_>) -> Result<Value, EvalError> {
    match name {
        "abs" => {
            let [v] = arity::<1>(name, args)?;
            match v {
                Value::Int(i) => i
                    .checked_abs()
                    .map(Value::Int)
                    .ok_or_else(|| invalid(name, "integer overflow")),
                Value::Float(f) => Ok(Value::Float(f.abs())),
                other => Err(kind_error(name, 1, "a number", &other)),
            }
        }
        "len" => {
            let [v] = arity::<1>(name, args)?;
            let n = match &v {
                Value::List(items) => items.len(),
                Value::String(s) => s.chars().count(),
                Value::Map(m) => m.len(),
                other => return Err(kind_error(name, 1, "a list, string or map", other)),
            };
            Ok(Value::Int(i64::try_from(n).unwrap_or(i64::MAX)))
        }
        "pi" => {
            let [] = arity::<0>(name, args)?;
            Ok(Value::Float(std::f64::consts::PI))
        }
        "sqrt" => {
            let [v] = arity::<1>(name, args)?;
            let x = number(name, 1, &v)?;
            if x < 0.0 {
                return Err(invalid(name, "argument must not be negative"));
            }
            Ok(Value::Float(x.sqrt()))
        }
        "range" => {
            let [min, max] = arity::<2>(name, args)?;
            let (min, max) = (integer(name, 1, &min)?, integer(name, 2, &max)?);
            if min > max {
                return Ok(Value::List(Vec::new()));
            }
            let len = max.abs_diff(min).saturating_add(1);
            if len > MAX_RANGE_LEN {
                return Err(invalid(
                    name,
                    &format!("range of {len} elements exceeds the limit of {MAX_RANGE_LEN}"),
                ));
            }
            Ok(Value::List((min..=max).map(Value::Int).collect()))
        }
        "csv" => {
            let [path] = arity::<1>(name, args)?;
            match path {
                Value::String(path) => ctx.files.load(&path, ctx.base_dir),
                other => Err(kind_error(name, 1, "a string", &other)),
            }
        }
        "random" => {
            let [min, max] = arity::<2>(name, args)?;
            let (min, max) = bounds(name, &min, &max)?;
            Ok(Value::Int(distributions::uniform(ctx.rng, min, max)))
        }
        "random_gaussian" => {
            let [min, max, param] = arity::<3>(name, args)?;
            let (min, max) = bounds(name, &min, &max)?;
            let param = number(name, 3, &param)?;
            if !param.is_finite() || param < distributions::MIN_GAUSSIAN_PARAM {
                return Err(invalid(
                    name,
                    &format!("parameter must be at least {}", distributions::MIN_GAUSSIAN_PARAM),
                ));
            }
            Ok(Value::Int(distributions::gaussian(ctx.rng, min, max, param)))
        }
        "random_exponential" => {
            let [min, max, param] = arity::<3>(name, args)?;
            let (min, max) = bounds(name, &min, &max)?;
            let param = number(name, 3, &param)?;
            if !param.is_finite() || param <= 0.0 {
                return Err(invalid(name, "parameter must be greater than 0"));
            }
            Ok(Value::Int(distributions::exponential(ctx.rng, min, max, param)))
        }
        "int" => {
            let [v] = arity::<1>(name, args)?;
            match v {
                Value::Int(i) => Ok(Value::Int(i)),
                Value::Float(f) if f.is_finite() => Ok(Value::Int(f.trunc() as i64)),
                Value::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::Int)
                    .map_err(|_| invalid(name, &format!("cannot convert '{s}' to an integer"))),
                other => Err(kind_error(name, 1, "a finite number or string", &other)),
            }
        }
        "float" => {
            let [v] = arity::<1>(name, args)?;
            match v {
                n @ (Value::Int(_) | Value::Float(_)) => {
                    Ok(Value::Float(n.as_f64().unwrap_or_default()))
                }
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(Value::Float)
                    .map_err(|_| invalid(name, &format!("cannot convert '{s}' to a float"))),
                other => Err(kind_error(name, 1, "a number or string", &other)),
            }
        }
        "str" => {
            let [v] = arity::<1>(name, args)?;
            Ok(Value::from(v.to_string()))
        }
        _ => Err(EvalError::UnknownFunction(name.to_string())),
    }
}

fn arity<const N: usize>(name: &str, args: Vec<Value>) -> Result<[Value; N], EvalError> {
    let got = args.len();
    args.try_into().map_err(|_| EvalError::Arity {
        name: name.to_string(),
        expected: N,
        got,
    })
}

fn invalid(name: &str, message: &str) -> EvalError {
    EvalError::InvalidArgument {
        name: name.to_string(),
        message: message.to_string(),
    }
}

fn kind_error(name: &str, position: usize, expected: &'static str, got: &Value) -> EvalError {
    EvalError::ArgumentKind {
        name: name.to_string(),
        position,
        expected,
        got: got.kind(),
    }
}

fn integer(name: &str, position: usize, v: &Value) -> Result<i64, EvalError> {
    v.as_i64().ok_or_else(|| kind_error(name, position, "an integer", v))
}

fn number(name: &str, position: usize, v: &Value) -> Result<f64, EvalError> {
    v.as_f64().ok_or_else(|| kind_error(name, position, "a number", v))
}

fn bounds(name: &str, min: &Value, max: &Value) -> Result<(i64, i64), EvalError> {
    let (min, max) = (integer(name, 1, min)?, integer(name, 2, max)?);
    if min > max {
        return Err(invalid(name, &format!("min ({min}) must not exceed max ({max})")));
    }
    Ok((min, max))
}
