use std::path::Path;
use std::sync::Arc;

use graphbench_value::{MapValue, Value, ValueKind};
use rand::rngs::StdRng;

use crate::ast::{BinaryOp, Expr};
use crate::csv_cache::CsvCache;
use crate::error::EvalError;
use crate::functions;

/// Variable bindings owned by a single client.
///
/// Seeded from global variables (`scale`, `-D` defines) and then mutated by `:set`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    vars: MapValue,
}

impl Environment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<Arc<str>>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K: Into<Arc<str>>> FromIterator<(K, Value)> for Environment {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Lookup chain: the client environment plus comprehension bindings layered on top.
#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    Root(&'a Environment),
    Bound {
        parent: &'a Scope<'a>,
        name: &'a str,
        value: &'a Value,
    },
}

impl<'a> Scope<'a> {
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&'a Value> {
        let mut current = *self;
        loop {
            match current {
                Scope::Root(env) => return env.get(name),
                Scope::Bound {
                    parent,
                    name: bound,
                    value,
                } => {
                    if bound == name {
                        return Some(value);
                    }
                    current = *parent;
                }
            }
        }
    }
}

/// Mutable per-client state that built-in functions draw from.
pub struct EvalContext<'a> {
    pub rng: &'a mut StdRng,
    pub files: &'a mut CsvCache,
    pub base_dir: Option<&'a Path>,
}

pub fn evaluate(expr: &Expr, scope: &Scope<'_>, ctx: &mut EvalContext<'_>) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Variable(name) => scope
            .lookup(name)
            .cloned()
            .ok_or_else(|| EvalError::UnboundVariable(name.to_string())),
        Expr::Negate(inner) => match evaluate(inner, scope, ctx)? {
            Value::Int(v) => v
                .checked_neg()
                .map(Value::Int)
                .ok_or(EvalError::Overflow(BinaryOp::Sub)),
            Value::Float(v) => Ok(Value::Float(-v)),
            other => Err(EvalError::Negate(other.kind())),
        },
        Expr::Binary { op, left, right } => {
            let l = evaluate(left, scope, ctx)?;
            let r = evaluate(right, scope, ctx)?;
            binary(*op, l, r)
        }
        Expr::Call { name, args } => {
            let values = args
                .iter()
                .map(|a| evaluate(a, scope, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            functions::call(name, values, ctx)
        }
        Expr::List(items) => items
            .iter()
            .map(|item| evaluate(item, scope, ctx))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        Expr::Map(entries) => {
            let mut map = MapValue::with_capacity(entries.len());
            for (key, value) in entries {
                map.insert(key.clone(), evaluate(value, scope, ctx)?);
            }
            Ok(Value::Map(map))
        }
        Expr::Comprehension {
            binding,
            source,
            projection,
        } => {
            let items = match evaluate(source, scope, ctx)? {
                Value::List(items) => items,
                other => return Err(EvalError::ComprehensionSource(other.kind())),
            };
            let mut out = Vec::with_capacity(items.len());
            for item in &items {
                let child = Scope::Bound {
                    parent: scope,
                    name: binding,
                    value: item,
                };
                out.push(evaluate(projection, &child, ctx)?);
            }
            Ok(Value::List(out))
        }
    }
}

fn binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => int_op(op, a, b),
        (l @ (Value::Int(_) | Value::Float(_)), r @ (Value::Int(_) | Value::Float(_))) => {
            let (a, b) = (l.as_f64().unwrap_or_default(), r.as_f64().unwrap_or_default());
            float_op(op, a, b)
        }
        (Value::List(mut a), Value::List(b)) if op == BinaryOp::Add => {
            a.extend(b);
            Ok(Value::List(a))
        }
        (l, r)
            if op == BinaryOp::Add
                && (l.kind() == ValueKind::String || r.kind() == ValueKind::String)
                && is_scalar(&l)
                && is_scalar(&r) =>
        {
            Ok(Value::from(format!("{l}{r}")))
        }
        (l, r) => Err(EvalError::IncompatibleOperands {
            op,
            left: l.kind(),
            right: r.kind(),
        }),
    }
}

fn is_scalar(v: &Value) -> bool {
    matches!(v, Value::Int(_) | Value::Float(_) | Value::String(_))
}

fn int_op(op: BinaryOp, a: i64, b: i64) -> Result<Value, EvalError> {
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            a.checked_div(b)
        }
    };
    result.map(Value::Int).ok_or(EvalError::Overflow(op))
}

fn float_op(op: BinaryOp, a: f64, b: f64) -> Result<Value, EvalError> {
    let v = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            a / b
        }
    };
    Ok(Value::Float(v))
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::parser::parse_expression;

    fn eval_with(env: &Environment, text: &str) -> Result<Value, EvalError> {
        let expr = parse_expression(text).unwrap_or_else(|e| panic!("{e}"));
        let mut rng = StdRng::seed_from_u64(1);
        let mut files = CsvCache::new();
        let mut ctx = EvalContext {
            rng: &mut rng,
            files: &mut files,
            base_dir: None,
        };
        evaluate(&expr, &Scope::Root(env), &mut ctx)
    }

    fn eval(text: &str) -> Value {
        eval_with(&Environment::new(), text).unwrap_or_else(|e| panic!("{text}: {e}"))
    }

    #[test]
    fn arithmetic_follows_numeric_promotion() {
        assert_eq!(eval("1 + 2 * 3"), Value::Int(7));
        assert_eq!(eval("7 / 2"), Value::Int(3));
        assert_eq!(eval("-7 / 2"), Value::Int(-3));
        assert_eq!(eval("7 / 2.0"), Value::Float(3.5));
        assert_eq!(eval("-(2 - 5)"), Value::Int(3));
    }

    #[test]
    fn strings_and_lists_concatenate() {
        assert_eq!(eval("'id-' + 42"), Value::from("id-42"));
        assert_eq!(eval("1.5 + 'x'"), Value::from("1.5x"));
        assert_eq!(
            eval("[1] + [2, 3]"),
            Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
    }

    #[test]
    fn incompatible_operands_are_rejected() {
        let env = Environment::new();
        assert_eq!(
            eval_with(&env, "[1] + 1"),
            Err(EvalError::IncompatibleOperands {
                op: BinaryOp::Add,
                left: ValueKind::List,
                right: ValueKind::Integer,
            })
        );
        assert!(eval_with(&env, "'a' - 1").is_err());
        assert_eq!(eval_with(&env, "1 / 0"), Err(EvalError::DivisionByZero));
        assert_eq!(eval_with(&env, "1.0 / 0"), Err(EvalError::DivisionByZero));
        assert_eq!(
            eval_with(&env, "9223372036854775807 + 1"),
            Err(EvalError::Overflow(BinaryOp::Add))
        );
    }

    #[test]
    fn variables_resolve_bare_or_prefixed() {
        let env: Environment = [("scale", Value::Int(10))].into_iter().collect();
        assert_eq!(eval_with(&env, "$scale * 2"), Ok(Value::Int(20)));
        assert_eq!(eval_with(&env, "scale + 1"), Ok(Value::Int(11)));
        assert_eq!(
            eval_with(&env, "$missing"),
            Err(EvalError::UnboundVariable("missing".to_string()))
        );
    }

    #[test]
    fn comprehension_binds_per_item_and_shadows() {
        let env: Environment = [("i", Value::Int(100))].into_iter().collect();
        assert_eq!(
            eval_with(&env, "[i in range(1, 3) | i * 2]"),
            Ok(Value::List(vec![Value::Int(2), Value::Int(4), Value::Int(6)]))
        );
        assert_eq!(
            eval_with(&env, "[x in [1, 2] | [y in [10] | x + y + i]]"),
            Ok(Value::List(vec![
                Value::List(vec![Value::Int(111)]),
                Value::List(vec![Value::Int(112)]),
            ]))
        );
        assert_eq!(
            eval_with(&env, "[x in 5 | x]"),
            Err(EvalError::ComprehensionSource(ValueKind::Integer))
        );
    }

    #[test]
    fn maps_evaluate_their_values() {
        let v = eval("{id: 1 + 1, 'name': 'n'}");
        let Value::Map(map) = v else {
            panic!("expected map");
        };
        assert_eq!(map.get("id"), Some(&Value::Int(2)));
        assert_eq!(map.get("name"), Some(&Value::from("n")));
    }
}
