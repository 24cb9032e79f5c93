use graphbench_value::ValueKind;

use crate::ast::BinaryOp;

pub type Result<T> = std::result::Result<T, Error>;

/// Malformed script text. Positions are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{script}:{line}:{column}: {message}")]
pub struct ParseError {
    pub script: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Runtime fault while evaluating an expression for a single transaction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("unbound variable `{0}`")]
    UnboundVariable(String),

    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    #[error("`{name}` expects {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("`{name}` argument {position} must be {expected}, got {got}")]
    ArgumentKind {
        name: String,
        position: usize,
        expected: &'static str,
        got: ValueKind,
    },

    #[error("`{name}`: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("cannot apply `{op}` to {left} and {right}")]
    IncompatibleOperands {
        op: BinaryOp,
        left: ValueKind,
        right: ValueKind,
    },

    #[error("cannot negate {0}")]
    Negate(ValueKind),

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in `{0}`")]
    Overflow(BinaryOp),

    #[error("list comprehension source must be a list, got {0}")]
    ComprehensionSource(ValueKind),

    #[error("sleep duration must be a non-negative number, got {0}")]
    InvalidSleep(String),

    #[error("failed to read `{path}`: {message}")]
    File { path: String, message: String },
}

/// Errors raised while assembling a workload from its sources.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("failed to read workload file at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown builtin workload `{0}`")]
    UnknownBuiltin(String),

    #[error("invalid workload weight in `{0}` (value after @ must be a positive integer)")]
    InvalidWeight(String),

    #[error("at least one workload script is required")]
    EmptyScriptSet,
}
