mod ast;
mod builtin;
mod client;
mod csv_cache;
mod distributions;
mod error;
mod eval;
mod functions;
mod lexer;
mod parser;
mod script_set;

pub use ast::{BinaryOp, Expr, Query, Script, SleepUnit, Statement};
pub use builtin::{
    BUILTIN_PREFIX, MATCH_ONLY, TPCB_LIKE, WorkloadSpec, is_builtin, load_script,
    uses_tpcb_dataset,
};
pub use client::{Client, Transaction};
pub use csv_cache::CsvCache;
pub use error::{Error, EvalError, ParseError, Result};
pub use eval::{Environment, EvalContext, Scope, evaluate};
pub use functions::MAX_RANGE_LEN;
pub use graphbench_value::{MapValue, QueryRequest, Value, ValueKind};
pub use parser::{parse, parse_expression};
pub use script_set::ScriptSet;
