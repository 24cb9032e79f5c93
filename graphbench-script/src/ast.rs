use std::path::{Path, PathBuf};
use std::sync::Arc;

use graphbench_value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum BinaryOp {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Variable(Arc<str>),
    Negate(Box<Expr>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        name: Arc<str>,
        args: Vec<Expr>,
    },
    List(Vec<Expr>),
    Map(Vec<(Arc<str>, Expr)>),
    Comprehension {
        binding: Arc<str>,
        source: Box<Expr>,
        projection: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
pub enum SleepUnit {
    #[strum(serialize = "ms")]
    Millis,
    #[strum(serialize = "s")]
    Seconds,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub text: Arc<str>,
    /// `$name` placeholders in first-occurrence order, without duplicates.
    pub params: Vec<Arc<str>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Set { name: Arc<str>, expr: Expr },
    Sleep { duration: Expr, unit: SleepUnit },
    Query(Query),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub source: String,
    pub weight: u32,
    pub statements: Vec<Statement>,
    base_dir: Option<PathBuf>,
}

impl Script {
    pub(crate) fn new(source: &str, weight: u32, statements: Vec<Statement>) -> Self {
        let base_dir = if crate::builtin::is_builtin(source) {
            None
        } else {
            Path::new(source).parent().map(Path::to_path_buf)
        };

        Self {
            source: source.to_string(),
            weight,
            statements,
            base_dir,
        }
    }

    /// Directory that script-relative paths (e.g. `csv(...)`) resolve against.
    #[must_use]
    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    pub fn queries(&self) -> impl Iterator<Item = &Query> {
        self.statements.iter().filter_map(|s| match s {
            Statement::Query(q) => Some(q),
            _ => None,
        })
    }
}
