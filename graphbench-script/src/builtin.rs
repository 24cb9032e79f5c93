use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::ast::Script;
use crate::error::{Error, Result};
use crate::parser;

pub const BUILTIN_PREFIX: &str = "builtin:";
pub const TPCB_LIKE: &str = "builtin:tpcb-like";
pub const MATCH_ONLY: &str = "builtin:match-only";

/// Mirrors pgbench's default `tpcb-like` transaction over a graph of accounts, tellers and
/// branches.
pub const TPCB_LIKE_SCRIPT: &str = "\
:set aid random(1, 100000 * $scale)
:set bid random(1, $scale)
:set tid random(1, 10 * $scale)
:set delta random(-5000, 5000)
MATCH (account:Account {aid:$aid})
SET account.balance = account.balance + $delta;
MATCH (account:Account {aid:$aid}) RETURN account.balance;
MATCH (teller:Teller {tid: $tid}) SET teller.balance = teller.balance + $delta;
MATCH (branch:Branch {bid: $bid}) SET branch.balance = branch.balance + $delta;
CREATE (:History {tid: $tid, bid: $bid, aid: $aid, delta: $delta, mtime: timestamp()});
";

/// Read-only point lookups over the `tpcb-like` dataset.
pub const MATCH_ONLY_SCRIPT: &str = "\
:set aid random(1, 100000 * $scale)
MATCH (account:Account {aid:$aid}) RETURN account.balance;
";

#[must_use]
pub fn is_builtin(source: &str) -> bool {
    source.starts_with(BUILTIN_PREFIX)
}

/// Whether the named workload runs against the dataset created by `--init`.
#[must_use]
pub fn uses_tpcb_dataset(source: &str) -> bool {
    source == TPCB_LIKE || source == MATCH_ONLY
}

fn builtin_text(source: &str) -> Option<&'static str> {
    match source {
        TPCB_LIKE => Some(TPCB_LIKE_SCRIPT),
        MATCH_ONLY => Some(MATCH_ONLY_SCRIPT),
        _ => None,
    }
}

/// A `-w` argument: a builtin name or a script path, optionally suffixed with `@weight`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadSpec {
    pub source: String,
    pub weight: u32,
}

impl FromStr for WorkloadSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        // Only an integer suffix is a weight; any other `@` belongs to the path.
        let Some((source, weight)) = s
            .rsplit_once('@')
            .filter(|(_, weight)| weight.parse::<i64>().is_ok())
        else {
            return Ok(Self {
                source: s.to_string(),
                weight: 1,
            });
        };
        match weight.parse::<u32>() {
            Ok(weight) if weight > 0 && !source.is_empty() => Ok(Self {
                source: source.to_string(),
                weight,
            }),
            _ => Err(Error::InvalidWeight(s.to_string())),
        }
    }
}

impl fmt::Display for WorkloadSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.weight == 1 {
            f.write_str(&self.source)
        } else {
            write!(f, "{}@{}", self.source, self.weight)
        }
    }
}

/// Reads and parses a workload from a builtin name or a file path.
pub fn load_script(spec: &WorkloadSpec) -> Result<Script> {
    if is_builtin(&spec.source) {
        let text = builtin_text(&spec.source).ok_or_else(|| Error::UnknownBuiltin(spec.source.clone()))?;
        return Ok(parser::parse(&spec.source, text, spec.weight)?);
    }

    let path = Path::new(&spec.source);
    let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: spec.source.clone(),
        source,
    })?;
    tracing::debug!(path = %path.display(), weight = spec.weight, "loaded workload script");
    Ok(parser::parse(&spec.source, &text, spec.weight)?)
}
