//! JSON bodies of the transactional HTTP endpoint (`/db/{name}/tx/commit`).

use graphbench_value::{MapValue, QueryRequest};
use serde::{Deserialize, Serialize};

use crate::error::DriverError;

#[derive(Debug, Serialize)]
pub(crate) struct CommitRequest<'a> {
    pub statements: Vec<StatementBody<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StatementBody<'a> {
    pub statement: &'a str,
    pub parameters: &'a MapValue,
}

impl<'a> CommitRequest<'a> {
    pub(crate) fn new(queries: &'a [QueryRequest]) -> Self {
        Self {
            statements: queries
                .iter()
                .map(|q| StatementBody {
                    statement: &q.text,
                    parameters: &q.params,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CommitResponse {
    #[serde(default)]
    pub results: Vec<StatementResult>,
    #[serde(default)]
    pub errors: Vec<ErrorBody>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StatementResult {
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// Rows returned, or the first reported statement error.
pub(crate) fn interpret_commit(body: &[u8]) -> Result<u64, DriverError> {
    let parsed: CommitResponse = serde_json::from_slice(body)
        .map_err(|e| DriverError::MalformedResponse(e.to_string()))?;

    if let Some(err) = parsed.errors.into_iter().next() {
        return Err(DriverError::Database {
            code: err.code,
            message: err.message,
        });
    }

    Ok(parsed.results.iter().map(|r| r.data.len() as u64).sum())
}

/// Best-effort message from an error response body, falling back to the raw text.
pub(crate) fn error_message(body: &[u8]) -> String {
    if let Ok(parsed) = serde_json::from_slice::<CommitResponse>(body)
        && let Some(err) = parsed.errors.first()
    {
        return format!("{}: {}", err.code, err.message);
    }
    String::from_utf8_lossy(body).trim().to_string()
}
