use std::path::{Path, PathBuf};

use ahash::AHashMap;
use graphbench_value::Value;

use crate::error::EvalError;

/// Per-client cache of CSV files read by `csv(path)`.
///
/// Files are read on first use and kept for the client's lifetime, so a script that calls
/// `csv(...)` on every iteration does not hit the filesystem after the first one.
#[derive(Debug, Default)]
pub struct CsvCache {
    files: AHashMap<PathBuf, Value>,
}

impl CsvCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `path`, resolving relative paths against `base_dir` (the script's directory).
    pub fn load(&mut self, path: &str, base_dir: Option<&Path>) -> Result<Value, EvalError> {
        let resolved = resolve(path, base_dir);
        if let Some(rows) = self.files.get(&resolved) {
            return Ok(rows.clone());
        }

        let text = std::fs::read_to_string(&resolved).map_err(|e| EvalError::File {
            path: resolved.display().to_string(),
            message: e.to_string(),
        })?;
        let rows = parse_csv(&text).map_err(|message| EvalError::File {
            path: resolved.display().to_string(),
            message,
        })?;

        tracing::debug!(path = %resolved.display(), rows = rows.len(), "loaded csv");
        let rows = Value::List(rows);
        self.files.insert(resolved, rows.clone());
        Ok(rows)
    }
}

fn resolve(path: &str, base_dir: Option<&Path>) -> PathBuf {
    let p = Path::new(path);
    match base_dir {
        Some(dir) if p.is_relative() => dir.join(p),
        _ => p.to_path_buf(),
    }
}

fn parse_csv(text: &str) -> Result<Vec<Value>, String> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| e.to_string())?;
        rows.push(Value::List(record.iter().map(field_value).collect()));
    }
    Ok(rows)
}

fn field_value(field: &str) -> Value {
    if let Ok(v) = field.parse::<i64>() {
        return Value::Int(v);
    }
    if let Ok(v) = field.parse::<f64>() {
        return Value::Float(v);
    }
    Value::string(field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_are_typed_and_quotes_respected() {
        let rows = parse_csv("1,2.5,alice\n\"x, y\",\"say \"\"hi\"\"\",\r\n").unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(
            rows,
            vec![
                Value::List(vec![Value::Int(1), Value::Float(2.5), Value::from("alice")]),
                Value::List(vec![
                    Value::from("x, y"),
                    Value::from("say \"hi\""),
                    Value::from("")
                ]),
            ]
        );
    }

    #[test]
    fn quoted_fields_may_span_lines() {
        let rows = parse_csv("\"line one\nline two\",1\n").unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(
            rows,
            vec![Value::List(vec![Value::from("line one\nline two"), Value::Int(1)])]
        );
    }

    #[test]
    fn leading_bom_is_dropped() {
        let rows = parse_csv("\u{feff}id,name\n1,x\n").unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(rows[0], Value::List(vec![Value::from("id"), Value::from("name")]));
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn ragged_rows_and_blank_lines_are_accepted() {
        let rows = parse_csv("1,2,3\n\n4\n").unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], Value::List(vec![Value::Int(4)]));
    }

    #[test]
    fn loads_relative_to_base_dir_and_caches() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let path = dir.path().join("ids.csv");
        std::fs::write(&path, "1\n2\n").unwrap_or_else(|e| panic!("{e}"));

        let mut cache = CsvCache::new();
        let first = cache
            .load("ids.csv", Some(dir.path()))
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(first.as_list().map(<[Value]>::len), Some(2));

        // Served from the cache once read.
        std::fs::remove_file(&path).unwrap_or_else(|e| panic!("{e}"));
        let second = cache
            .load("ids.csv", Some(dir.path()))
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(first, second);

        let err = cache.load("missing.csv", Some(dir.path()));
        assert!(matches!(err, Err(EvalError::File { .. })));
    }
}
