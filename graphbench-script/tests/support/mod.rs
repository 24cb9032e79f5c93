#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use graphbench_script::{Client, Environment, QueryRequest, ScriptSet, Transaction, WorkloadSpec};

pub fn scripts_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("scripts")
}

pub fn script_path(name: &str) -> String {
    scripts_dir().join(name).display().to_string()
}

pub fn workload(name: &str, weight: u32) -> WorkloadSpec {
    WorkloadSpec {
        source: script_path(name),
        weight,
    }
}

pub fn client_for(specs: &[WorkloadSpec], globals: &Environment, seed: u64) -> graphbench_script::Result<Client> {
    let scripts = specs
        .iter()
        .map(graphbench_script::load_script)
        .collect::<graphbench_script::Result<Vec<_>>>()?;
    let set = ScriptSet::new(scripts)?;
    Ok(Client::new(Arc::new(set), globals, seed))
}

pub fn scale(n: i64) -> Environment {
    [("scale", graphbench_script::Value::Int(n))].into_iter().collect()
}

pub fn expect_queries(tx: Transaction) -> Vec<QueryRequest> {
    match tx {
        Transaction::Queries(q) => q,
        other => panic!("expected queries, got {other:?}"),
    }
}
