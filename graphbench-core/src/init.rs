use std::sync::Arc;

use graphbench_driver::{Connection, Driver, DriverError};
use graphbench_value::{MapValue, QueryRequest, Value};

use crate::config::BenchConfig;
use crate::error::{Error, Result};
use crate::progress::{ProgressFn, ProgressReport, report};

pub const BATCH_SIZE: i64 = 10_000;
pub const TELLERS_PER_BRANCH: i64 = 10;
pub const ACCOUNTS_PER_BRANCH: i64 = 100_000;

const SECTION: &str = "init";

const DROP_DATASET: &str =
    "MATCH (n) WHERE n:Branch OR n:Teller OR n:Account OR n:History DETACH DELETE n";

const SCHEMA: [&str; 3] = [
    "CREATE CONSTRAINT branch_bid IF NOT EXISTS FOR (b:Branch) REQUIRE b.bid IS UNIQUE",
    "CREATE CONSTRAINT teller_tid IF NOT EXISTS FOR (t:Teller) REQUIRE t.tid IS UNIQUE",
    "CREATE CONSTRAINT account_aid IF NOT EXISTS FOR (a:Account) REQUIRE a.aid IS UNIQUE",
];

const CREATE_BRANCHES: &str =
    "UNWIND range($from, $to) AS bid CREATE (:Branch {bid: bid, balance: 0})";
const CREATE_TELLERS: &str = "UNWIND range($from, $to) AS tid \
     CREATE (:Teller {tid: tid, bid: 1 + (tid - 1) / $per_branch, balance: 0})";
const CREATE_ACCOUNTS: &str = "UNWIND range($from, $to) AS aid \
     CREATE (:Account {aid: aid, bid: 1 + (aid - 1) / $per_branch, balance: 0})";

/// Creates the `tpcb-like` dataset if any configured workload runs against it.
///
/// Returns `false` when nothing needed initializing.
pub async fn initialize<D: Driver>(
    config: &BenchConfig,
    driver: &D,
    progress: Option<&ProgressFn>,
) -> Result<bool> {
    if !config.needs_dataset() {
        tracing::info!("no builtin workload needs a dataset; skipping init");
        return Ok(false);
    }
    let mut connection = driver.connect().await.map_err(|source| Error::Init {
        step: "connect",
        source,
    })?;
    init_tpcb_dataset(&mut connection, config.scale, progress).await?;
    Ok(true)
}

/// Drops any previous dataset, then creates `scale` branches, `10 * scale` tellers and
/// `100_000 * scale` accounts in batches of [`BATCH_SIZE`].
pub async fn init_tpcb_dataset<C: Connection>(
    connection: &mut C,
    scale: i64,
    progress: Option<&ProgressFn>,
) -> Result<()> {
    let accounts = scale
        .checked_mul(ACCOUNTS_PER_BRANCH)
        .filter(|_| scale >= 1)
        .ok_or(Error::InvalidScale(scale))?;
    tracing::info!(scale, "initializing tpcb-like dataset");

    report(progress, ProgressReport::new(SECTION, "drop", 0.0));
    exec(connection, "drop", DROP_DATASET, MapValue::new()).await?;

    report(progress, ProgressReport::new(SECTION, "schema", 0.0));
    for statement in SCHEMA {
        exec(connection, "schema", statement, MapValue::new()).await?;
    }

    let steps = [
        ("branches", CREATE_BRANCHES, scale, 1),
        ("tellers", CREATE_TELLERS, scale * TELLERS_PER_BRANCH, TELLERS_PER_BRANCH),
        ("accounts", CREATE_ACCOUNTS, accounts, ACCOUNTS_PER_BRANCH),
    ];
    let total: i64 = steps.iter().map(|(_, _, count, _)| count).sum();
    let mut done = 0i64;

    for (step, statement, count, per_branch) in steps {
        let mut from = 1;
        while from <= count {
            let to = (from + BATCH_SIZE - 1).min(count);
            let mut params = MapValue::new();
            params.insert(Arc::from("from"), Value::Int(from));
            params.insert(Arc::from("to"), Value::Int(to));
            params.insert(Arc::from("per_branch"), Value::Int(per_branch));
            exec(connection, step, statement, params).await?;

            done += to - from + 1;
            report(
                progress,
                ProgressReport::new(SECTION, step, done as f64 / total as f64),
            );
            from = to + 1;
        }
    }

    tracing::info!(nodes = total, "dataset ready");
    Ok(())
}

async fn exec<C: Connection>(
    connection: &mut C,
    step: &'static str,
    statement: &str,
    params: MapValue,
) -> Result<()> {
    let query = QueryRequest {
        text: Arc::from(statement),
        params,
    };
    connection
        .execute(std::slice::from_ref(&query))
        .await
        .map(drop)
        .map_err(|source: DriverError| Error::Init { step, source })
}
