use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use anyhow::Context as _;
use graphbench_testserver::TestServer;

fn script(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/scripts").join(name)
}

async fn run_against(server: &TestServer, extra: &[&str]) -> anyhow::Result<Output> {
    let exe = env!("CARGO_BIN_EXE_graphbench");
    let mut args = vec![
        "-a".to_string(),
        server.base_url().to_string(),
        "-p".to_string(),
        server.config().password.clone(),
        "-o".to_string(),
        "csv".to_string(),
        "--seed".to_string(),
        "1".to_string(),
    ];
    args.extend(extra.iter().map(|s| s.to_string()));

    let out = tokio::task::spawn_blocking(move || {
        Command::new(exe)
            .args(&args)
            .env_remove("GRAPHBENCH_PASSWORD")
            .env_remove("GRAPHBENCH_ADDRESS")
            .output()
    })
    .await
    .context("spawn_blocking join")?
    .context("run graphbench binary")?;

    anyhow::ensure!(
        out.status.success(),
        "exit {:?}\nstdout:\n{}\nstderr:\n{}",
        out.status.code(),
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr)
    );
    Ok(out)
}

fn columns(line: &str) -> Vec<&str> {
    line.split(',').collect()
}

#[tokio::test]
async fn throughput_run_reports_csv() -> anyhow::Result<()> {
    let server = TestServer::start().await?;
    let ok = script("ok.script").display().to_string();
    let out = run_against(&server, &["-w", &ok, "-c", "2", "-d", "1", "-D", "limit=3"]).await?;

    let stdout = String::from_utf8(out.stdout)?;
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "mode,scenario,succeeded,failed,rate_tps");
    let row = columns(lines[1]);
    assert_eq!(row[0], "throughput");
    assert!(row[1].contains("-c 2 -s 1 -d 1 -e auto"), "{row:?}");
    let succeeded: u64 = row[2].parse()?;
    assert!(succeeded > 0);
    assert_eq!(row[3], "0");
    assert_eq!(lines.len(), 2, "{stdout}");

    assert!(server.stats().commits_total() >= succeeded);
    assert!(
        server
            .stats()
            .statements()
            .iter()
            .all(|s| s == "MATCH (n:Node {id: $id}) RETURN n LIMIT $limit")
    );

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn latency_run_reports_percentiles() -> anyhow::Result<()> {
    let server = TestServer::start().await?;
    let ok = script("ok.script").display().to_string();
    let out = run_against(
        &server,
        &["-w", &ok, "-l", "-r", "40", "-c", "2", "-d", "1", "-D", "limit=1"],
    )
    .await?;

    let stdout = String::from_utf8(out.stdout)?;
    let lines: Vec<&str> = stdout.lines().collect();
    let header = columns(lines[0]);
    let row = columns(lines[1]);
    assert_eq!(header.len(), row.len());
    assert_eq!(row[0], "latency");
    assert!(row[1].ends_with("-l -r 40"), "{row:?}");

    // 40 tx/s for one second, give or take the slots in flight at the deadline.
    let succeeded: u64 = row[2].parse()?;
    assert!((30..=42).contains(&succeeded), "{succeeded}");
    let p99 = header.iter().position(|h| *h == "p99_ms").unwrap_or(usize::MAX);
    let p99: f64 = row[p99].parse()?;
    assert!(p99 > 0.0 && p99 < 1_000.0, "{p99}");

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn failed_transactions_are_grouped() -> anyhow::Result<()> {
    let server = TestServer::start().await?;
    let failing = script("failing.script").display().to_string();
    let out = run_against(&server, &["-w", &failing, "-d", "1"]).await?;

    let stdout = String::from_utf8(out.stdout)?;
    let lines: Vec<&str> = stdout.lines().collect();
    let row = columns(lines[1]);
    assert_eq!(row[2], "0");
    let failed: u64 = row[3].parse()?;
    assert!(failed > 0);

    let failure = columns(lines[2]);
    assert_eq!(failure[0], "failure");
    assert_eq!(failure[1].parse::<u64>()?, failed);
    assert_eq!(
        failure[3],
        "Neo.ClientError.Statement.SyntaxError: Invalid input 'FAIL'"
    );
    assert_eq!(lines.len(), 3, "{stdout}");

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn init_then_builtin_mix() -> anyhow::Result<()> {
    let server = TestServer::start().await?;
    run_against(
        &server,
        &["-i", "-d", "1", "-w", "builtin:tpcb-like@3", "-w", "builtin:match-only"],
    )
    .await?;

    let statements = server.stats().statements();
    assert!(statements[0].contains("DETACH DELETE"));
    assert!(statements.iter().any(|s| s.contains("CREATE (:History")));
    assert!(statements.iter().any(|s| s == "MATCH (account:Account {aid:$aid}) RETURN account.balance"));

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn file_workload_reads_sibling_csv() -> anyhow::Result<()> {
    let server = TestServer::start().await?;
    let dir = tempfile::Builder::new().prefix("bench@data").tempdir()?;
    std::fs::write(
        dir.path().join("people.csv"),
        "id,name\n1,alice\n2,\"bob, jr\"\n3,\"multi\nline\"\n",
    )?;
    let workload = dir.path().join("people.script");
    std::fs::write(
        &workload,
        "// rows come from the csv next to this file\n\
         :set rows csv(\"people.csv\")\n\
         :set n len(rows) - 1\n\
         MATCH (p:Person) WHERE p.id <= $n RETURN p; // one row per person\n",
    )?;

    let workload = workload.display().to_string();
    let out = run_against(&server, &["-w", &workload, "-d", "1"]).await?;

    let stdout = String::from_utf8(out.stdout)?;
    let lines: Vec<&str> = stdout.lines().collect();
    let row = columns(lines[1]);
    assert!(row[2].parse::<u64>()? > 0, "{stdout}");
    assert_eq!(row[3], "0", "{stdout}");
    assert!(
        server
            .stats()
            .statements()
            .iter()
            .all(|s| s == "MATCH (p:Person) WHERE p.id <= $n RETURN p")
    );

    server.shutdown().await;
    Ok(())
}
