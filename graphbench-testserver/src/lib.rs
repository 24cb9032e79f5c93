//! In-process stand-in for a graph database's transactional HTTP endpoint.
//!
//! Statement text drives the canned behavior, so tests can provoke each failure class from a
//! workload script:
//!
//! | statement contains | response                                         |
//! |--------------------|--------------------------------------------------|
//! | `FAIL`             | 200 with a `Neo.ClientError.Statement` error     |
//! | `DENY`             | 200 with a `Neo.ClientError.Security` error      |
//! | `CRASH`            | 500                                              |
//! | `SLOW`             | answers after [`SLOW_DELAY`]                     |
//! | anything else      | one row per statement echoing its parameters     |

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::{Duration, sleep};

pub const SLOW_DELAY: Duration = Duration::from_millis(200);
pub const SYNTAX_ERROR_CODE: &str = "Neo.ClientError.Statement.SyntaxError";
pub const FORBIDDEN_CODE: &str = "Neo.ClientError.Security.Forbidden";

#[derive(Debug, Clone)]
pub struct TestServerConfig {
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for TestServerConfig {
    fn default() -> Self {
        Self {
            user: "neo4j".to_string(),
            password: "secret".to_string(),
            database: "neo4j".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TestServerStats {
    requests_total: Arc<AtomicU64>,
    commits_total: Arc<AtomicU64>,
    statements: Arc<Mutex<Vec<String>>>,
}

impl TestServerStats {
    fn inc_requests_total(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    fn inc_commits_total(&self) {
        self.commits_total.fetch_add(1, Ordering::Relaxed);
    }

    fn push_statement(&self, text: &str) {
        self.statements
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(text.to_string());
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    /// Successful commit requests.
    pub fn commits_total(&self) -> u64 {
        self.commits_total.load(Ordering::Relaxed)
    }

    /// Every statement received, in arrival order.
    pub fn statements(&self) -> Vec<String> {
        self.statements
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[derive(Clone)]
struct AppState {
    config: Arc<TestServerConfig>,
    authorization: Arc<str>,
    stats: TestServerStats,
}

#[derive(Debug, Deserialize)]
struct CommitBody {
    #[serde(default)]
    statements: Vec<StatementBody>,
}

#[derive(Debug, Deserialize)]
struct StatementBody {
    statement: String,
    #[serde(default)]
    parameters: Value,
}

fn error_body(code: &str, message: &str) -> Value {
    json!({"results": [], "errors": [{"code": code, "message": message}]})
}

fn authorized(state: &AppState, headers: &HeaderMap) -> bool {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(&*state.authorization)
}

async fn handle_discovery(State(state): State<AppState>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    state.stats.inc_requests_total();
    if !authorized(&state, &headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(error_body("Neo.ClientError.Security.Unauthorized", "invalid credentials")),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "transaction": "/db/{databaseName}/tx",
            "neo4j_version": "5.0.0-testserver",
            "neo4j_edition": "community",
        })),
    )
}

async fn handle_commit(
    State(state): State<AppState>,
    Path(database): Path<String>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> (StatusCode, Json<Value>) {
    state.stats.inc_requests_total();
    if !authorized(&state, &headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(error_body("Neo.ClientError.Security.Unauthorized", "invalid credentials")),
        );
    }
    if database != state.config.database {
        return (
            StatusCode::NOT_FOUND,
            Json(error_body(
                "Neo.ClientError.Database.DatabaseNotFound",
                &format!("Database does not exist. Database name: '{database}'."),
            )),
        );
    }

    let commit: CommitBody = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(error_body("Neo.ClientError.Request.InvalidFormat", &e.to_string())),
            );
        }
    };

    let mut results = Vec::with_capacity(commit.statements.len());
    for stmt in &commit.statements {
        state.stats.push_statement(&stmt.statement);
        let text = stmt.statement.as_str();

        if text.contains("CRASH") {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(error_body("Neo.DatabaseError.General.UnknownError", "server crashed")),
            );
        }
        if text.contains("DENY") {
            return (
                StatusCode::OK,
                Json(error_body(FORBIDDEN_CODE, "access denied")),
            );
        }
        if text.contains("FAIL") {
            return (
                StatusCode::OK,
                Json(error_body(SYNTAX_ERROR_CODE, "Invalid input 'FAIL'")),
            );
        }
        if text.contains("SLOW") {
            sleep(SLOW_DELAY).await;
        }

        results.push(json!({
            "columns": ["parameters"],
            "data": [{"row": [stmt.parameters.clone()], "meta": [null]}],
        }));
    }

    state.stats.inc_commits_total();
    (StatusCode::OK, Json(json!({"results": results, "errors": []})))
}

pub fn router(config: TestServerConfig, stats: TestServerStats) -> Router {
    let credentials = BASE64.encode(format!("{}:{}", config.user, config.password));
    let state = AppState {
        authorization: Arc::from(format!("Basic {credentials}")),
        config: Arc::new(config),
        stats,
    };
    Router::new()
        .route("/", get(handle_discovery))
        .route("/db/{database}/tx/commit", post(handle_commit))
        .with_state(state)
}

pub struct TestServer {
    base_url: String,
    config: TestServerConfig,
    stats: TestServerStats,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> std::io::Result<Self> {
        Self::start_with(TestServerConfig::default()).await
    }

    pub async fn start_with(config: TestServerConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let stats = TestServerStats::default();
        let app = router(config.clone(), stats.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = serve.await;
        });

        Ok(Self {
            base_url: format!("http://{addr}"),
            config,
            stats,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn config(&self) -> &TestServerConfig {
        &self.config
    }

    pub fn stats(&self) -> &TestServerStats {
        &self.stats
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if self.shutdown_tx.is_some()
            && let Some(task) = self.task.take()
        {
            task.abort();
        }
    }
}
