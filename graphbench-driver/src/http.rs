use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use graphbench_value::QueryRequest;
use http_body_util::{BodyExt as _, Full};
use hyper::{Request, StatusCode};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;

use crate::driver::{Connection, Driver, TxOutcome};
use crate::error::{DATABASE_NOT_FOUND_CODE, DriverError, Result};
use crate::options::{ConnectOptions, EncryptionMode};
use crate::protocol;

/// Driver for the transactional HTTP endpoint.
///
/// Cheap to clone; all connections share one pooled hyper client.
#[derive(Debug, Clone)]
pub struct HttpDriver {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    root: hyper::Uri,
    commit: hyper::Uri,
    authorization: http::HeaderValue,
    request_timeout: Duration,
}

impl HttpDriver {
    pub fn new(opts: &ConnectOptions) -> Result<Self> {
        let base = resolve_base_url(&opts.address, opts.encryption)?;
        let commit = commit_url(&base, &opts.database)?;

        let mut http_connector = HttpConnector::new();
        http_connector.enforce_http(false);
        http_connector.set_connect_timeout(Some(opts.connect_timeout));

        let https_connector = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .wrap_connector(http_connector);

        let client = Client::builder(TokioExecutor::new()).build(https_connector);

        let credentials = BASE64.encode(format!("{}:{}", opts.user, opts.password));
        let mut authorization = http::HeaderValue::from_str(&format!("Basic {credentials}"))
            .map_err(|e| DriverError::InvalidAddress(format!("invalid credentials: {e}")))?;
        authorization.set_sensitive(true);

        Ok(Self {
            inner: Arc::new(Inner {
                client,
                root: parse_uri(base.as_str())?,
                commit: parse_uri(commit.as_str())?,
                authorization,
                request_timeout: opts.request_timeout,
            }),
        })
    }

    /// URI queries are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &hyper::Uri {
        &self.inner.commit
    }
}

impl Driver for HttpDriver {
    type Connection = HttpConnection;

    async fn connect(&self) -> Result<HttpConnection> {
        let req = Request::get(self.inner.root.clone())
            .header(http::header::AUTHORIZATION, self.inner.authorization.clone())
            .header(http::header::ACCEPT, "application/json")
            .body(Full::new(Bytes::new()))
            .map_err(|e| DriverError::InvalidAddress(e.to_string()))?;

        let (status, body) = self.inner.send(req).await?;
        check_status(status, &body)?;
        tracing::debug!(endpoint = %self.inner.commit, "connected");

        Ok(HttpConnection {
            inner: Arc::clone(&self.inner),
        })
    }
}

#[derive(Debug)]
pub struct HttpConnection {
    inner: Arc<Inner>,
}

impl Connection for HttpConnection {
    async fn execute(&mut self, queries: &[QueryRequest]) -> Result<TxOutcome> {
        let body = serde_json::to_vec(&protocol::CommitRequest::new(queries))
            .map_err(|e| DriverError::Encode(e.to_string()))?;

        let req = Request::post(self.inner.commit.clone())
            .header(http::header::AUTHORIZATION, self.inner.authorization.clone())
            .header(http::header::CONTENT_TYPE, "application/json")
            .header(http::header::ACCEPT, "application/json")
            .header(http::header::CONTENT_LENGTH, body.len())
            .body(Full::new(Bytes::from(body)))
            .map_err(|e| DriverError::Encode(e.to_string()))?;

        let (status, body) = self.inner.send(req).await?;
        check_status(status, &body)?;
        let rows = protocol::interpret_commit(&body)?;
        Ok(TxOutcome { rows })
    }
}

impl Inner {
    async fn send(&self, req: Request<Full<Bytes>>) -> Result<(StatusCode, Bytes)> {
        let exchange = async {
            let res = self
                .client
                .request(req)
                .await
                .map_err(|e| DriverError::Connect(error_chain(&e)))?;
            let (parts, body) = res.into_parts();
            let body = body
                .collect()
                .await
                .map_err(|e| DriverError::BodyRead(error_chain(&e)))?
                .to_bytes();
            Ok((parts.status, body))
        };

        match tokio::time::timeout(self.request_timeout, exchange).await {
            Ok(res) => res,
            Err(_) => Err(DriverError::Timeout(self.request_timeout)),
        }
    }
}

fn check_status(status: StatusCode, body: &[u8]) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }
    let code = status.as_u16();
    let message = protocol::error_message(body);
    Err(match code {
        401 | 403 => DriverError::Unauthorized {
            status: code,
            message,
        },
        404 if message.starts_with(DATABASE_NOT_FOUND_CODE) => DriverError::DatabaseNotFound(message),
        500..=599 => DriverError::Server {
            status: code,
            message,
        },
        _ => DriverError::Rejected {
            status: code,
            message,
        },
    })
}

/// Validates the address and applies the encryption override to its scheme.
pub(crate) fn resolve_base_url(address: &str, mode: EncryptionMode) -> Result<url::Url> {
    let mut url =
        url::Url::parse(address).map_err(|e| DriverError::InvalidAddress(format!("{address}: {e}")))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(DriverError::UnsupportedScheme(address.to_string()));
    }
    if url.host_str().is_none() {
        return Err(DriverError::InvalidAddress(format!("{address}: missing host")));
    }

    let scheme = match mode {
        EncryptionMode::Auto => None,
        EncryptionMode::On => Some("https"),
        EncryptionMode::Off => Some("http"),
    };
    if let Some(scheme) = scheme {
        url.set_scheme(scheme)
            .map_err(|()| DriverError::InvalidAddress(address.to_string()))?;
    }
    Ok(url)
}

fn commit_url(base: &url::Url, database: &str) -> Result<url::Url> {
    if database.is_empty() {
        return Err(DriverError::InvalidAddress("database name must not be empty".to_string()));
    }
    let mut commit = base.clone();
    commit
        .path_segments_mut()
        .map_err(|()| DriverError::InvalidAddress(base.to_string()))?
        .pop_if_empty()
        .extend(["db", database, "tx", "commit"]);
    Ok(commit)
}

fn parse_uri(s: &str) -> Result<hyper::Uri> {
    s.parse()
        .map_err(|e: http::uri::InvalidUri| DriverError::InvalidAddress(format!("{s}: {e}")))
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
