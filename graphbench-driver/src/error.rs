use std::time::Duration;

pub type Result<T> = std::result::Result<T, DriverError>;

/// Status codes with this prefix mean the session itself is unusable.
pub const SECURITY_ERROR_PREFIX: &str = "Neo.ClientError.Security.";
pub const DATABASE_NOT_FOUND_CODE: &str = "Neo.ClientError.Database.DatabaseNotFound";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorClass {
    /// The connection is gone or unusable; the worker must stop.
    Fatal,
    /// This transaction failed; the connection can keep going.
    Transactional,
}

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("unsupported address scheme in {0} (expected http:// or https://)")]
    UnsupportedScheme(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to read response body: {0}")]
    BodyRead(String),

    #[error("authentication failed (http {status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("server error (http {status}): {message}")]
    Server { status: u16, message: String },

    #[error("database not found: {0}")]
    DatabaseNotFound(String),

    #[error("request rejected (http {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("{code}: {message}")]
    Database { code: String, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("failed to encode request: {0}")]
    Encode(String),
}

impl DriverError {
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidAddress(_)
            | Self::UnsupportedScheme(_)
            | Self::Connect(_)
            | Self::Timeout(_)
            | Self::BodyRead(_)
            | Self::Unauthorized { .. }
            | Self::Server { .. }
            | Self::DatabaseNotFound(_) => ErrorClass::Fatal,
            Self::Database { code, .. }
                if code.starts_with(SECURITY_ERROR_PREFIX) || code == DATABASE_NOT_FOUND_CODE =>
            {
                ErrorClass::Fatal
            }
            Self::Database { .. }
            | Self::Rejected { .. }
            | Self::MalformedResponse(_)
            | Self::Encode(_) => ErrorClass::Transactional,
        }
    }

    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.class() == ErrorClass::Fatal
    }

    /// Stable grouping key: the message with surrounding and repeated whitespace collapsed.
    #[must_use]
    pub fn signature(&self) -> String {
        normalize_signature(&self.to_string())
    }
}

#[must_use]
pub fn normalize_signature(message: &str) -> String {
    message.split_whitespace().collect::<Vec<_>>().join(" ")
}
