#![forbid(unsafe_code)]

mod driver;
mod error;
mod http;
mod options;
mod protocol;

pub use driver::{Connection, Driver, TxOutcome};
pub use error::{
    DATABASE_NOT_FOUND_CODE, DriverError, ErrorClass, Result, SECURITY_ERROR_PREFIX,
    normalize_signature,
};
pub use http::{HttpConnection, HttpDriver};
pub use options::{ConnectOptions, EncryptionMode};
