//! Error taxonomy and result types for persistence operations.
//!
//! Every failure surfaced by this crate is a [`StoreError`]. Errors carry a
//! stable code (see [`codes`]) so callers can match on the condition without
//! parsing messages. Use [`StoreResult<T>`] as the return type for fallible
//! operations.

use bson::error::Error as BsonError;
use thiserror::Error;

/// Stable error codes carried by [`StoreError`] variants.
pub mod codes {
    /// The collection name is not configured.
    pub const NO_COLLECTION: &str = "NO_COLLECTION";
    /// The record schema is not set.
    pub const NO_SCHEMA: &str = "NO_SCHEMA";
    /// No connection manager is present where one is required.
    pub const NO_CONNECTION: &str = "NO_CONNECTION";
    /// The connection target has neither a URI nor a host.
    pub const NO_HOST: &str = "NO_HOST";
    /// A data operation was attempted before a successful open.
    pub const NOT_OPENED: &str = "NOT_OPENED";
    /// Connecting to or communicating with the store failed.
    pub const CONNECT_FAILED: &str = "CONNECT_FAILED";
    /// Closing the store connection failed.
    pub const DISCONNECT_FAILED: &str = "DISCONNECT_FAILED";
}

/// Represents all failures surfaced by connection managers and persistence
/// components.
///
/// The variants are kinds, not concrete backend errors: backend error detail
/// is carried as the cause string of [`StoreError::Connection`] and
/// [`StoreError::Disconnect`].
#[derive(Error, Debug)]
pub enum StoreError {
    /// Required configuration is missing or invalid.
    #[error("Configuration error [{code}]: {message}")]
    Config {
        code: &'static str,
        message: String,
    },
    /// An operation was attempted in a lifecycle state that does not allow it.
    #[error("Invalid state [{code}]: {message}")]
    InvalidState {
        code: &'static str,
        message: String,
    },
    /// Connecting to or communicating with the store failed.
    #[error("Connection failure [CONNECT_FAILED]: {message}{}", fmt_cause(.cause))]
    Connection {
        message: String,
        cause: Option<String>,
    },
    /// Closing the store connection failed.
    #[error("Disconnect failure [DISCONNECT_FAILED]: {message}{}", fmt_cause(.cause))]
    Disconnect {
        message: String,
        cause: Option<String>,
    },
    /// Converting a record between its public and internal form failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Creates a configuration error with the given code.
    pub fn config(code: &'static str, message: impl Into<String>) -> Self {
        StoreError::Config {
            code,
            message: message.into(),
        }
    }

    /// Creates an invalid-state error with the given code.
    pub fn invalid_state(code: &'static str, message: impl Into<String>) -> Self {
        StoreError::InvalidState {
            code,
            message: message.into(),
        }
    }

    /// Creates a connection failure with no underlying cause.
    pub fn connection(message: impl Into<String>) -> Self {
        StoreError::Connection {
            message: message.into(),
            cause: None,
        }
    }

    /// Creates a connection failure wrapping an underlying cause.
    pub fn connection_from(message: impl Into<String>, cause: impl ToString) -> Self {
        StoreError::Connection {
            message: message.into(),
            cause: Some(cause.to_string()),
        }
    }

    /// Creates a disconnect failure wrapping an underlying cause.
    pub fn disconnect_from(message: impl Into<String>, cause: impl ToString) -> Self {
        StoreError::Disconnect {
            message: message.into(),
            cause: Some(cause.to_string()),
        }
    }

    /// Returns the stable code for this error, if it carries one.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            StoreError::Config { code, .. } => Some(code),
            StoreError::InvalidState { code, .. } => Some(code),
            StoreError::Connection { .. } => Some(codes::CONNECT_FAILED),
            StoreError::Disconnect { .. } => Some(codes::DISCONNECT_FAILED),
            StoreError::Serialization(_) => None,
        }
    }

    /// Returns the underlying cause message, if one was captured.
    pub fn cause(&self) -> Option<&str> {
        match self {
            StoreError::Connection { cause, .. } => cause.as_deref(),
            StoreError::Disconnect { cause, .. } => cause.as_deref(),
            _ => None,
        }
    }
}

fn fmt_cause(cause: &Option<String>) -> String {
    match cause {
        Some(cause) => format!(": {cause}"),
        None => String::new(),
    }
}

/// A specialized `Result` type for persistence operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<BsonError> for StoreError {
    fn from(err: BsonError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
