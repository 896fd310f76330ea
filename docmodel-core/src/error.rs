//! Error types and result types for model and connection operations.
//!
//! Two kinds of failure exist in this crate:
//!
//! - [`DocumentStoreError`] is returned as `Err` and signals misuse (no connection,
//!   malformed URL or identifier) or a failure raised by the store driver.
//! - [`ValidationError`] never travels as `Err` out of a model operation. It is
//!   carried inside [`OperationResult`](crate::model::OperationResult) so callers can
//!   branch on rejected documents without treating them as exceptional.
//!
//! Use [`DocumentStoreResult<T>`] as the return type for fallible operations.

use bson::error::Error as BsonError;
use thiserror::Error;

/// Represents all errors that can be returned by connection and model operations.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// The store handle was requested before a connection was established.
    #[error("Connection not established, please connect to the database first")]
    ConnectionNotEstablished,
    /// The connection string does not have the `<scheme>://<authority>/<database>` shape.
    #[error("Invalid connection URL: {0}")]
    InvalidUrl(String),
    /// An identifier string is not a 24 character hex object id.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
    /// A filter or update document uses an operator the driver cannot evaluate.
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),
    /// Serialization error when converting between typed values and BSON documents.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during driver client construction.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// An error occurred in the underlying store driver.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for connection and model operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<BsonError> for DocumentStoreError {
    fn from(err: BsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

/// A document, or one element of a batch, was rejected by a validator.
///
/// `path` names the offending field when the validator knows it. Batch validation
/// prefixes the path with the index of the failing element.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub path: Option<String>,
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            path: None,
            message: message.into(),
        }
    }

    pub fn at(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            message: message.into(),
        }
    }

    /// Prepends `segment` to the error path (`name` becomes `segment.name`).
    pub fn within(mut self, segment: impl Into<String>) -> Self {
        let segment = segment.into();
        self.path = Some(match self.path.take() {
            Some(path) => format!("{segment}.{path}"),
            None => segment,
        });
        self
    }
}

/// Result of a validation step: the accepted (possibly transformed) value, or why it was rejected.
pub type ValidationOutcome<T> = Result<T, ValidationError>;
