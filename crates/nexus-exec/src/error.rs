//! Execution error types.
//!
//! End of data is not an error: `PhysicalOperator::next` reports it as
//! `Ok(false)`. Everything in this module aborts the query.

use nexus_common::{ErrorCode, NexusError};
use thiserror::Error;

use crate::storage::StorageError;

/// Errors raised while planning or executing a physical plan.
#[derive(Debug, Error)]
pub enum ExecError {
    /// Malformed input: bad predicate shape, wrong child arity, bad values.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A tuple does not carry the referenced field.
    #[error("field '{0}' not found in tuple")]
    FieldNotFound(String),

    /// The plan uses a feature this engine does not execute.
    #[error("not implemented: {0}")]
    Unimplemented(String),

    /// A value had the wrong type for the operation.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected type.
        expected: String,
        /// Actual type.
        actual: String,
    },

    /// Error reported by the storage collaborator.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Broken operator contract or other bug.
    #[error("internal error: {0}")]
    Internal(String),

    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for execution operations.
pub type ExecResult<T> = std::result::Result<T, ExecError>;

impl ExecError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        ExecError::InvalidArgument(message.into())
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ExecError::Internal(message.into())
    }

    /// Creates an unimplemented error.
    pub fn unimplemented(feature: impl Into<String>) -> Self {
        ExecError::Unimplemented(feature.into())
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        ExecError::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Returns the shared error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            ExecError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            ExecError::FieldNotFound(_) => ErrorCode::ColumnNotFound,
            ExecError::Unimplemented(_) => ErrorCode::Unimplemented,
            ExecError::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            ExecError::Storage(e) => e.code(),
            ExecError::Internal(_) => ErrorCode::Internal,
            ExecError::Config(_) => ErrorCode::InvalidArgument,
        }
    }

    /// Returns true if this error reports a missing field.
    pub fn is_field_not_found(&self) -> bool {
        matches!(self, ExecError::FieldNotFound(_))
    }

    /// Returns true if this error reports an unimplemented feature.
    pub fn is_unimplemented(&self) -> bool {
        matches!(self, ExecError::Unimplemented(_))
    }

    /// Returns true if this error reports malformed input.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, ExecError::InvalidArgument(_))
    }
}

impl From<ExecError> for NexusError {
    fn from(e: ExecError) -> Self {
        match e {
            ExecError::InvalidArgument(message) => NexusError::InvalidArgument { message },
            ExecError::FieldNotFound(column) => NexusError::ColumnNotFound { column },
            ExecError::Unimplemented(feature) => NexusError::Unimplemented { feature },
            ExecError::TypeMismatch { expected, actual } => {
                NexusError::TypeMismatch { expected, actual }
            }
            ExecError::Storage(e) => e.into(),
            ExecError::Internal(message) => NexusError::Internal { message },
            ExecError::Config(message) => NexusError::InvalidConfig { message },
        }
    }
}
