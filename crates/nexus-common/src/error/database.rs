//! Database error types.
//!
//! `ErrorCode` is the stable classification every crate maps its own
//! errors onto. `NexusError` is the error surfaced at crate boundaries.

use std::fmt;
use thiserror::Error;

use crate::types::RecordId;

/// Error codes for categorizing errors.
///
/// These codes can be used for programmatic error handling and
/// are stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // General errors (0x0000 - 0x00FF)
    /// Internal error (bug).
    Internal = 0x0001,
    /// Invalid argument provided.
    InvalidArgument = 0x0003,
    /// Feature recognized but not implemented.
    Unimplemented = 0x0004,

    // Storage errors (0x0200 - 0x02FF)
    /// Record not found.
    RecordNotFound = 0x0200,
    /// Key not found.
    KeyNotFound = 0x0203,
    /// Key already exists.
    KeyExists = 0x0204,
    /// Storage access failed.
    StorageFailed = 0x0207,

    // Query errors (0x0600 - 0x06FF)
    /// Table not found.
    TableNotFound = 0x0601,
    /// Column not found.
    ColumnNotFound = 0x0602,
    /// Type mismatch.
    TypeMismatch = 0x0603,
}

impl ErrorCode {
    /// Returns the numeric code.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Returns the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match (*self as u16) >> 8 {
            0x00 => "General",
            0x02 => "Storage",
            0x06 => "Query",
            _ => "Other",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The boundary error type for NexusDB.
///
/// Crate-local errors convert into this type when they leave their crate.
///
/// # Example
///
/// ```rust
/// use nexus_common::error::{ErrorCode, NexusError};
///
/// let err = NexusError::unimplemented("group by");
/// assert_eq!(err.code(), ErrorCode::Unimplemented);
/// ```
#[derive(Debug, Error)]
pub enum NexusError {
    // ==========================================================================
    // General Errors
    // ==========================================================================
    /// Internal error - this indicates a bug.
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },

    /// Invalid argument provided.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Error message.
        message: String,
    },

    /// Feature recognized but not implemented.
    #[error("not implemented: {feature}")]
    Unimplemented {
        /// The missing feature.
        feature: String,
    },

    // ==========================================================================
    // Storage Errors
    // ==========================================================================
    /// Record not found.
    #[error("record {rid} not found")]
    RecordNotFound {
        /// The missing record.
        rid: RecordId,
    },

    /// Storage access failed.
    #[error("storage error: {message}")]
    Storage {
        /// Error message.
        message: String,
    },

    // ==========================================================================
    // Query Errors
    // ==========================================================================
    /// Table not found.
    #[error("table '{table}' not found")]
    TableNotFound {
        /// The missing table.
        table: String,
    },

    /// Column not found.
    #[error("column '{column}' not found")]
    ColumnNotFound {
        /// The missing column, qualified when the table is known.
        column: String,
    },

    /// Type mismatch.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected type.
        expected: String,
        /// Actual type.
        actual: String,
    },

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Error message.
        message: String,
    },
}

impl NexusError {
    /// Returns the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Internal { .. } => ErrorCode::Internal,
            Self::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            Self::Unimplemented { .. } => ErrorCode::Unimplemented,
            Self::RecordNotFound { .. } => ErrorCode::RecordNotFound,
            Self::Storage { .. } => ErrorCode::StorageFailed,
            Self::TableNotFound { .. } => ErrorCode::TableNotFound,
            Self::ColumnNotFound { .. } => ErrorCode::ColumnNotFound,
            Self::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            Self::InvalidConfig { .. } => ErrorCode::InvalidArgument,
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an unimplemented error.
    #[must_use]
    pub fn unimplemented(feature: impl Into<String>) -> Self {
        Self::Unimplemented {
            feature: feature.into(),
        }
    }
}
