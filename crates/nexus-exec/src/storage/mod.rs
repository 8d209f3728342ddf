//! Storage collaborator interface.
//!
//! Physical scans reach rows only through [`TableStorage`]. A scan opens a
//! [`RecordCursor`] that yields record ids in order, then fetches each row
//! with a [`LockMode`] expressing read or write intent. Dropping a cursor
//! releases it.

mod memory;

pub use memory::{LockRequest, MemoryStorage, DEFAULT_LOCK_LOG_CAPACITY};

use std::cmp::Ordering;
use std::fmt;

use nexus_common::{ErrorCode, NexusError, RecordId};
use thiserror::Error;

use crate::catalog::{IndexMeta, TableMeta};
use crate::txn::Transaction;
use crate::value::Value;

/// Storage error type.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Table not found.
    #[error("table not found: {0}")]
    TableNotFound(String),
    /// Table already exists.
    #[error("table already exists: {0}")]
    TableExists(String),
    /// Index not found.
    #[error("index {index} not found on table {table}")]
    IndexNotFound {
        /// Table name.
        table: String,
        /// Index name.
        index: String,
    },
    /// Record not found.
    #[error("record not found: {0}")]
    RecordNotFound(RecordId),
    /// Row or index shape does not match the table.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),
    /// Storage engine error.
    #[error("storage engine error: {0}")]
    Engine(String),
}

impl StorageError {
    /// Returns the shared error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            StorageError::TableNotFound(_) => ErrorCode::TableNotFound,
            StorageError::TableExists(_) => ErrorCode::KeyExists,
            StorageError::IndexNotFound { .. } => ErrorCode::KeyNotFound,
            StorageError::RecordNotFound(_) => ErrorCode::RecordNotFound,
            StorageError::SchemaMismatch(_) => ErrorCode::InvalidArgument,
            StorageError::Engine(_) => ErrorCode::StorageFailed,
        }
    }
}

impl From<StorageError> for NexusError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::TableNotFound(table) => NexusError::TableNotFound { table },
            StorageError::RecordNotFound(rid) => NexusError::RecordNotFound { rid },
            other => NexusError::Storage {
                message: other.to_string(),
            },
        }
    }
}

/// Storage result type.
pub type StorageResult<T> = Result<T, StorageError>;

/// Lock intent attached to a row fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockMode {
    /// Read intent.
    Shared,
    /// Write intent: the row will be updated or deleted.
    Exclusive,
}

impl LockMode {
    /// Picks the lock mode for a scan.
    pub fn for_scan(readonly: bool) -> Self {
        if readonly {
            LockMode::Shared
        } else {
            LockMode::Exclusive
        }
    }
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockMode::Shared => write!(f, "SHARED"),
            LockMode::Exclusive => write!(f, "EXCLUSIVE"),
        }
    }
}

/// One end of an index key range.
///
/// `values` follows the index field order and may cover only a leading
/// prefix of the fields. An empty list leaves that end unbounded.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyBound {
    /// Key values, leading field first.
    pub values: Vec<Value>,
    /// Whether keys equal to the bound are inside the range.
    pub inclusive: bool,
}

impl KeyBound {
    /// Creates an inclusive bound.
    pub fn inclusive(values: Vec<Value>) -> Self {
        Self {
            values,
            inclusive: true,
        }
    }

    /// Creates an exclusive bound.
    pub fn exclusive(values: Vec<Value>) -> Self {
        Self {
            values,
            inclusive: false,
        }
    }

    fn compare(&self, key: &[Value]) -> Ordering {
        let len = self.values.len().min(key.len());
        key[..len].cmp(&self.values[..len])
    }
}

/// A composite key range over one index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeyRange {
    /// Lower end, `None` for unbounded.
    pub lower: Option<KeyBound>,
    /// Upper end, `None` for unbounded.
    pub upper: Option<KeyBound>,
}

impl KeyRange {
    /// The range covering every key.
    pub fn all() -> Self {
        Self::default()
    }

    /// The range covering exactly `values`.
    pub fn point(values: Vec<Value>) -> Self {
        Self {
            lower: Some(KeyBound::inclusive(values.clone())),
            upper: Some(KeyBound::inclusive(values)),
        }
    }

    /// Creates a range from optional ends.
    pub fn new(lower: Option<KeyBound>, upper: Option<KeyBound>) -> Self {
        Self { lower, upper }
    }

    /// Returns true if `key` sorts before the lower end.
    pub fn is_below(&self, key: &[Value]) -> bool {
        match &self.lower {
            Some(bound) if !bound.values.is_empty() => match bound.compare(key) {
                Ordering::Less => true,
                Ordering::Equal => !bound.inclusive,
                Ordering::Greater => false,
            },
            _ => false,
        }
    }

    /// Returns true if `key` sorts after the upper end.
    pub fn is_above(&self, key: &[Value]) -> bool {
        match &self.upper {
            Some(bound) if !bound.values.is_empty() => match bound.compare(key) {
                Ordering::Greater => true,
                Ordering::Equal => !bound.inclusive,
                Ordering::Less => false,
            },
            _ => false,
        }
    }

    /// Returns true if `key` lies inside the range.
    pub fn contains(&self, key: &[Value]) -> bool {
        !self.is_below(key) && !self.is_above(key)
    }
}

/// Iterator over record ids produced by a scan.
pub trait RecordCursor: Send + fmt::Debug {
    /// Returns the next record id, or `None` once exhausted.
    ///
    /// Keeps returning `None` after exhaustion.
    fn next_rid(&mut self) -> StorageResult<Option<RecordId>>;
}

/// Row storage with secondary indexes.
pub trait TableStorage: Send + Sync + fmt::Debug {
    /// Opens a cursor over every record of `table`, in record id order.
    fn scan(&self, table: &TableMeta, txn: &Transaction) -> StorageResult<Box<dyn RecordCursor>>;

    /// Opens a cursor over the records whose `index` key lies in `range`,
    /// in key order.
    fn index_scan(
        &self,
        table: &TableMeta,
        index: &IndexMeta,
        range: &KeyRange,
        txn: &Transaction,
    ) -> StorageResult<Box<dyn RecordCursor>>;

    /// Fetches a record with the given lock intent.
    ///
    /// Returns `None` if the record was removed after the cursor was opened.
    fn fetch(
        &self,
        table: &TableMeta,
        rid: RecordId,
        mode: LockMode,
        txn: &Transaction,
    ) -> StorageResult<Option<Vec<Value>>>;

    /// Inserts a record and returns its id.
    fn insert(
        &self,
        table: &TableMeta,
        values: Vec<Value>,
        txn: &Transaction,
    ) -> StorageResult<RecordId>;

    /// Replaces the values of a record.
    fn update(
        &self,
        table: &TableMeta,
        rid: RecordId,
        values: Vec<Value>,
        txn: &Transaction,
    ) -> StorageResult<()>;

    /// Deletes a record.
    fn delete(&self, table: &TableMeta, rid: RecordId, txn: &Transaction) -> StorageResult<()>;
}
