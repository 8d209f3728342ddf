//! Transaction handle passed through `open`.
//!
//! Operators never look inside it; they hand it to storage, and the join
//! keeps a clone so it can rewind its right child.

use std::fmt;

use nexus_common::TxnId;

/// An opaque handle to the transaction a query runs in.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Transaction {
    id: TxnId,
}

impl Transaction {
    /// Creates a handle for transaction `id`.
    pub fn new(id: impl Into<TxnId>) -> Self {
        Self { id: id.into() }
    }

    /// Returns the transaction id.
    pub fn id(&self) -> TxnId {
        self.id
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transaction({})", self.id)
    }
}
