//! Physical operators.
//!
//! Every node of an executable plan implements [`PhysicalOperator`], a
//! pull-based iterator:
//!
//! 1. `open(txn)` opens children and acquires cursors. It is atomic: if a
//!    later child fails to open, the children opened before it are closed
//!    before the error is returned.
//! 2. `next()` advances to the next row. `Ok(false)` means end of data, and
//!    stays `Ok(false)` on further calls.
//! 3. `current_tuple()` borrows the row produced by the last successful
//!    `next()`. It returns `None` before the first row, after end of data,
//!    and after `close()`.
//! 4. `close()` releases resources. It closes every child even when some
//!    fail, returns the first failure, and may be called on an operator
//!    that was never opened or whose `open` failed.

mod aggregate;
mod delete;
mod explain;
mod index_scan;
mod insert;
mod join;
mod order_by;
mod predicate;
mod project;
mod scan;
mod table_scan;
mod update;

#[cfg(test)]
pub(crate) mod test_util;

pub use aggregate::AggregatePhysicalOperator;
pub use delete::DeletePhysicalOperator;
pub use explain::{explain_tree, ExplainPhysicalOperator};
pub use index_scan::IndexScanPhysicalOperator;
pub use insert::InsertPhysicalOperator;
pub use join::{JoinPhysicalOperator, JoinStrategy};
pub use order_by::OrderByPhysicalOperator;
pub use predicate::PredicatePhysicalOperator;
pub use project::ProjectPhysicalOperator;
pub(crate) use project::output_spec;
pub use table_scan::TableScanPhysicalOperator;
pub use update::UpdatePhysicalOperator;

use std::fmt;

use tracing::warn;

use crate::error::{ExecError, ExecResult};
use crate::tuple::TupleRef;
use crate::txn::Transaction;

/// An owned, type-erased physical operator.
pub type BoxedOperator = Box<dyn PhysicalOperator>;

/// Kind of a physical operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    /// Full table scan.
    TableScan,
    /// Index range scan.
    IndexScan,
    /// Join.
    Join,
    /// Filter.
    Predicate,
    /// Projection.
    Project,
    /// Sort.
    OrderBy,
    /// Aggregation.
    Aggregate,
    /// Insert.
    Insert,
    /// Delete.
    Delete,
    /// Update.
    Update,
    /// Explain.
    Explain,
}

impl OperatorKind {
    /// Returns the name shown in EXPLAIN output.
    pub fn name(self) -> &'static str {
        match self {
            OperatorKind::TableScan => "TABLE_SCAN",
            OperatorKind::IndexScan => "INDEX_SCAN",
            OperatorKind::Join => "JOIN",
            OperatorKind::Predicate => "PREDICATE",
            OperatorKind::Project => "PROJECT",
            OperatorKind::OrderBy => "ORDER_BY",
            OperatorKind::Aggregate => "AGGREGATE",
            OperatorKind::Insert => "INSERT",
            OperatorKind::Delete => "DELETE",
            OperatorKind::Update => "UPDATE",
            OperatorKind::Explain => "EXPLAIN",
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The iterator contract shared by all physical operators.
///
/// An operator tree is driven by a single caller and is never shared
/// between threads while executing.
pub trait PhysicalOperator: Send + fmt::Debug {
    /// Returns the operator kind.
    fn kind(&self) -> OperatorKind;

    /// Returns the operator name shown in EXPLAIN output.
    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Returns the operator detail shown in EXPLAIN output.
    fn param(&self) -> String {
        String::new()
    }

    /// Returns the shared operator state.
    fn base(&self) -> &OperatorBase;

    /// Returns the shared operator state mutably.
    fn base_mut(&mut self) -> &mut OperatorBase;

    /// Prepares the operator for iteration.
    fn open(&mut self, txn: &Transaction) -> ExecResult<()>;

    /// Advances to the next row; `Ok(false)` at end of data.
    fn next(&mut self) -> ExecResult<bool>;

    /// Releases resources acquired by `open`.
    fn close(&mut self) -> ExecResult<()>;

    /// Borrows the current row.
    ///
    /// Valid only between a `next()` that returned `Ok(true)` and the
    /// following `next()` or `close()`; `None` outside that window.
    fn current_tuple(&self) -> Option<TupleRef<'_>>;

    /// Returns the children.
    fn children(&self) -> &[BoxedOperator] {
        &self.base().children
    }

    /// Appends a child.
    fn add_child(&mut self, child: BoxedOperator) {
        self.base_mut().children.push(child);
    }

    /// Returns true if the rows this operator reads will be modified.
    fn is_delete(&self) -> bool {
        self.base().is_delete
    }

    /// Marks whether the rows this operator reads will be modified.
    fn set_delete(&mut self, is_delete: bool) {
        self.base_mut().is_delete = is_delete;
    }
}

/// State every operator carries: its children and the write-intent flag.
#[derive(Debug, Default)]
pub struct OperatorBase {
    children: Vec<BoxedOperator>,
    is_delete: bool,
}

impl OperatorBase {
    /// Creates a base with no children.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a base owning `children`.
    pub fn with_children(children: Vec<BoxedOperator>) -> Self {
        Self {
            children,
            is_delete: false,
        }
    }

    /// Returns the child at `index`.
    pub fn child(&self, index: usize) -> ExecResult<&BoxedOperator> {
        self.children
            .get(index)
            .ok_or_else(|| ExecError::internal(format!("operator has no child {}", index)))
    }

    /// Returns the child at `index` mutably.
    pub fn child_mut(&mut self, index: usize) -> ExecResult<&mut BoxedOperator> {
        self.children
            .get_mut(index)
            .ok_or_else(|| ExecError::internal(format!("operator has no child {}", index)))
    }

    /// Fails unless there are exactly `expected` children.
    pub fn expect_children(&self, op: OperatorKind, expected: usize) -> ExecResult<()> {
        if self.children.len() != expected {
            return Err(ExecError::invalid_argument(format!(
                "{} expects {} children, got {}",
                op,
                expected,
                self.children.len()
            )));
        }
        Ok(())
    }

    /// Opens all children in order.
    ///
    /// If one fails, the children already opened are closed again before
    /// its error is returned.
    pub fn open_children(&mut self, txn: &Transaction) -> ExecResult<()> {
        for i in 0..self.children.len() {
            if let Err(e) = self.children[i].open(txn) {
                warn!(child = self.children[i].name(), error = %e, "failed to open child");
                for opened in self.children[..i].iter_mut().rev() {
                    if let Err(close_err) = opened.close() {
                        warn!(child = opened.name(), error = %close_err, "failed to close child");
                    }
                }
                return Err(e);
            }
        }
        Ok(())
    }

    /// Closes every child, returning the first error.
    pub fn close_children(&mut self) -> ExecResult<()> {
        let mut first_error = None;
        for child in &mut self.children {
            if let Err(e) = child.close() {
                warn!(child = child.name(), error = %e, "failed to close child");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Closes every child after a failure inside `open` and hands back `err`.
    pub fn abort_open(&mut self, err: ExecError) -> ExecError {
        if let Err(close_err) = self.close_children() {
            warn!(error = %close_err, "close after failed open also failed");
        }
        err
    }
}

/// Borrows the current row of a child, treating a missing row as a bug.
pub(crate) fn child_tuple(child: &BoxedOperator) -> ExecResult<TupleRef<'_>> {
    child.current_tuple().ok_or_else(|| {
        ExecError::internal(format!(
            "{} reported a row but has no current tuple",
            child.name()
        ))
    })
}
