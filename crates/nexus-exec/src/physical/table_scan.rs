//! Full table scan.

use std::sync::Arc;

use super::scan::ScanCore;
use super::{OperatorBase, OperatorKind, PhysicalOperator};
use crate::catalog::TableMeta;
use crate::error::ExecResult;
use crate::expr::Expression;
use crate::storage::TableStorage;
use crate::tuple::TupleRef;
use crate::txn::Transaction;

/// Reads every row of a table, keeping those that pass all predicates.
#[derive(Debug)]
pub struct TableScanPhysicalOperator {
    base: OperatorBase,
    core: ScanCore,
}

impl TableScanPhysicalOperator {
    /// Creates a scan of `table`.
    pub fn new(storage: Arc<dyn TableStorage>, table: Arc<TableMeta>, readonly: bool) -> Self {
        Self {
            base: OperatorBase::new(),
            core: ScanCore::new(storage, table, readonly),
        }
    }

    /// Sets the name rows are qualified with.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.core.set_alias(alias.into());
        self
    }

    /// Sets the residual predicates.
    pub fn with_predicates(mut self, predicates: Vec<Expression>) -> Self {
        self.core.predicates = predicates;
        self
    }

    /// Returns the scanned table.
    pub fn table(&self) -> &TableMeta {
        &self.core.table
    }

    /// Returns the residual predicates.
    pub fn predicates(&self) -> &[Expression] {
        &self.core.predicates
    }

    /// Returns true if the scan only reads.
    pub fn readonly(&self) -> bool {
        self.core.readonly
    }
}

impl PhysicalOperator for TableScanPhysicalOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::TableScan
    }

    fn param(&self) -> String {
        if self.core.alias == self.core.table.name {
            self.core.alias.clone()
        } else {
            format!("{} AS {}", self.core.table.name, self.core.alias)
        }
    }

    fn base(&self) -> &OperatorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OperatorBase {
        &mut self.base
    }

    fn open(&mut self, txn: &Transaction) -> ExecResult<()> {
        let cursor = self.core.storage.scan(&self.core.table, txn)?;
        self.core.start(cursor, txn);
        Ok(())
    }

    fn next(&mut self) -> ExecResult<bool> {
        let is_delete = self.base.is_delete;
        self.core.advance(is_delete)
    }

    fn close(&mut self) -> ExecResult<()> {
        self.core.release();
        Ok(())
    }

    fn current_tuple(&self) -> Option<TupleRef<'_>> {
        self.core.current()
    }
}
