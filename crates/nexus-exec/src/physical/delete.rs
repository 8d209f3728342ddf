//! Delete.

use std::sync::Arc;

use nexus_common::RecordId;
use tracing::debug;

use super::{child_tuple, OperatorBase, OperatorKind, PhysicalOperator};
use crate::catalog::TableMeta;
use crate::error::{ExecError, ExecResult};
use crate::storage::TableStorage;
use crate::tuple::TupleRef;
use crate::txn::Transaction;

/// Deletes every row its child produces.
///
/// The child must yield stored rows (each carrying a record id) and should
/// be marked with write intent so its fetches lock for writing. Record ids
/// are collected before the first delete. The work happens in `open`.
#[derive(Debug)]
pub struct DeletePhysicalOperator {
    base: OperatorBase,
    storage: Arc<dyn TableStorage>,
    table: Arc<TableMeta>,
    affected_rows: usize,
}

impl DeletePhysicalOperator {
    /// Creates a delete with no child.
    pub fn new(storage: Arc<dyn TableStorage>, table: Arc<TableMeta>) -> Self {
        Self {
            base: OperatorBase::new(),
            storage,
            table,
            affected_rows: 0,
        }
    }

    /// Returns the number of rows deleted by the last `open`.
    pub fn affected_rows(&self) -> usize {
        self.affected_rows
    }

    fn apply(&mut self, txn: &Transaction) -> ExecResult<()> {
        let mut rids: Vec<RecordId> = Vec::new();
        let child = self.base.child_mut(0)?;
        while child.next()? {
            let rid = child_tuple(child)?.record_id().ok_or_else(|| {
                ExecError::internal(format!("{} produced a row without a record id", child.name()))
            })?;
            rids.push(rid);
        }
        for rid in rids {
            self.storage.delete(&self.table, rid, txn)?;
            self.affected_rows += 1;
        }
        debug!(table = %self.table.name, rows = self.affected_rows, "deleted rows");
        Ok(())
    }
}

impl PhysicalOperator for DeletePhysicalOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Delete
    }

    fn param(&self) -> String {
        self.table.name.clone()
    }

    fn base(&self) -> &OperatorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OperatorBase {
        &mut self.base
    }

    fn open(&mut self, txn: &Transaction) -> ExecResult<()> {
        self.base.expect_children(OperatorKind::Delete, 1)?;
        self.affected_rows = 0;
        self.base.open_children(txn)?;
        if let Err(e) = self.apply(txn) {
            return Err(self.base.abort_open(e));
        }
        Ok(())
    }

    fn next(&mut self) -> ExecResult<bool> {
        Ok(false)
    }

    fn close(&mut self) -> ExecResult<()> {
        self.base.close_children()
    }

    fn current_tuple(&self) -> Option<TupleRef<'_>> {
        None
    }
}
