//! Insert.

use std::sync::Arc;

use tracing::debug;

use super::{OperatorBase, OperatorKind, PhysicalOperator};
use crate::catalog::TableMeta;
use crate::error::{ExecError, ExecResult};
use crate::storage::TableStorage;
use crate::tuple::TupleRef;
use crate::txn::Transaction;
use crate::value::Value;

/// Inserts literal rows into a table.
///
/// All rows are checked against the schema before the first one is
/// written, so a bad row leaves the table untouched. The work happens in
/// `open`; the operator produces no rows.
#[derive(Debug)]
pub struct InsertPhysicalOperator {
    base: OperatorBase,
    storage: Arc<dyn TableStorage>,
    table: Arc<TableMeta>,
    rows: Vec<Vec<Value>>,
    affected_rows: usize,
}

impl InsertPhysicalOperator {
    /// Creates an insert of `rows` into `table`.
    pub fn new(
        storage: Arc<dyn TableStorage>,
        table: Arc<TableMeta>,
        rows: Vec<Vec<Value>>,
    ) -> Self {
        Self {
            base: OperatorBase::new(),
            storage,
            table,
            rows,
            affected_rows: 0,
        }
    }

    /// Returns the number of rows written by the last `open`.
    pub fn affected_rows(&self) -> usize {
        self.affected_rows
    }

    /// Coerces one row to the column types, enforcing NOT NULL.
    fn check_row(&self, row: &[Value]) -> ExecResult<Vec<Value>> {
        if row.len() != self.table.field_num() {
            return Err(ExecError::invalid_argument(format!(
                "table {} has {} fields, got {} values",
                self.table.name,
                self.table.field_num(),
                row.len()
            )));
        }
        self.table
            .fields
            .iter()
            .zip(row)
            .map(|(field, value)| {
                if value.is_null() && !field.nullable {
                    return Err(ExecError::invalid_argument(format!(
                        "field {} of {} is not nullable",
                        field.name, self.table.name
                    )));
                }
                value.coerce_to(field.attr_type)
            })
            .collect()
    }
}

impl PhysicalOperator for InsertPhysicalOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Insert
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
        self.affected_rows = 0;
        let checked = self
            .rows
            .iter()
            .map(|row| self.check_row(row))
            .collect::<ExecResult<Vec<_>>>()?;
        for values in checked {
            self.storage.insert(&self.table, values, txn)?;
            self.affected_rows += 1;
        }
        debug!(table = %self.table.name, rows = self.affected_rows, "inserted rows");
        Ok(())
    }

    fn next(&mut self) -> ExecResult<bool> {
        Ok(false)
    }

    fn close(&mut self) -> ExecResult<()> {
        Ok(())
    }

    fn current_tuple(&self) -> Option<TupleRef<'_>> {
        None
    }
}
