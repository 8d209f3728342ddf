//! Update.

use std::sync::Arc;

use nexus_common::RecordId;
use tracing::debug;

use super::{child_tuple, OperatorBase, OperatorKind, PhysicalOperator};
use crate::catalog::TableMeta;
use crate::error::{ExecError, ExecResult};
use crate::expr::Expression;
use crate::logical::UpdateAssignment;
use crate::storage::TableStorage;
use crate::tuple::TupleRef;
use crate::txn::Transaction;
use crate::value::Value;

/// One `SET` clause bound to a column position.
#[derive(Debug)]
struct BoundAssignment {
    position: usize,
    value: Expression,
}

/// Rewrites every row its child produces.
///
/// New values are computed from the old row and checked against the
/// column types for all rows before the first write. The work happens in
/// `open`.
#[derive(Debug)]
pub struct UpdatePhysicalOperator {
    base: OperatorBase,
    storage: Arc<dyn TableStorage>,
    table: Arc<TableMeta>,
    assignments: Vec<BoundAssignment>,
    affected_rows: usize,
}

impl UpdatePhysicalOperator {
    /// Creates an update with no child.
    ///
    /// Fails with `FieldNotFound` if an assignment names an unknown column.
    pub fn new(
        storage: Arc<dyn TableStorage>,
        table: Arc<TableMeta>,
        assignments: Vec<UpdateAssignment>,
    ) -> ExecResult<Self> {
        let assignments = assignments
            .into_iter()
            .map(|a| {
                let position = table.field_index(&a.field).ok_or_else(|| {
                    ExecError::FieldNotFound(format!("{}.{}", table.name, a.field))
                })?;
                Ok(BoundAssignment {
                    position,
                    value: a.value,
                })
            })
            .collect::<ExecResult<Vec<_>>>()?;
        Ok(Self {
            base: OperatorBase::new(),
            storage,
            table,
            assignments,
            affected_rows: 0,
        })
    }

    /// Returns the number of rows updated by the last `open`.
    pub fn affected_rows(&self) -> usize {
        self.affected_rows
    }

    fn new_values(&self, tuple: &TupleRef<'_>) -> ExecResult<Vec<Value>> {
        let mut values: Vec<Value> = tuple.values().cloned().collect();
        if values.len() != self.table.field_num() {
            return Err(ExecError::internal(format!(
                "update of {} got a row with {} cells",
                self.table.name,
                values.len()
            )));
        }
        for assignment in &self.assignments {
            let field = &self.table.fields[assignment.position];
            let value = assignment.value.evaluate(tuple)?;
            if value.is_null() && !field.nullable {
                return Err(ExecError::invalid_argument(format!(
                    "field {} of {} is not nullable",
                    field.name, self.table.name
                )));
            }
            values[assignment.position] = value.coerce_to(field.attr_type)?;
        }
        Ok(values)
    }

    fn apply(&mut self, txn: &Transaction) -> ExecResult<()> {
        let mut pending: Vec<(RecordId, Vec<Value>)> = Vec::new();
        loop {
            if !self.base.child_mut(0)?.next()? {
                break;
            }
            let child = self.base.child(0)?;
            let tuple = child_tuple(child)?;
            let rid = tuple.record_id().ok_or_else(|| {
                ExecError::internal(format!("{} produced a row without a record id", child.name()))
            })?;
            pending.push((rid, self.new_values(&tuple)?));
        }
        for (rid, values) in pending {
            self.storage.update(&self.table, rid, values, txn)?;
            self.affected_rows += 1;
        }
        debug!(table = %self.table.name, rows = self.affected_rows, "updated rows");
        Ok(())
    }
}

impl PhysicalOperator for UpdatePhysicalOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Update
    }

    fn param(&self) -> String {
        let sets: Vec<String> = self
            .assignments
            .iter()
            .map(|a| format!("{} = {}", self.table.fields[a.position].name, a.value))
            .collect();
        format!("{} SET {}", self.table.name, sets.join(", "))
    }

    fn base(&self) -> &OperatorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OperatorBase {
        &mut self.base
    }

    fn open(&mut self, txn: &Transaction) -> ExecResult<()> {
        self.base.expect_children(OperatorKind::Update, 1)?;
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
