//! Projection.

use std::sync::Arc;

use super::{child_tuple, OperatorBase, OperatorKind, PhysicalOperator};
use crate::error::{ExecError, ExecResult};
use crate::expr::Expression;
use crate::logical::ProjectExpr;
use crate::tuple::{RowTuple, TupleCellSpec, TupleRef};
use crate::txn::Transaction;

/// Computes output columns from each child row.
///
/// Without a child it produces exactly one row, for `SELECT 1 + 1` style
/// queries.
#[derive(Debug)]
pub struct ProjectPhysicalOperator {
    base: OperatorBase,
    expressions: Vec<ProjectExpr>,
    buffer: RowTuple,
    has_row: bool,
    constant_done: bool,
}

impl ProjectPhysicalOperator {
    /// Creates a projection with no child.
    pub fn new(expressions: Vec<ProjectExpr>) -> Self {
        let specs: Arc<[TupleCellSpec]> = expressions.iter().map(output_spec).collect();
        Self {
            base: OperatorBase::new(),
            expressions,
            buffer: RowTuple::empty(specs),
            has_row: false,
            constant_done: false,
        }
    }

    /// Returns the output columns.
    pub fn expressions(&self) -> &[ProjectExpr] {
        &self.expressions
    }
}

/// Names an output cell: the alias if given, else the source column keeps
/// its table so `t.a` still resolves above the projection.
pub(crate) fn output_spec(expr: &ProjectExpr) -> TupleCellSpec {
    match (&expr.alias, &expr.expr) {
        (Some(alias), _) => TupleCellSpec::unqualified(alias.clone()),
        (None, Expression::Field(field)) => match field.table_name() {
            Some(table) => TupleCellSpec::new(table, field.field_name()),
            None => TupleCellSpec::unqualified(field.field_name()),
        },
        (None, other) => TupleCellSpec::unqualified(other.output_name()),
    }
}

impl PhysicalOperator for ProjectPhysicalOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Project
    }

    fn param(&self) -> String {
        self.buffer
            .specs()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn base(&self) -> &OperatorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OperatorBase {
        &mut self.base
    }

    fn open(&mut self, txn: &Transaction) -> ExecResult<()> {
        if self.children().len() > 1 {
            return Err(ExecError::invalid_argument(format!(
                "PROJECT expects at most 1 child, got {}",
                self.children().len()
            )));
        }
        self.has_row = false;
        self.constant_done = false;
        self.base.open_children(txn)
    }

    fn next(&mut self) -> ExecResult<bool> {
        self.has_row = false;
        let values = if self.children().is_empty() {
            if self.constant_done {
                return Ok(false);
            }
            self.constant_done = true;
            let input = RowTuple::new(Arc::from(Vec::new()), Vec::new());
            self.expressions
                .iter()
                .map(|e| e.expr.evaluate(&input))
                .collect::<ExecResult<Vec<_>>>()?
        } else {
            let child = self.base.child_mut(0)?;
            if !child.next()? {
                return Ok(false);
            }
            let input = child_tuple(child)?;
            self.expressions
                .iter()
                .map(|e| e.expr.evaluate(&input))
                .collect::<ExecResult<Vec<_>>>()?
        };
        self.buffer.set_values(values);
        self.has_row = true;
        Ok(true)
    }

    fn close(&mut self) -> ExecResult<()> {
        self.has_row = false;
        self.base.close_children()
    }

    fn current_tuple(&self) -> Option<TupleRef<'_>> {
        self.has_row.then(|| TupleRef::row(&self.buffer))
    }
}
