//! Filter.

use super::{child_tuple, OperatorBase, OperatorKind, PhysicalOperator};
use crate::error::ExecResult;
use crate::expr::Expression;
use crate::tuple::TupleRef;
use crate::txn::Transaction;

/// Passes through the child rows for which the expression is true.
#[derive(Debug)]
pub struct PredicatePhysicalOperator {
    base: OperatorBase,
    expression: Expression,
    has_row: bool,
}

impl PredicatePhysicalOperator {
    /// Creates a filter with no child.
    pub fn new(expression: Expression) -> Self {
        Self {
            base: OperatorBase::new(),
            expression,
            has_row: false,
        }
    }

    /// Returns the filter expression.
    pub fn expression(&self) -> &Expression {
        &self.expression
    }
}

impl PhysicalOperator for PredicatePhysicalOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Predicate
    }

    fn param(&self) -> String {
        self.expression.to_string()
    }

    fn base(&self) -> &OperatorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OperatorBase {
        &mut self.base
    }

    fn open(&mut self, txn: &Transaction) -> ExecResult<()> {
        self.base.expect_children(OperatorKind::Predicate, 1)?;
        self.has_row = false;
        self.base.open_children(txn)
    }

    fn next(&mut self) -> ExecResult<bool> {
        self.has_row = false;
        let child = self.base.child_mut(0)?;
        while child.next()? {
            if self.expression.passes(&child_tuple(child)?)? {
                self.has_row = true;
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn close(&mut self) -> ExecResult<()> {
        self.has_row = false;
        self.base.close_children()
    }

    fn current_tuple(&self) -> Option<TupleRef<'_>> {
        if !self.has_row {
            return None;
        }
        self.base.child(0).ok()?.current_tuple()
    }
}
