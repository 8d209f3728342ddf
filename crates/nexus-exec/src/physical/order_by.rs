//! Sort.

use std::cmp::Ordering;

use tracing::debug;

use super::{child_tuple, OperatorBase, OperatorKind, PhysicalOperator};
use crate::error::ExecResult;
use crate::logical::OrderUnit;
use crate::tuple::{RowTuple, TupleRef};
use crate::txn::Transaction;
use crate::value::Value;

/// Sorts the child's rows.
///
/// The child is drained on the first `next()`; rows with equal keys keep
/// their input order. NULL sorts before every other value.
#[derive(Debug)]
pub struct OrderByPhysicalOperator {
    base: OperatorBase,
    units: Vec<OrderUnit>,
    rows: Vec<RowTuple>,
    pos: usize,
    sorted: bool,
}

impl OrderByPhysicalOperator {
    /// Creates a sort with no child.
    pub fn new(units: Vec<OrderUnit>) -> Self {
        Self {
            base: OperatorBase::new(),
            units,
            rows: Vec::new(),
            pos: 0,
            sorted: false,
        }
    }

    fn materialize(&mut self) -> ExecResult<()> {
        let mut keyed: Vec<(Vec<Value>, RowTuple)> = Vec::new();
        let child = self.base.child_mut(0)?;
        while child.next()? {
            let tuple = child_tuple(child)?;
            let key = self
                .units
                .iter()
                .map(|u| u.expr.evaluate(&tuple))
                .collect::<ExecResult<Vec<_>>>()?;
            keyed.push((key, tuple.to_row()));
        }

        let units = &self.units;
        keyed.sort_by(|(a, _), (b, _)| {
            for (unit, (x, y)) in units.iter().zip(a.iter().zip(b)) {
                let ord = if unit.ascending { x.cmp(y) } else { y.cmp(x) };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
        debug!(rows = keyed.len(), "sorted input");
        self.rows = keyed.into_iter().map(|(_, row)| row).collect();
        Ok(())
    }
}

impl PhysicalOperator for OrderByPhysicalOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::OrderBy
    }

    fn param(&self) -> String {
        self.units
            .iter()
            .map(|u| format!("{} {}", u.expr, if u.ascending { "ASC" } else { "DESC" }))
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
        self.base.expect_children(OperatorKind::OrderBy, 1)?;
        self.rows.clear();
        self.pos = 0;
        self.sorted = false;
        self.base.open_children(txn)
    }

    fn next(&mut self) -> ExecResult<bool> {
        if !self.sorted {
            self.materialize()?;
            self.sorted = true;
        }
        if self.pos < self.rows.len() {
            self.pos += 1;
            Ok(true)
        } else {
            self.pos = self.rows.len() + 1;
            Ok(false)
        }
    }

    fn close(&mut self) -> ExecResult<()> {
        self.rows.clear();
        self.pos = 0;
        self.sorted = false;
        self.base.close_children()
    }

    fn current_tuple(&self) -> Option<TupleRef<'_>> {
        let index = self.pos.checked_sub(1)?;
        self.rows.get(index).map(TupleRef::row)
    }
}
