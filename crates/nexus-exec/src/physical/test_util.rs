//! Row-source operator for unit tests.
//!
//! Reuses one output buffer across `next()` calls like a real scan, counts
//! lifecycle calls through shared counters, and can be told to fail.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{OperatorBase, OperatorKind, PhysicalOperator};
use crate::error::{ExecError, ExecResult};
use crate::tuple::{RowTuple, TupleCellSpec, TupleRef};
use crate::txn::Transaction;
use crate::value::Value;

/// Lifecycle counters observable after the operator moved into a tree.
#[derive(Debug, Default)]
pub(crate) struct SourceStats {
    pub opens: AtomicUsize,
    /// Closes that released an open source.
    pub releases: AtomicUsize,
    pub nexts: AtomicUsize,
}

impl SourceStats {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn nexts(&self) -> usize {
        self.nexts.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub(crate) struct RowsOperator {
    base: OperatorBase,
    rows: Vec<Vec<Value>>,
    buffer: RowTuple,
    pos: usize,
    is_open: bool,
    has_row: bool,
    fail_open: bool,
    fail_next_at: Option<usize>,
    fail_close: bool,
    stats: Arc<SourceStats>,
}

impl RowsOperator {
    pub fn new(table: &str, names: &[&str], rows: Vec<Vec<Value>>) -> Self {
        let specs: Arc<[TupleCellSpec]> =
            names.iter().map(|n| TupleCellSpec::new(table, *n)).collect();
        Self {
            base: OperatorBase::new(),
            rows,
            buffer: RowTuple::empty(specs),
            pos: 0,
            is_open: false,
            has_row: false,
            fail_open: false,
            fail_next_at: None,
            fail_close: false,
            stats: Arc::new(SourceStats::default()),
        }
    }

    /// One integer column per name, one row per slice.
    pub fn ints(table: &str, names: &[&str], rows: &[&[i32]]) -> Self {
        let rows = rows
            .iter()
            .map(|r| r.iter().map(|v| Value::int(*v)).collect())
            .collect();
        Self::new(table, names, rows)
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn failing_next_at(mut self, call: usize) -> Self {
        self.fail_next_at = Some(call);
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn stats(&self) -> Arc<SourceStats> {
        self.stats.clone()
    }

    pub fn boxed(self) -> Box<dyn PhysicalOperator> {
        Box::new(self)
    }
}

impl PhysicalOperator for RowsOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::TableScan
    }

    fn param(&self) -> String {
        "rows".to_string()
    }

    fn base(&self) -> &OperatorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OperatorBase {
        &mut self.base
    }

    fn open(&mut self, _txn: &Transaction) -> ExecResult<()> {
        if self.fail_open {
            return Err(ExecError::internal("injected open failure"));
        }
        self.stats.opens.fetch_add(1, Ordering::SeqCst);
        self.pos = 0;
        self.has_row = false;
        self.is_open = true;
        Ok(())
    }

    fn next(&mut self) -> ExecResult<bool> {
        let call = self.stats.nexts.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.is_open {
            return Err(ExecError::internal("next on closed source"));
        }
        if self.fail_next_at == Some(call) {
            return Err(ExecError::internal("injected next failure"));
        }
        match self.rows.get(self.pos) {
            Some(row) => {
                self.buffer.set_values(row.clone());
                self.pos += 1;
                self.has_row = true;
                Ok(true)
            }
            None => {
                self.has_row = false;
                Ok(false)
            }
        }
    }

    fn close(&mut self) -> ExecResult<()> {
        if self.is_open {
            self.is_open = false;
            self.has_row = false;
            self.stats.releases.fetch_add(1, Ordering::SeqCst);
        }
        if self.fail_close {
            return Err(ExecError::internal("injected close failure"));
        }
        Ok(())
    }

    fn current_tuple(&self) -> Option<TupleRef<'_>> {
        self.has_row.then(|| TupleRef::row(&self.buffer))
    }
}

/// Drives an operator to exhaustion and returns every row as values.
pub(crate) fn collect_rows(op: &mut dyn PhysicalOperator) -> ExecResult<Vec<Vec<Value>>> {
    let mut out = Vec::new();
    while op.next()? {
        let tuple = op
            .current_tuple()
            .ok_or_else(|| ExecError::internal("missing tuple"))?;
        out.push(tuple.values().cloned().collect());
    }
    Ok(out)
}

/// Shorthand for a row of integers.
pub(crate) fn int_row(values: &[i32]) -> Vec<Value> {
    values.iter().map(|v| Value::int(*v)).collect()
}
