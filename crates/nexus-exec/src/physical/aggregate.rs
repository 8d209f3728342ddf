//! Aggregation without grouping.

use std::sync::Arc;

use super::{child_tuple, OperatorBase, OperatorKind, PhysicalOperator};
use crate::error::{ExecError, ExecResult};
use crate::logical::{AggregateExpr, AggregateFunc};
use crate::tuple::{RowTuple, TupleCellSpec, TupleRef};
use crate::txn::Transaction;
use crate::value::Value;

/// Running state of one aggregate.
#[derive(Debug, Clone)]
enum Accumulator {
    Count(i64),
    Sum { int: i64, float: f64, is_float: bool, seen: bool },
    Avg { sum: f64, count: i64 },
    Min(Option<Value>),
    Max(Option<Value>),
}

impl Accumulator {
    fn new(func: AggregateFunc) -> Self {
        match func {
            AggregateFunc::Count => Accumulator::Count(0),
            AggregateFunc::Sum => Accumulator::Sum {
                int: 0,
                float: 0.0,
                is_float: false,
                seen: false,
            },
            AggregateFunc::Avg => Accumulator::Avg { sum: 0.0, count: 0 },
            AggregateFunc::Min => Accumulator::Min(None),
            AggregateFunc::Max => Accumulator::Max(None),
        }
    }

    /// Folds in one input; `None` stands for `*`.
    fn update(&mut self, value: Option<Value>) -> ExecResult<()> {
        let value = match value {
            None => {
                if let Accumulator::Count(n) = self {
                    *n += 1;
                }
                return Ok(());
            }
            Some(Value::Null) => return Ok(()),
            Some(v) => v,
        };
        match self {
            Accumulator::Count(n) => *n += 1,
            Accumulator::Sum {
                int,
                float,
                is_float,
                seen,
            } => {
                *seen = true;
                match &value {
                    Value::Int(_) | Value::BigInt(_) if !*is_float => {
                        let v = value.to_i64().unwrap_or_default();
                        match int.checked_add(v) {
                            Some(total) => *int = total,
                            None => {
                                *is_float = true;
                                *float = *int as f64 + v as f64;
                            }
                        }
                    }
                    _ => {
                        let v = numeric(&value)?;
                        if !*is_float {
                            *is_float = true;
                            *float = *int as f64;
                        }
                        *float += v;
                    }
                }
            }
            Accumulator::Avg { sum, count } => {
                *sum += numeric(&value)?;
                *count += 1;
            }
            Accumulator::Min(current) => {
                if current.as_ref().map_or(true, |c| value < *c) {
                    *current = Some(value);
                }
            }
            Accumulator::Max(current) => {
                if current.as_ref().map_or(true, |c| value > *c) {
                    *current = Some(value);
                }
            }
        }
        Ok(())
    }

    fn finish(self) -> Value {
        match self {
            Accumulator::Count(n) => Value::BigInt(n),
            Accumulator::Sum { seen: false, .. } => Value::Null,
            Accumulator::Sum {
                float,
                is_float: true,
                ..
            } => Value::Double(float),
            Accumulator::Sum { int, .. } => Value::BigInt(int),
            Accumulator::Avg { count: 0, .. } => Value::Null,
            Accumulator::Avg { sum, count } => Value::Double(sum / count as f64),
            Accumulator::Min(v) | Accumulator::Max(v) => v.unwrap_or(Value::Null),
        }
    }
}

fn numeric(value: &Value) -> ExecResult<f64> {
    value
        .to_f64()
        .ok_or_else(|| ExecError::type_mismatch("numeric", value.type_name()))
}

/// Reduces all child rows to a single row of aggregates.
#[derive(Debug)]
pub struct AggregatePhysicalOperator {
    base: OperatorBase,
    aggregates: Vec<AggregateExpr>,
    buffer: RowTuple,
    done: bool,
    has_row: bool,
}

impl AggregatePhysicalOperator {
    /// Creates an aggregation with no child.
    pub fn new(aggregates: Vec<AggregateExpr>) -> ExecResult<Self> {
        if let Some(bad) = aggregates
            .iter()
            .find(|a| a.arg.is_none() && a.func != AggregateFunc::Count)
        {
            return Err(ExecError::invalid_argument(format!(
                "{} requires an argument",
                bad.func
            )));
        }
        let specs: Arc<[TupleCellSpec]> = aggregates
            .iter()
            .map(|a| TupleCellSpec::unqualified(a.output_name()))
            .collect();
        Ok(Self {
            base: OperatorBase::new(),
            aggregates,
            buffer: RowTuple::empty(specs),
            done: false,
            has_row: false,
        })
    }

    fn compute(&mut self) -> ExecResult<Vec<Value>> {
        let mut accs: Vec<Accumulator> =
            self.aggregates.iter().map(|a| Accumulator::new(a.func)).collect();
        let child = self.base.child_mut(0)?;
        while child.next()? {
            let tuple = child_tuple(child)?;
            for (acc, agg) in accs.iter_mut().zip(&self.aggregates) {
                let value = agg.arg.as_ref().map(|e| e.evaluate(&tuple)).transpose()?;
                acc.update(value)?;
            }
        }
        Ok(accs.into_iter().map(Accumulator::finish).collect())
    }
}

impl PhysicalOperator for AggregatePhysicalOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Aggregate
    }

    fn param(&self) -> String {
        self.aggregates
            .iter()
            .map(AggregateExpr::output_name)
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
        self.base.expect_children(OperatorKind::Aggregate, 1)?;
        self.done = false;
        self.has_row = false;
        self.base.open_children(txn)
    }

    fn next(&mut self) -> ExecResult<bool> {
        self.has_row = false;
        if self.done {
            return Ok(false);
        }
        self.done = true;
        let values = self.compute()?;
        self.buffer.set_values(values);
        self.has_row = true;
        Ok(true)
    }

    fn close(&mut self) -> ExecResult<()> {
        self.has_row = false;
        self.done = false;
        self.base.close_children()
    }

    fn current_tuple(&self) -> Option<TupleRef<'_>> {
        self.has_row.then(|| TupleRef::row(&self.buffer))
    }
}
