//! Inner join.
//!
//! Two strategies share one operator:
//!
//! - **Nested loop** handles any condition, or none (cross product). The
//!   right child is rewound with `close` + `open` for every left row.
//! - **Hash** handles a single `field = field` condition. `open` drains the
//!   left child into a hash table of owned row snapshots, then `next`
//!   streams the right child through it.
//!
//! Child operators may reuse one row buffer across `next()` calls, so the
//! build side copies every row it keeps.

use std::collections::HashMap;

use tracing::{debug, trace, warn};

use super::{child_tuple, BoxedOperator, OperatorBase, OperatorKind, PhysicalOperator};
use crate::error::{ExecError, ExecResult};
use crate::expr::{Expression, FieldRef};
use crate::tuple::{RowTuple, Tuple, TupleRef};
use crate::txn::Transaction;

/// How a join pairs its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinStrategy {
    /// Rescan the right input for every left row.
    NestedLoop,
    /// Build a hash table over the left input and probe it with the right.
    Hash,
}

impl JoinStrategy {
    /// Returns the name shown in EXPLAIN output.
    pub fn name(self) -> &'static str {
        match self {
            JoinStrategy::NestedLoop => "NESTED_LOOP",
            JoinStrategy::Hash => "HASH",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NestedLoopState {
    NotStarted,
    LeftActive,
    LeftExhausted,
}

/// Build side of a hash join plus the probe cursor.
#[derive(Debug, Default)]
struct HashTable {
    rows: Vec<RowTuple>,
    buckets: HashMap<String, Vec<usize>>,
    /// Join field evaluated against right rows.
    probe_field: Option<FieldRef>,
    /// Bucket key of the current right row.
    probe_key: Option<String>,
    /// Next position in that bucket.
    probe_pos: usize,
    /// Build row paired with the current right row.
    emitted: Option<usize>,
    done: bool,
}

/// Joins the rows of two children.
///
/// Output rows are the left row's cells followed by the right row's cells.
/// A hash join whose key fields cannot be split between the two inputs
/// runs as a nested loop instead.
#[derive(Debug)]
pub struct JoinPhysicalOperator {
    base: OperatorBase,
    strategy: JoinStrategy,
    /// Strategy used by the current `open`.
    active: JoinStrategy,
    condition: Option<Expression>,
    txn: Option<Transaction>,
    state: NestedLoopState,
    has_row: bool,
    table: HashTable,
}

impl JoinPhysicalOperator {
    /// Creates a join with no children; add exactly two before `open`.
    ///
    /// The hash strategy requires a `field = field` condition.
    pub fn new(strategy: JoinStrategy, condition: Option<Expression>) -> ExecResult<Self> {
        if strategy == JoinStrategy::Hash
            && condition.as_ref().and_then(Expression::as_equi_join).is_none()
        {
            return Err(ExecError::invalid_argument(match &condition {
                Some(cond) => format!("hash join needs a field = field condition, got {}", cond),
                None => "hash join needs a condition".to_string(),
            }));
        }
        Ok(Self {
            base: OperatorBase::new(),
            strategy,
            active: strategy,
            condition,
            txn: None,
            state: NestedLoopState::NotStarted,
            has_row: false,
            table: HashTable::default(),
        })
    }

    /// Creates a nested-loop join of `left` and `right`.
    pub fn nested_loop(
        left: BoxedOperator,
        right: BoxedOperator,
        condition: Option<Expression>,
    ) -> Self {
        Self {
            base: OperatorBase::with_children(vec![left, right]),
            strategy: JoinStrategy::NestedLoop,
            active: JoinStrategy::NestedLoop,
            condition,
            txn: None,
            state: NestedLoopState::NotStarted,
            has_row: false,
            table: HashTable::default(),
        }
    }

    /// Creates a hash join of `left` and `right` on a `field = field`
    /// condition.
    pub fn hash(
        left: BoxedOperator,
        right: BoxedOperator,
        condition: Expression,
    ) -> ExecResult<Self> {
        let mut join = Self::new(JoinStrategy::Hash, Some(condition))?;
        join.add_child(left);
        join.add_child(right);
        Ok(join)
    }

    /// Returns the join strategy.
    pub fn strategy(&self) -> JoinStrategy {
        self.strategy
    }

    /// Returns the join condition.
    pub fn condition(&self) -> Option<&Expression> {
        self.condition.as_ref()
    }

    fn reset(&mut self) {
        self.active = self.strategy;
        self.txn = None;
        self.state = NestedLoopState::NotStarted;
        self.has_row = false;
        self.table = HashTable::default();
    }

    /// Evaluates the condition against the current pair of child rows.
    fn pair_matches(&self) -> ExecResult<bool> {
        let Some(condition) = &self.condition else {
            return Ok(true);
        };
        let left = child_tuple(self.base.child(0)?)?;
        let right = child_tuple(self.base.child(1)?)?;
        condition
            .passes(&TupleRef::joined(left, right))
            .map_err(|e| {
                warn!(condition = %condition, error = %e, "failed to evaluate join condition");
                e
            })
    }

    fn next_nested_loop(&mut self) -> ExecResult<bool> {
        self.has_row = false;
        loop {
            match self.state {
                NestedLoopState::LeftExhausted => return Ok(false),
                NestedLoopState::NotStarted => {
                    if !self.base.child_mut(0)?.next()? {
                        self.state = NestedLoopState::LeftExhausted;
                        return Ok(false);
                    }
                    self.state = NestedLoopState::LeftActive;
                }
                NestedLoopState::LeftActive => {}
            }

            if self.base.child_mut(1)?.next()? {
                if self.pair_matches()? {
                    self.has_row = true;
                    return Ok(true);
                }
                continue;
            }

            if !self.base.child_mut(0)?.next()? {
                self.state = NestedLoopState::LeftExhausted;
                return Ok(false);
            }
            let txn = self
                .txn
                .as_ref()
                .ok_or_else(|| ExecError::internal("join used before open"))?;
            let right = self.base.child_mut(1)?;
            trace!(child = right.name(), "rewinding right input");
            right.close()?;
            right.open(txn)?;
        }
    }

    /// Drains the left child into the hash table.
    ///
    /// Returns false, with nothing built, when the first left row does not
    /// tell the key fields apart: both of them or neither resolve against it.
    fn build(&mut self, txn: &Transaction) -> ExecResult<bool> {
        let Some((l, r)) = self.condition.as_ref().and_then(Expression::as_equi_join) else {
            return Err(ExecError::internal("hash join without an equi-join condition"));
        };
        let (mut build_field, mut probe_field) = (l.clone(), r.clone());
        let mut oriented = false;
        let mut split = true;
        let table = &mut self.table;
        let left = self.base.child_mut(0)?;
        while left.next()? {
            let tuple = child_tuple(left)?;
            if !oriented {
                match (resolves(&tuple, &build_field)?, resolves(&tuple, &probe_field)?) {
                    (true, false) => {}
                    (false, true) => std::mem::swap(&mut build_field, &mut probe_field),
                    _ => {
                        split = false;
                        break;
                    }
                }
                oriented = true;
            }
            let Some(key) = tuple.find_cell(&build_field)?.join_key() else {
                // NULL never matches.
                continue;
            };
            let pos = table.rows.len();
            table.rows.push(tuple.to_row());
            table.buckets.entry(key).or_default().push(pos);
        }

        left.close()?;
        left.open(txn)?;
        if !split {
            return Ok(false);
        }

        table.probe_field = Some(probe_field);
        table.done = table.rows.is_empty();
        debug!(
            rows = table.rows.len(),
            keys = table.buckets.len(),
            "hash join build complete"
        );
        Ok(true)
    }

    fn next_hash(&mut self) -> ExecResult<bool> {
        self.table.emitted = None;
        if self.table.done {
            return Ok(false);
        }
        let table = &mut self.table;
        let right = self.base.child_mut(1)?;
        loop {
            if let Some(bucket) = table.probe_key.as_ref().and_then(|k| table.buckets.get(k)) {
                if let Some(&pos) = bucket.get(table.probe_pos) {
                    table.probe_pos += 1;
                    table.emitted = Some(pos);
                    return Ok(true);
                }
            }

            if !right.next()? {
                table.probe_key = None;
                table.done = true;
                return Ok(false);
            }
            let field = table
                .probe_field
                .as_ref()
                .ok_or_else(|| ExecError::internal("hash join probe field unresolved"))?;
            table.probe_key = child_tuple(right)?.find_cell(field)?.join_key();
            table.probe_pos = 0;
        }
    }
}

/// Returns whether `field` names a cell of `tuple`.
///
/// Decides which side of an equi-join condition belongs to the build input.
fn resolves(tuple: &TupleRef<'_>, field: &FieldRef) -> ExecResult<bool> {
    match tuple.find_cell(field) {
        Ok(_) => Ok(true),
        Err(e) if e.is_field_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

impl PhysicalOperator for JoinPhysicalOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Join
    }

    fn param(&self) -> String {
        match &self.condition {
            Some(cond) => format!("{}, {}", self.strategy.name(), cond),
            None => self.strategy.name().to_string(),
        }
    }

    fn base(&self) -> &OperatorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OperatorBase {
        &mut self.base
    }

    fn open(&mut self, txn: &Transaction) -> ExecResult<()> {
        self.base.expect_children(OperatorKind::Join, 2)?;
        self.reset();
        self.base.open_children(txn)?;
        self.txn = Some(txn.clone());

        if self.strategy == JoinStrategy::Hash {
            match self.build(txn) {
                Ok(true) => {}
                Ok(false) => {
                    debug!(
                        condition = ?self.condition,
                        "join keys do not split across inputs, using nested loop"
                    );
                    self.active = JoinStrategy::NestedLoop;
                }
                Err(e) => {
                    self.reset();
                    return Err(self.base.abort_open(e));
                }
            }
        }
        Ok(())
    }

    fn next(&mut self) -> ExecResult<bool> {
        if self.txn.is_none() {
            return Err(ExecError::internal("join used before open"));
        }
        match self.active {
            JoinStrategy::NestedLoop => self.next_nested_loop(),
            JoinStrategy::Hash => self.next_hash(),
        }
    }

    fn close(&mut self) -> ExecResult<()> {
        self.reset();
        self.base.close_children()
    }

    fn current_tuple(&self) -> Option<TupleRef<'_>> {
        let right = self.base.child(1).ok()?.current_tuple()?;
        let left = match self.active {
            JoinStrategy::NestedLoop if self.has_row => self.base.child(0).ok()?.current_tuple()?,
            JoinStrategy::Hash => TupleRef::row(self.table.rows.get(self.table.emitted?)?),
            JoinStrategy::NestedLoop => return None,
        };
        Some(TupleRef::joined(left, right))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::CompOp;
    use crate::physical::test_util::{collect_rows, int_row, RowsOperator};
    use crate::value::Value;

    fn txn() -> Transaction {
        Transaction::new(1)
    }

    fn on(left: (&str, &str), right: (&str, &str)) -> Expression {
        Expression::eq(
            Expression::field(left.0, left.1),
            Expression::field(right.0, right.1),
        )
    }

    fn sorted(mut rows: Vec<Vec<Value>>) -> Vec<Vec<Value>> {
        rows.sort();
        rows
    }

    #[test]
    fn test_cross_product_left_major() {
        let left = RowsOperator::ints("l", &["a"], &[&[1], &[2]]);
        let right = RowsOperator::ints("r", &["b"], &[&[10], &[20]]);
        let right_stats = right.stats();
        let mut join = JoinPhysicalOperator::nested_loop(left.boxed(), right.boxed(), None);

        join.open(&txn()).unwrap();
        let rows = collect_rows(&mut join).unwrap();
        assert_eq!(
            rows,
            vec![
                int_row(&[1, 10]),
                int_row(&[1, 20]),
                int_row(&[2, 10]),
                int_row(&[2, 20]),
            ]
        );
        // Opened once, rewound once.
        assert_eq!(right_stats.opens(), 2);
        join.close().unwrap();
    }

    #[test]
    fn test_nested_loop_inequality() {
        let left = RowsOperator::ints("l", &["a"], &[&[1], &[5], &[3]]);
        let right = RowsOperator::ints("r", &["b"], &[&[2], &[4]]);
        let cond = Expression::comparison(
            CompOp::Lt,
            Expression::field("l", "a"),
            Expression::field("r", "b"),
        );
        let mut join = JoinPhysicalOperator::nested_loop(left.boxed(), right.boxed(), Some(cond));
        assert_eq!(join.strategy(), JoinStrategy::NestedLoop);

        join.open(&txn()).unwrap();
        assert_eq!(
            collect_rows(&mut join).unwrap(),
            vec![int_row(&[1, 2]), int_row(&[1, 4]), int_row(&[3, 4])]
        );
    }

    #[test]
    fn test_hash_join_duplicate_keys() {
        let left = RowsOperator::new(
            "l",
            &["k", "x"],
            vec![
                vec![Value::int(1), Value::string("A")],
                vec![Value::int(1), Value::string("B")],
            ],
        );
        let right = RowsOperator::new("r", &["k", "y"], vec![vec![Value::int(1), Value::string("C")]]);
        let mut join =
            JoinPhysicalOperator::hash(left.boxed(), right.boxed(), on(("l", "k"), ("r", "k")))
                .unwrap();

        join.open(&txn()).unwrap();
        let rows = collect_rows(&mut join).unwrap();
        assert_eq!(
            rows,
            vec![
                vec![Value::int(1), Value::string("A"), Value::int(1), Value::string("C")],
                vec![Value::int(1), Value::string("B"), Value::int(1), Value::string("C")],
            ]
        );
        join.close().unwrap();
    }

    #[test]
    fn test_hash_join_condition_sides_swapped() {
        let left = RowsOperator::ints("l", &["k"], &[&[1], &[2], &[3]]);
        let right = RowsOperator::ints("r", &["k"], &[&[3], &[1], &[4]]);
        let mut join =
            JoinPhysicalOperator::hash(left.boxed(), right.boxed(), on(("r", "k"), ("l", "k")))
                .unwrap();

        join.open(&txn()).unwrap();
        assert_eq!(
            collect_rows(&mut join).unwrap(),
            vec![int_row(&[3, 3]), int_row(&[1, 1])]
        );
    }

    #[test]
    fn test_hash_matches_nested_loop() {
        let left_rows: &[&[i32]] = &[&[1, 10], &[2, 20], &[2, 21], &[5, 50]];
        let right_rows: &[&[i32]] = &[&[2, 7], &[5, 8], &[2, 9], &[6, 1]];
        let cond = on(("l", "k"), ("r", "k"));

        let mut hash = JoinPhysicalOperator::hash(
            RowsOperator::ints("l", &["k", "v"], left_rows).boxed(),
            RowsOperator::ints("r", &["k", "w"], right_rows).boxed(),
            cond.clone(),
        )
        .unwrap();
        let mut nested = JoinPhysicalOperator::nested_loop(
            RowsOperator::ints("l", &["k", "v"], left_rows).boxed(),
            RowsOperator::ints("r", &["k", "w"], right_rows).boxed(),
            Some(cond),
        );

        hash.open(&txn()).unwrap();
        nested.open(&txn()).unwrap();
        let hashed = sorted(collect_rows(&mut hash).unwrap());
        assert_eq!(hashed.len(), 5);
        assert_eq!(hashed, sorted(collect_rows(&mut nested).unwrap()));
    }

    #[test]
    fn test_hash_join_null_keys_never_match() {
        let left = RowsOperator::new("l", &["k"], vec![vec![Value::Null], vec![Value::int(1)]]);
        let right = RowsOperator::new("r", &["k"], vec![vec![Value::Null], vec![Value::int(1)]]);
        let mut join =
            JoinPhysicalOperator::hash(left.boxed(), right.boxed(), on(("l", "k"), ("r", "k")))
                .unwrap();

        join.open(&txn()).unwrap();
        assert_eq!(collect_rows(&mut join).unwrap(), vec![int_row(&[1, 1])]);
    }

    #[test]
    fn test_hash_join_empty_build_skips_probe() {
        let left = RowsOperator::ints("l", &["k"], &[]);
        let right = RowsOperator::ints("r", &["k"], &[&[1]]);
        let right_stats = right.stats();
        let mut join =
            JoinPhysicalOperator::hash(left.boxed(), right.boxed(), on(("l", "k"), ("r", "k")))
                .unwrap();

        join.open(&txn()).unwrap();
        assert!(!join.next().unwrap());
        assert_eq!(right_stats.nexts(), 0);
    }

    #[test]
    fn test_hash_join_missing_probe_field() {
        let left = RowsOperator::ints("l", &["k"], &[&[1]]);
        let right = RowsOperator::ints("r", &["other"], &[&[1]]);
        let mut join =
            JoinPhysicalOperator::hash(left.boxed(), right.boxed(), on(("l", "k"), ("r", "k")))
                .unwrap();

        join.open(&txn()).unwrap();
        let err = join.next().unwrap_err();
        assert!(err.is_field_not_found());
    }

    #[test]
    fn test_hash_join_build_failure_closes_children() {
        let left = RowsOperator::ints("l", &["k"], &[&[1], &[2]]).failing_next_at(2);
        let right = RowsOperator::ints("r", &["k"], &[&[1]]);
        let (left_stats, right_stats) = (left.stats(), right.stats());
        let mut join =
            JoinPhysicalOperator::hash(left.boxed(), right.boxed(), on(("l", "k"), ("r", "k")))
                .unwrap();

        assert!(join.open(&txn()).is_err());
        assert_eq!(left_stats.releases(), left_stats.opens());
        assert_eq!(right_stats.releases(), right_stats.opens());
        join.close().unwrap();
    }

    #[test]
    fn test_eof_is_sticky() {
        let left = RowsOperator::ints("l", &["a"], &[&[1]]);
        let right = RowsOperator::ints("r", &["b"], &[&[2]]);
        let (left_stats, right_stats) = (left.stats(), right.stats());
        let mut join = JoinPhysicalOperator::nested_loop(left.boxed(), right.boxed(), None);

        join.open(&txn()).unwrap();
        assert_eq!(collect_rows(&mut join).unwrap().len(), 1);
        let (left_nexts, right_nexts) = (left_stats.nexts(), right_stats.nexts());
        for _ in 0..3 {
            assert!(!join.next().unwrap());
            assert!(join.current_tuple().is_none());
        }
        assert_eq!(left_stats.nexts(), left_nexts);
        assert_eq!(right_stats.nexts(), right_nexts);
    }

    #[test]
    fn test_hash_join_eof_is_sticky() {
        let left = RowsOperator::ints("l", &["k"], &[&[1], &[2]]);
        let right = RowsOperator::ints("r", &["k"], &[&[2], &[3]]);
        let (left_stats, right_stats) = (left.stats(), right.stats());
        let mut join =
            JoinPhysicalOperator::hash(left.boxed(), right.boxed(), on(("l", "k"), ("r", "k")))
                .unwrap();

        join.open(&txn()).unwrap();
        assert_eq!(collect_rows(&mut join).unwrap(), vec![int_row(&[2, 2])]);
        let (left_nexts, right_nexts) = (left_stats.nexts(), right_stats.nexts());
        for _ in 0..3 {
            assert!(!join.next().unwrap());
            assert!(join.current_tuple().is_none());
        }
        assert_eq!(left_stats.nexts(), left_nexts);
        assert_eq!(right_stats.nexts(), right_nexts);
        join.close().unwrap();
    }

    fn run_join(mut join: JoinPhysicalOperator) -> Vec<Vec<Value>> {
        join.open(&txn()).unwrap();
        let rows = collect_rows(&mut join).unwrap();
        join.close().unwrap();
        rows
    }

    #[test]
    fn test_hash_join_keys_on_one_side_use_nested_loop() {
        let left = || RowsOperator::ints("l", &["a", "b"], &[&[1, 1], &[1, 2]]).boxed();
        let right = || RowsOperator::ints("r", &["a", "b"], &[&[5, 6]]).boxed();
        let cases = [
            (on(("l", "a"), ("l", "b")), vec![int_row(&[1, 1, 5, 6])]),
            (on(("r", "a"), ("r", "b")), vec![]),
            (
                Expression::eq(Expression::column("a"), Expression::column("a")),
                vec![int_row(&[1, 1, 5, 6]), int_row(&[1, 2, 5, 6])],
            ),
        ];

        for (cond, expected) in cases {
            let nested = run_join(JoinPhysicalOperator::nested_loop(
                left(),
                right(),
                Some(cond.clone()),
            ));
            let hashed = run_join(JoinPhysicalOperator::hash(left(), right(), cond.clone()).unwrap());
            assert_eq!(nested, expected, "nested loop on {}", cond);
            assert_eq!(hashed, expected, "hash on {}", cond);
        }
    }

    #[test]
    fn test_hash_join_fallback_rewinds_left() {
        let left = RowsOperator::ints("l", &["a", "b"], &[&[1, 1], &[2, 3], &[4, 4]]);
        let right = RowsOperator::ints("r", &["c"], &[&[7], &[8]]);
        let left_stats = left.stats();
        let mut join =
            JoinPhysicalOperator::hash(left.boxed(), right.boxed(), on(("l", "a"), ("l", "b")))
                .unwrap();

        join.open(&txn()).unwrap();
        // One open for the build attempt, one for the rewind.
        assert_eq!(left_stats.opens(), 2);
        assert_eq!(
            collect_rows(&mut join).unwrap(),
            vec![
                int_row(&[1, 1, 7]),
                int_row(&[1, 1, 8]),
                int_row(&[4, 4, 7]),
                int_row(&[4, 4, 8]),
            ]
        );
        assert_eq!(join.param(), "HASH, l.a = l.b");
        join.close().unwrap();
        assert_eq!(left_stats.releases(), left_stats.opens());
    }

    #[test]
    fn test_failed_open_then_close() {
        let left = RowsOperator::ints("l", &["a"], &[&[1]]);
        let right = RowsOperator::ints("r", &["b"], &[&[2]]).failing_open();
        let (left_stats, right_stats) = (left.stats(), right.stats());
        let mut join = JoinPhysicalOperator::nested_loop(left.boxed(), right.boxed(), None);

        assert!(join.open(&txn()).is_err());
        assert_eq!(left_stats.opens(), 1);
        assert_eq!(left_stats.releases(), 1);

        join.close().unwrap();
        assert_eq!(left_stats.releases(), 1);
        assert_eq!(right_stats.releases(), 0);
    }

    #[test]
    fn test_condition_error_aborts() {
        let left = RowsOperator::ints("l", &["a"], &[&[1]]);
        let right = RowsOperator::new("r", &["s"], vec![vec![Value::string("x")]]);
        let cond = Expression::comparison(
            CompOp::Lt,
            Expression::field("l", "a"),
            Expression::field("r", "s"),
        );
        let mut join = JoinPhysicalOperator::nested_loop(left.boxed(), right.boxed(), Some(cond));

        join.open(&txn()).unwrap();
        assert!(matches!(join.next(), Err(ExecError::TypeMismatch { .. })));
    }

    #[test]
    fn test_close_reaches_every_child() {
        let left = RowsOperator::ints("l", &["a"], &[&[1]]).failing_close();
        let right = RowsOperator::ints("r", &["b"], &[&[2]]);
        let right_stats = right.stats();
        let mut join = JoinPhysicalOperator::nested_loop(left.boxed(), right.boxed(), None);

        join.open(&txn()).unwrap();
        assert!(join.close().is_err());
        assert_eq!(right_stats.releases(), 1);
    }

    #[test]
    fn test_reopen_after_close() {
        let left = RowsOperator::ints("l", &["k"], &[&[1], &[2]]);
        let right = RowsOperator::ints("r", &["k"], &[&[2]]);
        let mut join =
            JoinPhysicalOperator::hash(left.boxed(), right.boxed(), on(("l", "k"), ("r", "k")))
                .unwrap();

        for _ in 0..2 {
            join.open(&txn()).unwrap();
            assert_eq!(collect_rows(&mut join).unwrap(), vec![int_row(&[2, 2])]);
            join.close().unwrap();
        }
    }

    #[test]
    fn test_construction_errors() {
        let cond = Expression::comparison(
            CompOp::Lt,
            Expression::field("l", "a"),
            Expression::field("r", "b"),
        );
        assert!(matches!(
            JoinPhysicalOperator::new(JoinStrategy::Hash, Some(cond)),
            Err(ExecError::InvalidArgument(_))
        ));
        assert!(JoinPhysicalOperator::new(JoinStrategy::Hash, None).is_err());

        let mut join = JoinPhysicalOperator::new(JoinStrategy::NestedLoop, None).unwrap();
        join.add_child(RowsOperator::ints("l", &["a"], &[]).boxed());
        assert!(join.open(&txn()).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_param() {
        let join = JoinPhysicalOperator::hash(
            RowsOperator::ints("l", &["k"], &[]).boxed(),
            RowsOperator::ints("r", &["k"], &[]).boxed(),
            on(("l", "k"), ("r", "k")),
        )
        .unwrap();
        assert_eq!(join.param(), "HASH, l.k = r.k");

        let join = JoinPhysicalOperator::nested_loop(
            RowsOperator::ints("l", &["k"], &[]).boxed(),
            RowsOperator::ints("r", &["k"], &[]).boxed(),
            None,
        );
        assert_eq!(join.param(), "NESTED_LOOP");
    }
}
