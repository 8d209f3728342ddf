//! Predicate and projection expressions.
//!
//! `Expression` is a closed tree of field references, literals, comparisons,
//! and conjunctions. It is evaluated against any [`Tuple`] and inspected
//! structurally by the planner (see [`Expression::as_field_value_equality`]
//! and [`Expression::as_equi_join`]).

use std::cmp::Ordering;
use std::fmt;

use crate::error::{ExecError, ExecResult};
use crate::tuple::Tuple;
use crate::value::Value;

/// A reference to a column, optionally qualified by table name or alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    table: Option<String>,
    field: String,
}

impl FieldRef {
    /// Creates a qualified reference.
    pub fn new(table: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            field: field.into(),
        }
    }

    /// Creates an unqualified reference.
    pub fn unqualified(field: impl Into<String>) -> Self {
        Self {
            table: None,
            field: field.into(),
        }
    }

    /// Returns the table qualifier, if any.
    pub fn table_name(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Returns the column name.
    pub fn field_name(&self) -> &str {
        &self.field
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{}.{}", table, self.field),
            None => write!(f, "{}", self.field),
        }
    }
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompOp {
    /// `=`
    Eq,
    /// `<>`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
}

impl CompOp {
    /// Returns the operator that gives the same result with operands swapped.
    pub fn swap(self) -> Self {
        match self {
            CompOp::Lt => CompOp::Gt,
            CompOp::LtEq => CompOp::GtEq,
            CompOp::Gt => CompOp::Lt,
            CompOp::GtEq => CompOp::LtEq,
            op => op,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            CompOp::Eq => "=",
            CompOp::NotEq => "<>",
            CompOp::Lt => "<",
            CompOp::LtEq => "<=",
            CompOp::Gt => ">",
            CompOp::GtEq => ">=",
        }
    }

    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            CompOp::Eq => ordering == Ordering::Equal,
            CompOp::NotEq => ordering != Ordering::Equal,
            CompOp::Lt => ordering == Ordering::Less,
            CompOp::LtEq => ordering != Ordering::Greater,
            CompOp::Gt => ordering == Ordering::Greater,
            CompOp::GtEq => ordering != Ordering::Less,
        }
    }
}

impl fmt::Display for CompOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Conjunction kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConjunctionType {
    /// All children must hold.
    And,
    /// At least one child must hold.
    Or,
}

/// An expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Column reference.
    Field(FieldRef),
    /// Literal value.
    Value(Value),
    /// Binary comparison.
    Comparison {
        /// Operator.
        op: CompOp,
        /// Left operand.
        left: Box<Expression>,
        /// Right operand.
        right: Box<Expression>,
    },
    /// AND / OR over any number of children.
    Conjunction {
        /// Conjunction kind.
        kind: ConjunctionType,
        /// Operands.
        children: Vec<Expression>,
    },
}

impl Expression {
    /// Creates a qualified field reference.
    pub fn field(table: impl Into<String>, field: impl Into<String>) -> Self {
        Expression::Field(FieldRef::new(table, field))
    }

    /// Creates an unqualified field reference.
    pub fn column(field: impl Into<String>) -> Self {
        Expression::Field(FieldRef::unqualified(field))
    }

    /// Creates a literal.
    pub fn value(value: impl Into<Value>) -> Self {
        Expression::Value(value.into())
    }

    /// Creates a comparison.
    pub fn comparison(op: CompOp, left: Expression, right: Expression) -> Self {
        Expression::Comparison {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Creates `left = right`.
    pub fn eq(left: Expression, right: Expression) -> Self {
        Self::comparison(CompOp::Eq, left, right)
    }

    /// Creates an AND over `children`.
    pub fn and(children: Vec<Expression>) -> Self {
        Expression::Conjunction {
            kind: ConjunctionType::And,
            children,
        }
    }

    /// Creates an OR over `children`.
    pub fn or(children: Vec<Expression>) -> Self {
        Expression::Conjunction {
            kind: ConjunctionType::Or,
            children,
        }
    }

    /// Evaluates this expression against a tuple.
    ///
    /// Comparisons involving NULL yield NULL. Equality between values of
    /// unrelated types is false; ordering them is a type error. A missing
    /// field is `FieldNotFound`.
    pub fn evaluate<T: Tuple + ?Sized>(&self, tuple: &T) -> ExecResult<Value> {
        match self {
            Expression::Field(field) => tuple.find_cell(field).cloned(),
            Expression::Value(value) => Ok(value.clone()),
            Expression::Comparison { op, left, right } => {
                let l = left.evaluate(tuple)?;
                let r = right.evaluate(tuple)?;
                compare_values(*op, &l, &r)
            }
            Expression::Conjunction { kind, children } => {
                evaluate_conjunction(*kind, children, tuple)
            }
        }
    }

    /// Evaluates this expression as a filter: true only for boolean `true`.
    pub fn passes<T: Tuple + ?Sized>(&self, tuple: &T) -> ExecResult<bool> {
        Ok(self.evaluate(tuple)?.is_true())
    }

    /// Returns the field and literal of `field = literal` or `literal = field`.
    pub fn as_field_value_equality(&self) -> Option<(&FieldRef, &Value)> {
        match self {
            Expression::Comparison {
                op: CompOp::Eq,
                left,
                right,
            } => match (left.as_ref(), right.as_ref()) {
                (Expression::Field(f), Expression::Value(v))
                | (Expression::Value(v), Expression::Field(f)) => Some((f, v)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Returns both fields of a `field = field` condition.
    pub fn as_equi_join(&self) -> Option<(&FieldRef, &FieldRef)> {
        match self {
            Expression::Comparison {
                op: CompOp::Eq,
                left,
                right,
            } => match (left.as_ref(), right.as_ref()) {
                (Expression::Field(l), Expression::Field(r)) => Some((l, r)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Returns the name a projection of this expression is given by default.
    pub fn output_name(&self) -> String {
        match self {
            Expression::Field(field) => field.field_name().to_string(),
            other => other.to_string(),
        }
    }
}

fn compare_values(op: CompOp, l: &Value, r: &Value) -> ExecResult<Value> {
    if l.is_null() || r.is_null() {
        return Ok(Value::Null);
    }
    match l.compare(r) {
        Some(ordering) => Ok(Value::Boolean(op.accepts(ordering))),
        None => match op {
            CompOp::Eq => Ok(Value::Boolean(false)),
            CompOp::NotEq => Ok(Value::Boolean(true)),
            _ => Err(ExecError::type_mismatch(l.type_name(), r.type_name())),
        },
    }
}

fn evaluate_conjunction<T: Tuple + ?Sized>(
    kind: ConjunctionType,
    children: &[Expression],
    tuple: &T,
) -> ExecResult<Value> {
    // Three-valued logic: the deciding value short-circuits, NULL is sticky
    // otherwise.
    let deciding = kind == ConjunctionType::Or;
    let mut saw_null = false;
    for child in children {
        match child.evaluate(tuple)? {
            Value::Boolean(b) if b == deciding => return Ok(Value::Boolean(deciding)),
            Value::Boolean(_) => {}
            Value::Null => saw_null = true,
            other => return Err(ExecError::type_mismatch("BOOLEAN", other.type_name())),
        }
    }
    if saw_null {
        Ok(Value::Null)
    } else {
        Ok(Value::Boolean(!deciding))
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Field(field) => write!(f, "{}", field),
            Expression::Value(Value::String(s)) => write!(f, "'{}'", s),
            Expression::Value(value) => write!(f, "{}", value),
            Expression::Comparison { op, left, right } => {
                write!(f, "{} {} {}", left, op, right)
            }
            Expression::Conjunction { kind, children } => {
                let sep = match kind {
                    ConjunctionType::And => " AND ",
                    ConjunctionType::Or => " OR ",
                };
                write!(f, "(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(sep)?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuple::{RowTuple, TupleCellSpec};
    use std::sync::Arc;

    fn row() -> RowTuple {
        let specs: Arc<[TupleCellSpec]> = vec![
            TupleCellSpec::new("t", "a"),
            TupleCellSpec::new("t", "b"),
            TupleCellSpec::new("t", "c"),
        ]
        .into();
        RowTuple::new(
            specs,
            vec![Value::int(1), Value::string("x"), Value::Null],
        )
    }

    #[test]
    fn test_comparison() {
        let r = row();
        let e = Expression::eq(Expression::field("t", "a"), Expression::value(1));
        assert!(e.passes(&r).unwrap());

        let e = Expression::comparison(
            CompOp::Lt,
            Expression::field("t", "a"),
            Expression::value(0.5),
        );
        assert!(!e.passes(&r).unwrap());
    }

    #[test]
    fn test_null_comparison_is_null() {
        let r = row();
        let e = Expression::eq(Expression::field("t", "c"), Expression::value(1));
        assert!(e.evaluate(&r).unwrap().is_null());
        assert!(!e.passes(&r).unwrap());
    }

    #[test]
    fn test_incomparable_types() {
        let r = row();
        let eq = Expression::eq(Expression::field("t", "b"), Expression::value(1));
        assert_eq!(eq.evaluate(&r).unwrap(), Value::boolean(false));

        let lt = Expression::comparison(
            CompOp::Lt,
            Expression::field("t", "b"),
            Expression::value(1),
        );
        assert!(matches!(
            lt.evaluate(&r),
            Err(ExecError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_field() {
        let r = row();
        let e = Expression::eq(Expression::field("u", "a"), Expression::value(1));
        assert!(e.evaluate(&r).unwrap_err().is_field_not_found());
    }

    #[test]
    fn test_conjunction_three_valued() {
        let r = row();
        let t = Expression::eq(Expression::column("a"), Expression::value(1));
        let f = Expression::eq(Expression::column("a"), Expression::value(2));
        let n = Expression::eq(Expression::column("c"), Expression::value(2));

        assert!(Expression::and(vec![t.clone(), t.clone()]).passes(&r).unwrap());
        assert_eq!(
            Expression::and(vec![n.clone(), f.clone()]).evaluate(&r).unwrap(),
            Value::boolean(false)
        );
        assert!(Expression::and(vec![t.clone(), n.clone()])
            .evaluate(&r)
            .unwrap()
            .is_null());
        assert!(Expression::or(vec![n.clone(), t]).passes(&r).unwrap());
        assert!(Expression::or(vec![f, n]).evaluate(&r).unwrap().is_null());
        assert!(Expression::and(vec![]).passes(&r).unwrap());
    }

    #[test]
    fn test_shape_extraction() {
        let fv = Expression::eq(Expression::value(3), Expression::field("t", "a"));
        let (field, value) = fv.as_field_value_equality().unwrap();
        assert_eq!(field, &FieldRef::new("t", "a"));
        assert_eq!(value, &Value::int(3));
        assert!(fv.as_equi_join().is_none());

        let ff = Expression::eq(Expression::field("l", "k"), Expression::field("r", "k"));
        assert!(ff.as_equi_join().is_some());
        assert!(ff.as_field_value_equality().is_none());

        let lt = Expression::comparison(
            CompOp::Lt,
            Expression::field("l", "k"),
            Expression::field("r", "k"),
        );
        assert!(lt.as_equi_join().is_none());
        assert!(Expression::and(vec![ff]).as_equi_join().is_none());
    }

    #[test]
    fn test_display() {
        let e = Expression::and(vec![
            Expression::eq(Expression::field("t", "a"), Expression::value(1)),
            Expression::comparison(
                CompOp::GtEq,
                Expression::column("b"),
                Expression::value("x"),
            ),
        ]);
        assert_eq!(e.to_string(), "(t.a = 1 AND b >= 'x')");
        assert_eq!(CompOp::Lt.swap(), CompOp::Gt);
    }
}
