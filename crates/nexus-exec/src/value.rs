//! Runtime values for query execution.
//!
//! `Value` is the typed scalar carried in tuples, literals, and index keys.
//! Equality, ordering, hashing, and the join key string all agree with each
//! other, so a hash join and a nested-loop join over the same equality
//! condition see exactly the same matches.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::catalog::AttrType;
use crate::error::{ExecError, ExecResult};

/// A runtime value during query execution.
#[derive(Debug, Clone)]
pub enum Value {
    /// NULL value.
    Null,
    /// Boolean value.
    Boolean(bool),
    /// 32-bit signed integer.
    Int(i32),
    /// 64-bit signed integer.
    BigInt(i64),
    /// 64-bit floating point.
    Double(f64),
    /// String value.
    String(String),
}

/// Numeric view used for cross-type comparisons.
#[derive(Debug, Clone, Copy)]
enum Numeric {
    Integer(i64),
    Float(f64),
}

impl Value {
    /// Creates a NULL value.
    pub fn null() -> Self {
        Value::Null
    }

    /// Creates a boolean value.
    pub fn boolean(v: bool) -> Self {
        Value::Boolean(v)
    }

    /// Creates an integer value.
    pub fn int(v: i32) -> Self {
        Value::Int(v)
    }

    /// Creates a bigint value.
    pub fn bigint(v: i64) -> Self {
        Value::BigInt(v)
    }

    /// Creates a double value.
    pub fn double(v: f64) -> Self {
        Value::Double(v)
    }

    /// Creates a string value.
    pub fn string(v: impl Into<String>) -> Self {
        Value::String(v.into())
    }

    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true only for boolean `true`.
    ///
    /// Filters emit a row only when their condition is exactly true;
    /// NULL and false both reject.
    pub fn is_true(&self) -> bool {
        matches!(self, Value::Boolean(true))
    }

    /// Converts this value to a boolean, if it is one.
    pub fn to_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Converts this value to an i64.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(i64::from(*i)),
            Value::BigInt(i) => Some(*i),
            Value::Double(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    /// Converts this value to an f64.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(f64::from(*i)),
            Value::BigInt(i) => Some(*i as f64),
            Value::Double(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the attribute type of this value, or `None` for NULL.
    pub fn attr_type(&self) -> Option<AttrType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(AttrType::Boolean),
            Value::Int(_) => Some(AttrType::Int),
            Value::BigInt(_) => Some(AttrType::BigInt),
            Value::Double(_) => Some(AttrType::Double),
            Value::String(_) => Some(AttrType::Text),
        }
    }

    /// Returns a short name of this value's type for error messages.
    pub fn type_name(&self) -> &'static str {
        self.attr_type().map_or("null", AttrType::name)
    }

    /// Converts this value for storage in a column of type `target`.
    ///
    /// Integers widen to bigint and double; every other pairing must match
    /// exactly. NULL passes through.
    pub fn coerce_to(&self, target: AttrType) -> ExecResult<Value> {
        match (self, target) {
            (Value::Null, _) => Ok(Value::Null),
            (Value::Int(i), AttrType::BigInt) => Ok(Value::BigInt(i64::from(*i))),
            (Value::Int(i), AttrType::Double) => Ok(Value::Double(f64::from(*i))),
            (Value::BigInt(i), AttrType::Double) => Ok(Value::Double(*i as f64)),
            (v, t) if v.attr_type() == Some(t) => Ok(v.clone()),
            (v, t) => Err(ExecError::type_mismatch(t.name(), v.type_name())),
        }
    }

    /// Returns the canonical join key of this value.
    ///
    /// Two non-null values have the same key exactly when they compare
    /// equal: numbers share the `n:` namespace regardless of width, so
    /// `Int(1)`, `BigInt(1)`, and `Double(1.0)` all map to `n:1`. NULL has
    /// no key and never matches anything.
    pub fn join_key(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Boolean(b) => Some(format!("b:{}", b)),
            Value::Int(i) => Some(format!("n:{}", i)),
            Value::BigInt(i) => Some(format!("n:{}", i)),
            Value::Double(f) => match integral(*f) {
                Some(i) => Some(format!("n:{}", i)),
                None => Some(format!("n:{}", f)),
            },
            Value::String(s) => Some(format!("s:{}", s)),
        }
    }

    /// Orders two values, or returns `None` when they are not comparable.
    ///
    /// NULL never compares. Numbers of any width compare with each other;
    /// other types compare only with themselves.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => None,
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (a, b) => match (a.numeric(), b.numeric()) {
                (Some(a), Some(b)) => Some(compare_numeric(a, b)),
                _ => None,
            },
        }
    }

    fn numeric(&self) -> Option<Numeric> {
        match self {
            Value::Int(i) => Some(Numeric::Integer(i64::from(*i))),
            Value::BigInt(i) => Some(Numeric::Integer(*i)),
            Value::Double(f) => Some(Numeric::Float(*f)),
            _ => None,
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Int(_) | Value::BigInt(_) | Value::Double(_) => 2,
            Value::String(_) => 3,
        }
    }
}

/// Returns the integer a double represents exactly, if any.
fn integral(f: f64) -> Option<i64> {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f) {
        Some(f as i64)
    } else {
        None
    }
}

fn compare_float(a: f64, b: f64) -> Ordering {
    // -0.0 and 0.0 are equal; NaN sorts last and equals itself.
    if a == b {
        Ordering::Equal
    } else {
        a.total_cmp(&b)
    }
}

fn compare_numeric(a: Numeric, b: Numeric) -> Ordering {
    match (a, b) {
        (Numeric::Integer(a), Numeric::Integer(b)) => a.cmp(&b),
        (Numeric::Float(a), Numeric::Float(b)) => compare_float(a, b),
        (Numeric::Integer(i), Numeric::Float(f)) => compare_integer_float(i, f),
        (Numeric::Float(f), Numeric::Integer(i)) => compare_integer_float(i, f).reverse(),
    }
}

fn compare_integer_float(i: i64, f: f64) -> Ordering {
    if f.is_nan() {
        return Ordering::Less;
    }
    match integral(f) {
        Some(fi) => i.cmp(&fi),
        None => compare_float(i as f64, f),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    /// Total order used for index keys and sorting.
    ///
    /// NULL sorts first, then booleans, numbers, and strings.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            _ => self
                .compare(other)
                .unwrap_or_else(|| self.type_rank().cmp(&other.type_rank())),
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.join_key().hash(state);
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::BigInt(i) => write!(f, "{}", i),
            Value::Double(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::BigInt(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_value_null() {
        let v = Value::null();
        assert!(v.is_null());
        assert!(!v.is_true());
        assert_eq!(v.join_key(), None);
        assert_eq!(v.compare(&Value::Null), None);
    }

    #[test]
    fn test_cross_type_numeric_equality() {
        assert_eq!(Value::int(10), Value::double(10.0));
        assert_eq!(Value::bigint(10), Value::int(10));
        assert!(Value::int(10) < Value::double(10.5));
        assert_ne!(Value::int(1), Value::boolean(true));
        assert_ne!(Value::int(1), Value::string("1"));
    }

    #[test]
    fn test_join_key_agrees_with_equality() {
        let values = [
            Value::int(1),
            Value::bigint(1),
            Value::double(1.0),
            Value::double(-0.0),
            Value::int(0),
            Value::double(1.5),
            Value::string("1"),
            Value::boolean(true),
        ];
        for a in &values {
            for b in &values {
                assert_eq!(
                    a == b,
                    a.join_key() == b.join_key(),
                    "{:?} vs {:?}",
                    a,
                    b
                );
            }
        }
    }

    #[test]
    fn test_join_key_format() {
        assert_eq!(Value::double(3.0).join_key().as_deref(), Some("n:3"));
        assert_eq!(Value::double(2.5).join_key().as_deref(), Some("n:2.5"));
        assert_eq!(Value::string("ab").join_key().as_deref(), Some("s:ab"));
        assert_eq!(Value::boolean(false).join_key().as_deref(), Some("b:false"));
    }

    #[test]
    fn test_total_order() {
        let mut values = vec![
            Value::string("a"),
            Value::int(3),
            Value::Null,
            Value::boolean(false),
            Value::double(-1.5),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::boolean(false),
                Value::double(-1.5),
                Value::int(3),
                Value::string("a"),
            ]
        );
    }

    #[test]
    fn test_large_integers_compare_exactly() {
        let big = (1i64 << 60) + 1;
        assert_ne!(Value::bigint(big), Value::double((1i64 << 60) as f64));
        assert!(Value::bigint(big) > Value::double((1i64 << 60) as f64));
    }

    #[test]
    fn test_coerce() {
        assert_eq!(
            Value::int(4).coerce_to(AttrType::Double).unwrap(),
            Value::double(4.0)
        );
        assert!(matches!(
            Value::int(4).coerce_to(AttrType::BigInt).unwrap(),
            Value::BigInt(4)
        ));
        assert!(Value::string("x").coerce_to(AttrType::Int).is_err());
        assert!(Value::Null.coerce_to(AttrType::Text).unwrap().is_null());
    }

    #[test]
    fn test_value_hash() {
        let mut map = HashMap::new();
        map.insert(Value::int(1), "one");
        map.insert(Value::string("two"), "two");

        assert_eq!(map.get(&Value::bigint(1)), Some(&"one"));
        assert_eq!(map.get(&Value::double(1.0)), Some(&"one"));
        assert_eq!(map.get(&Value::string("two")), Some(&"two"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::double(2.5).to_string(), "2.5");
        assert_eq!(Value::string("hi").to_string(), "hi");
    }
}
