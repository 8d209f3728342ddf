//! Tuples flowing between physical operators.
//!
//! Leaf operators own a [`RowTuple`] buffer and overwrite it on every
//! `next()`. Everything above them sees rows through [`TupleRef`], a borrowed
//! view made of one or more row segments. A join concatenates the views of
//! its two children without copying any values.
//!
//! A `TupleRef` borrows from the operator that produced it, so the borrow
//! checker rejects holding one across the producer's next `next()` call.
//! Anything that must outlive that call (the hash join build side, sort
//! input) takes an owned snapshot with [`TupleRef::to_row`].

use std::fmt;
use std::sync::Arc;

use nexus_common::RecordId;
use smallvec::SmallVec;

use crate::catalog::TableMeta;
use crate::error::{ExecError, ExecResult};
use crate::expr::FieldRef;
use crate::value::Value;

/// Describes one cell of a tuple: where it came from and how it is named.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TupleCellSpec {
    table: Option<String>,
    name: String,
}

impl TupleCellSpec {
    /// Creates a spec for a column of `table`.
    pub fn new(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            name: name.into(),
        }
    }

    /// Creates a spec for a computed cell with no source table.
    pub fn unqualified(name: impl Into<String>) -> Self {
        Self {
            table: None,
            name: name.into(),
        }
    }

    /// Returns the source table name, if any.
    pub fn table_name(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Returns the cell name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if `field` refers to this cell.
    ///
    /// An unqualified reference matches on name alone.
    pub fn matches(&self, field: &FieldRef) -> bool {
        if self.name != field.field_name() {
            return false;
        }
        match field.table_name() {
            Some(table) => self.table.as_deref() == Some(table),
            None => true,
        }
    }

    /// Builds the specs for every column of a table, qualified by `alias`.
    pub fn for_table(table: &TableMeta, alias: &str) -> Arc<[TupleCellSpec]> {
        table
            .fields
            .iter()
            .map(|f| TupleCellSpec::new(alias, f.name.clone()))
            .collect()
    }
}

impl fmt::Display for TupleCellSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{}.{}", table, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Positional and name-addressed access to the cells of a row.
pub trait Tuple {
    /// Returns the number of cells.
    fn cell_num(&self) -> usize;

    /// Returns the cell at `index`.
    fn cell_at(&self, index: usize) -> ExecResult<&Value>;

    /// Returns the spec of the cell at `index`.
    fn spec_at(&self, index: usize) -> ExecResult<&TupleCellSpec>;

    /// Finds the first cell that `field` refers to.
    fn find_cell(&self, field: &FieldRef) -> ExecResult<&Value> {
        for i in 0..self.cell_num() {
            if self.spec_at(i)?.matches(field) {
                return self.cell_at(i);
            }
        }
        Err(ExecError::FieldNotFound(field.to_string()))
    }
}

/// An owned row: values plus shared cell specs and an optional record id.
#[derive(Debug, Clone, PartialEq)]
pub struct RowTuple {
    specs: Arc<[TupleCellSpec]>,
    values: Vec<Value>,
    rid: Option<RecordId>,
}

impl RowTuple {
    /// Creates a row from specs and values.
    pub fn new(specs: Arc<[TupleCellSpec]>, values: Vec<Value>) -> Self {
        Self {
            specs,
            values,
            rid: None,
        }
    }

    /// Creates a reusable buffer with every cell NULL.
    pub fn empty(specs: Arc<[TupleCellSpec]>) -> Self {
        let values = vec![Value::Null; specs.len()];
        Self::new(specs, values)
    }

    /// Attaches the record id this row was read from.
    pub fn with_record_id(mut self, rid: RecordId) -> Self {
        self.rid = Some(rid);
        self
    }

    /// Overwrites this buffer with a freshly fetched record.
    pub fn set_record(&mut self, rid: RecordId, values: Vec<Value>) {
        self.rid = Some(rid);
        self.values = values;
    }

    /// Overwrites the values, keeping specs and clearing the record id.
    pub fn set_values(&mut self, values: Vec<Value>) {
        self.rid = None;
        self.values = values;
    }

    /// Returns the record id, if this row came from storage.
    pub fn record_id(&self) -> Option<RecordId> {
        self.rid
    }

    /// Returns the values.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns the cell specs.
    pub fn specs(&self) -> &Arc<[TupleCellSpec]> {
        &self.specs
    }

    /// Consumes the row and returns its values.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Borrows this row as a tuple view.
    pub fn as_tuple_ref(&self) -> TupleRef<'_> {
        TupleRef::row(self)
    }
}

impl Tuple for RowTuple {
    fn cell_num(&self) -> usize {
        self.values.len()
    }

    fn cell_at(&self, index: usize) -> ExecResult<&Value> {
        self.values.get(index).ok_or_else(|| {
            ExecError::internal(format!(
                "cell index {} out of range for {} cells",
                index,
                self.values.len()
            ))
        })
    }

    fn spec_at(&self, index: usize) -> ExecResult<&TupleCellSpec> {
        self.specs.get(index).ok_or_else(|| {
            ExecError::internal(format!(
                "spec index {} out of range for {} cells",
                index,
                self.specs.len()
            ))
        })
    }
}

impl fmt::Display for RowTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, ")")
    }
}

/// A borrowed view of one row, or of several rows laid side by side.
///
/// Cells are numbered left to right across segments.
#[derive(Debug, Clone)]
pub struct TupleRef<'a> {
    parts: SmallVec<[&'a RowTuple; 4]>,
}

impl<'a> TupleRef<'a> {
    /// Views a single row.
    pub fn row(row: &'a RowTuple) -> Self {
        let mut parts = SmallVec::new();
        parts.push(row);
        Self { parts }
    }

    /// Views `left` followed by `right`: the joined tuple.
    pub fn joined(left: TupleRef<'a>, right: TupleRef<'a>) -> Self {
        let mut parts = left.parts;
        parts.extend(right.parts);
        Self { parts }
    }

    /// Returns the underlying row segments.
    pub fn parts(&self) -> &[&'a RowTuple] {
        &self.parts
    }

    /// Returns the record id when this view is exactly one stored row.
    pub fn record_id(&self) -> Option<RecordId> {
        match self.parts.as_slice() {
            [row] => row.record_id(),
            _ => None,
        }
    }

    /// Iterates the values left to right.
    pub fn values(&self) -> impl Iterator<Item = &'a Value> + '_ {
        self.parts.iter().copied().flat_map(|p| p.values.iter())
    }

    /// Takes an owned snapshot that stays valid after the producer moves on.
    pub fn to_row(&self) -> RowTuple {
        match self.parts.as_slice() {
            [row] => (*row).clone(),
            parts => {
                let specs: Arc<[TupleCellSpec]> = parts
                    .iter()
                    .flat_map(|p| p.specs.iter().cloned())
                    .collect();
                let values = parts.iter().flat_map(|p| p.values.iter().cloned()).collect();
                RowTuple::new(specs, values)
            }
        }
    }

    fn locate(&self, mut index: usize) -> ExecResult<(&'a RowTuple, usize)> {
        for &part in &self.parts {
            if index < part.cell_num() {
                return Ok((part, index));
            }
            index -= part.cell_num();
        }
        Err(ExecError::internal(format!(
            "cell index out of range for {} cells",
            self.cell_num()
        )))
    }
}

impl Tuple for TupleRef<'_> {
    fn cell_num(&self) -> usize {
        self.parts.iter().map(|p| p.cell_num()).sum()
    }

    fn cell_at(&self, index: usize) -> ExecResult<&Value> {
        let (part, i) = self.locate(index)?;
        part.cell_at(i)
    }

    fn spec_at(&self, index: usize) -> ExecResult<&TupleCellSpec> {
        let (part, i) = self.locate(index)?;
        part.spec_at(i)
    }

    fn find_cell(&self, field: &FieldRef) -> ExecResult<&Value> {
        for part in &self.parts {
            match part.find_cell(field) {
                Err(ExecError::FieldNotFound(_)) => continue,
                found => return found,
            }
        }
        Err(ExecError::FieldNotFound(field.to_string()))
    }
}

impl fmt::Display for TupleRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, v) in self.values().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, ")")
    }
}
