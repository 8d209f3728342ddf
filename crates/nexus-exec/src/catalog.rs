//! Table and index descriptors.
//!
//! Descriptors are immutable while a plan is generated and executed, and are
//! shared between the planner, operators, and storage through `Arc`.

use std::fmt;
use std::sync::Arc;

/// Column attribute type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrType {
    /// Boolean column.
    Boolean,
    /// 32-bit integer column.
    Int,
    /// 64-bit integer column.
    BigInt,
    /// Double precision column.
    Double,
    /// Variable length text column.
    Text,
}

impl AttrType {
    /// Returns the SQL name of this type.
    pub fn name(self) -> &'static str {
        match self {
            AttrType::Boolean => "BOOLEAN",
            AttrType::Int => "INT",
            AttrType::BigInt => "BIGINT",
            AttrType::Double => "DOUBLE",
            AttrType::Text => "TEXT",
        }
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A column of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMeta {
    /// Column name.
    pub name: String,
    /// Column type.
    pub attr_type: AttrType,
    /// Whether NULL is accepted.
    pub nullable: bool,
}

impl FieldMeta {
    /// Creates a nullable column.
    pub fn new(name: impl Into<String>, attr_type: AttrType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            nullable: true,
        }
    }

    /// Creates a column that rejects NULL.
    pub fn not_null(name: impl Into<String>, attr_type: AttrType) -> Self {
        Self {
            nullable: false,
            ..Self::new(name, attr_type)
        }
    }
}

/// A secondary index over one or more columns, in key order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMeta {
    /// Index name.
    pub name: String,
    /// Key column names, leading column first.
    pub fields: Vec<String>,
}

impl IndexMeta {
    /// Creates an index over `fields`.
    pub fn new<I, S>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the number of key columns.
    pub fn field_num(&self) -> usize {
        self.fields.len()
    }
}

/// A table: its columns and indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMeta {
    /// Table name.
    pub name: String,
    /// Columns in storage order.
    pub fields: Vec<FieldMeta>,
    /// Indexes in catalog order.
    pub indexes: Vec<IndexMeta>,
}

impl TableMeta {
    /// Creates a table with no columns.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Adds a column.
    pub fn with_field(mut self, field: FieldMeta) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds an index.
    pub fn with_index(mut self, index: IndexMeta) -> Self {
        self.indexes.push(index);
        self
    }

    /// Returns the position of a column.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Returns a column by name.
    pub fn field(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns an index by name.
    pub fn index(&self, name: &str) -> Option<&IndexMeta> {
        self.indexes.iter().find(|i| i.name == name)
    }

    /// Returns the number of columns.
    pub fn field_num(&self) -> usize {
        self.fields.len()
    }
}

/// Shared table descriptor.
pub type TableRef = Arc<TableMeta>;
