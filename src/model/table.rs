use std::collections::BTreeSet;

use super::{Identified, ObjectId};
use crate::rewrite::quote_ident;

/// A table column. Identity is `name`; everything else is a structural attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    /// Raw Postgres type string, e.g. `"character varying(255)"`.
    pub r#type: String,
    /// Schema-qualified collation name, empty when the column uses its type's default.
    pub collation: Option<String>,
    /// Raw default expression, empty string when there is none.
    pub default: String,
    pub is_nullable: bool,
    pub size_bytes: i32,
}

impl Column {
    pub fn has_default(&self) -> bool {
        !self.default.is_empty()
    }
}

/// A `CHECK` constraint. Constraints are immutable in Postgres: any change to `expression`
/// or `is_inheritable` is modeled as drop-then-add, never an in-place alter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CheckConstraint {
    pub name: String,
    pub expression: String,
    pub is_valid: bool,
    pub is_inheritable: bool,
    pub depends_on_functions: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub schema: String,
    pub name: String,
    /// Order is meaningful (on-disk packing) and preserved verbatim; never sorted.
    pub columns: Vec<Column>,
    pub check_constraints: BTreeSet<CheckConstraint>,
    /// `PARTITION BY ...` clause; empty means the table is not partitioned.
    pub partition_key_def: String,
    /// Name of the parent table if this is a partition; empty otherwise.
    pub parent_table_name: String,
    /// `FOR VALUES ...` clause if this is a partition; empty otherwise.
    pub for_values: String,
}

impl Table {
    pub fn is_partitioned(&self) -> bool {
        !self.partition_key_def.is_empty()
    }

    pub fn is_partition(&self) -> bool {
        !self.for_values.is_empty()
    }

    pub fn fq_escaped(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.name))
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

impl Identified for Table {
    fn id(&self) -> ObjectId {
        ObjectId::Table(self.name.clone())
    }
}

/// Partitioning attributes are not alterable in place: any difference between two persisted
/// tables' partitioning is a drop-and-recreate, never an `ALTER TABLE`.
pub fn partitioning_differs(old: &Table, new: &Table) -> bool {
    old.partition_key_def != new.partition_key_def
        || old.parent_table_name != new.parent_table_name
        || old.for_values != new.for_values
}
