//! The typed `Op` records the differs emit, and the dependency/product declarations the
//! planner sorts them by.

use crate::model::{CheckConstraint, Column, Function, Index, ObjectId, Table, Trigger};

/// An atomic, idempotent change to a single column on an already-existing table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlterColumnOp {
    SetType { column: String, new_type: String },
    SetDefault { column: String, expression: String },
    DropDefault { column: String },
    SetNotNull { column: String },
    DropNotNull { column: String },
    SetCollation { column: String, collation: String },
}

/// A sub-op of `AlterTable`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlterTableOp {
    AddColumn(Column),
    DropColumn(String),
    AlterColumn(AlterColumnOp),
    AddCheckConstraint(CheckConstraint),
    DropCheckConstraint(String),
    ValidateCheckConstraint(String),
    /// Reattaches a pre-existing unique index as the table's primary key.
    AddPrimaryKeyUsingIndex { constraint_name: String, index_name: String },
    DropConstraint(String),
}

/// A sub-op of `AlterIndex`. Indexes have very little that can change in place; everything
/// structural is a drop-and-rebuild (see [`crate::diff::indexes`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlterIndexOp {
    /// `REINDEX`, used when an index transitions from invalid to valid without any other
    /// structural change (e.g. a previously failed `CREATE INDEX CONCURRENTLY` being retried).
    Reindex,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    CreateTable(Table),
    DropTable(String),
    AlterTable { table: String, ops: Vec<AlterTableOp> },

    CreateIndex(Index),
    DropIndex { name: String, table_name: String, concurrently: bool },
    AlterIndex { name: String, ops: Vec<AlterIndexOp> },

    CreateConstraint {
        table: String,
        constraint_name: String,
        definition: String,
        not_valid: bool,
    },
    DropConstraint { table: String, constraint_name: String },
    ValidateConstraint { table: String, constraint_name: String },

    CreateFunction { function: Function, replace: bool },
    DropFunction { escaped_name: String },

    CreateTrigger { trigger: Trigger, replace: bool },
    DropTrigger { name: String, owning_table: String },
}

impl Op {
    /// Identities this op reads from the schema but does not itself create or remove.
    pub fn dependencies(&self) -> Vec<ObjectId> {
        match self {
            Op::CreateTable(_) | Op::DropTable(_) => vec![],
            Op::AlterTable { table, .. } => vec![ObjectId::Table(table.clone())],
            Op::CreateIndex(idx) => vec![ObjectId::Table(idx.table_name.clone())],
            Op::DropIndex { table_name, .. } => vec![ObjectId::Table(table_name.clone())],
            Op::AlterIndex { name, .. } => vec![ObjectId::Index(name.clone())],
            Op::CreateConstraint { table, .. }
            | Op::DropConstraint { table, .. }
            | Op::ValidateConstraint { table, .. } => vec![ObjectId::Table(table.clone())],
            Op::CreateFunction { .. } | Op::DropFunction { .. } => vec![],
            Op::CreateTrigger { trigger, .. } => vec![
                ObjectId::Table(trigger.owning_table_unescaped_name.clone()),
                ObjectId::Function(trigger.function.clone()),
            ],
            Op::DropTrigger { owning_table, .. } => vec![ObjectId::Table(owning_table.clone())],
        }
    }

    /// The identity this op creates, drops, or alters in place.
    pub fn product(&self) -> ObjectId {
        match self {
            Op::CreateTable(t) => ObjectId::Table(t.name.clone()),
            Op::DropTable(name) => ObjectId::Table(name.clone()),
            Op::AlterTable { table, .. } => ObjectId::Table(table.clone()),
            Op::CreateIndex(idx) => ObjectId::Index(idx.name.clone()),
            Op::DropIndex { name, .. } => ObjectId::Index(name.clone()),
            Op::AlterIndex { name, .. } => ObjectId::Index(name.clone()),
            Op::CreateConstraint { table, constraint_name, .. }
            | Op::DropConstraint { table, constraint_name }
            | Op::ValidateConstraint { table, constraint_name } => {
                ObjectId::Table(format!("{table}::{constraint_name}"))
            }
            Op::CreateFunction { function, .. } => ObjectId::Function(function.escaped_name.clone()),
            Op::DropFunction { escaped_name } => ObjectId::Function(escaped_name.clone()),
            Op::CreateTrigger { trigger, .. } => ObjectId::Trigger(trigger.id_key()),
            Op::DropTrigger { name, owning_table } => {
                ObjectId::Trigger(format!("{owning_table}_{name}"))
            }
        }
    }

    pub fn is_create(&self) -> bool {
        matches!(
            self,
            Op::CreateTable(_)
                | Op::CreateIndex(_)
                | Op::CreateConstraint { .. }
                | Op::CreateFunction { .. }
                | Op::CreateTrigger { .. }
        )
    }

    pub fn is_drop(&self) -> bool {
        matches!(
            self,
            Op::DropTable(_)
                | Op::DropIndex { .. }
                | Op::DropConstraint { .. }
                | Op::DropFunction { .. }
                | Op::DropTrigger { .. }
        )
    }

    /// A stable rank used to break ties deterministically once the DAG has been resolved.
    pub fn kind_rank(&self) -> u8 {
        match self {
            Op::DropTrigger { .. } => 0,
            Op::DropFunction { .. } => 1,
            Op::DropConstraint { .. } => 2,
            Op::DropIndex { .. } => 3,
            Op::DropTable(_) => 4,
            Op::CreateTable(_) => 5,
            Op::AlterTable { .. } => 6,
            Op::CreateIndex(_) => 7,
            Op::AlterIndex { .. } => 8,
            Op::CreateConstraint { .. } => 9,
            Op::ValidateConstraint { .. } => 10,
            Op::CreateFunction { .. } => 11,
            Op::CreateTrigger { .. } => 12,
        }
    }
}
