//! Table-level diff: columns, check constraints, and partitioning.
//!
//! A primary key is never inlined into `CreateTable` — the data model carries no per-table
//! primary-key field, only an [`crate::model::Index`] with `is_primary_key` set. PK creation
//! is therefore always routed through the index diff's follow-on
//! `AddPrimaryKeyUsingIndex` op (see [`crate::diff::indexes`]), which also keeps the two
//! code paths that can create a PK — "new table" and "new PK on an existing table" — identical.

use crate::model::table::partitioning_differs;
use crate::model::{CheckConstraint, Table};
use crate::ops::{AlterTableOp, Op};

use super::columns;

pub fn diff(old: Option<&Table>, new: Option<&Table>) -> Vec<Op> {
    match (old, new) {
        (None, Some(new_table)) => vec![Op::CreateTable(new_table.clone())],

        (Some(old_table), None) => vec![Op::DropTable(old_table.name.clone())],

        (Some(old_table), Some(new_table)) => {
            if partitioning_differs(old_table, new_table) {
                return vec![
                    Op::DropTable(old_table.name.clone()),
                    Op::CreateTable(new_table.clone()),
                ];
            }

            let mut sub_ops = Vec::new();
            sub_ops.extend(diff_columns(old_table, new_table));
            sub_ops.extend(diff_check_constraints(old_table, new_table));

            if sub_ops.is_empty() {
                vec![]
            } else {
                vec![Op::AlterTable {
                    table: new_table.name.clone(),
                    ops: sub_ops,
                }]
            }
        }

        (None, None) => vec![],
    }
}

fn diff_columns(old_table: &Table, new_table: &Table) -> Vec<AlterTableOp> {
    let mut ops = Vec::new();

    for new_col in &new_table.columns {
        match old_table.column(&new_col.name) {
            None => ops.push(AlterTableOp::AddColumn(new_col.clone())),
            Some(old_col) => {
                for sub in columns::diff(old_col, new_col) {
                    ops.push(AlterTableOp::AlterColumn(sub));
                }
            }
        }
    }

    for old_col in &old_table.columns {
        if new_table.column(&old_col.name).is_none() {
            ops.push(AlterTableOp::DropColumn(old_col.name.clone()));
        }
    }

    ops
}

fn diff_check_constraints(old_table: &Table, new_table: &Table) -> Vec<AlterTableOp> {
    let mut ops = Vec::new();

    let find = |set: &std::collections::BTreeSet<CheckConstraint>, name: &str| {
        set.iter().find(|c| c.name == name).cloned()
    };

    for new_check in &new_table.check_constraints {
        match find(&old_table.check_constraints, &new_check.name) {
            None => {
                ops.push(AlterTableOp::AddCheckConstraint(new_check.clone()));
                if new_check.is_valid {
                    ops.push(AlterTableOp::ValidateCheckConstraint(new_check.name.clone()));
                }
            }
            Some(old_check) => {
                if check_constraint_changed(&old_check, new_check) {
                    ops.push(AlterTableOp::DropCheckConstraint(old_check.name.clone()));
                    ops.push(AlterTableOp::AddCheckConstraint(new_check.clone()));
                    if new_check.is_valid {
                        ops.push(AlterTableOp::ValidateCheckConstraint(new_check.name.clone()));
                    }
                }
            }
        }
    }

    for old_check in &old_table.check_constraints {
        if find(&new_table.check_constraints, &old_check.name).is_none() {
            ops.push(AlterTableOp::DropCheckConstraint(old_check.name.clone()));
        }
    }

    ops
}

/// Check constraints are immutable in Postgres: any change to `expression` or
/// `is_inheritable` can only be applied by dropping and re-adding the constraint.
fn check_constraint_changed(old: &CheckConstraint, new: &CheckConstraint) -> bool {
    old.expression != new.expression || old.is_inheritable != new.is_inheritable
}
