//! Index diff: creates, drops, and the drop-and-rebuild path for persisted indexes whose
//! definition changed.
//!
//! Indexes have almost nothing that can change in place. The one thing that does is validity
//! (`is_invalid` flipping false once a previously failed `CONCURRENTLY` build is retried),
//! handled by [`crate::ops::AlterIndexOp::Reindex`].

use crate::model::index::structurally_different;
use crate::model::Index;
use crate::ops::{AlterIndexOp, AlterTableOp, Op};

pub fn diff(old: Option<&Index>, new: Option<&Index>) -> Vec<Op> {
    match (old, new) {
        (None, Some(new_index)) => create_index(new_index),

        (Some(old_index), None) => drop_index(old_index),

        (Some(old_index), Some(new_index)) => {
            // Same (table, column-set, uniqueness, method) but a different owning constraint
            // name is still a drop-and-rebuild: no rename optimization, by design (see §9).
            if structurally_different(old_index, new_index) {
                let mut ops = drop_index(old_index);
                ops.extend(create_index(new_index));
                ops
            } else if old_index.is_invalid && !new_index.is_invalid {
                vec![Op::AlterIndex {
                    name: new_index.name.clone(),
                    ops: vec![AlterIndexOp::Reindex],
                }]
            } else {
                vec![]
            }
        }

        (None, None) => vec![],
    }
}

fn create_index(new_index: &Index) -> Vec<Op> {
    let mut ops = vec![Op::CreateIndex(new_index.clone())];

    if new_index.is_primary_key {
        ops.push(Op::AlterTable {
            table: new_index.table_name.clone(),
            ops: vec![crate::ops::AlterTableOp::AddPrimaryKeyUsingIndex {
                constraint_name: if new_index.constraint_name.is_empty() {
                    new_index.name.clone()
                } else {
                    new_index.constraint_name.clone()
                },
                index_name: new_index.name.clone(),
            }],
        });
    }

    ops
}

fn drop_index(old_index: &Index) -> Vec<Op> {
    let mut ops = Vec::new();
    if old_index.has_owning_constraint() {
        ops.push(Op::AlterTable {
            table: old_index.table_name.clone(),
            ops: vec![AlterTableOp::DropConstraint(old_index.constraint_name.clone())],
        });
    }
    ops.push(Op::DropIndex {
        name: old_index.name.clone(),
        table_name: old_index.table_name.clone(),
        concurrently: true,
    });
    ops
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_index(name: &str) -> Index {
        Index {
            name: name.to_string(),
            table_name: "users".to_string(),
            columns: vec!["email".to_string()],
            is_invalid: false,
            is_primary_key: false,
            is_unique: false,
            constraint_name: String::new(),
            definition_stmt: format!("CREATE INDEX {name} ON public.users USING btree (email)"),
            parent_index_name: String::new(),
        }
    }

    #[test]
    fn create_index_emits_create() {
        let idx = make_index("idx_users_email");
        assert_eq!(diff(None, Some(&idx)), vec![Op::CreateIndex(idx)]);
    }

    #[test]
    fn create_pk_index_emits_follow_on_add_constraint() {
        let mut idx = make_index("users_pkey");
        idx.is_primary_key = true;
        idx.is_unique = true;
        let ops = diff(None, Some(&idx));
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0], Op::CreateIndex(idx.clone()));
        assert_eq!(
            ops[1],
            Op::AlterTable {
                table: "users".into(),
                ops: vec![AlterTableOp::AddPrimaryKeyUsingIndex {
                    constraint_name: "users_pkey".into(),
                    index_name: "users_pkey".into(),
                }],
            }
        );
    }

    #[test]
    fn drop_index_emits_drop_concurrently() {
        let idx = make_index("idx_users_email");
        assert_eq!(
            diff(Some(&idx), None),
            vec![Op::DropIndex {
                name: "idx_users_email".into(),
                table_name: "users".into(),
                concurrently: true,
            }]
        );
    }

    #[test]
    fn drop_index_backing_constraint_drops_constraint_first() {
        let mut idx = make_index("users_email_key");
        idx.is_unique = true;
        idx.constraint_name = "users_email_key".to_string();
        let ops = diff(Some(&idx), None);
        assert_eq!(
            ops,
            vec![
                Op::AlterTable {
                    table: "users".into(),
                    ops: vec![AlterTableOp::DropConstraint("users_email_key".into())],
                },
                Op::DropIndex {
                    name: "users_email_key".into(),
                    table_name: "users".into(),
                    concurrently: true,
                },
            ]
        );
    }

    #[test]
    fn column_list_change_forces_drop_and_rebuild() {
        let old = make_index("idx_users_email");
        let mut new = old.clone();
        new.columns = vec!["email".into(), "created_at".into()];
        new.definition_stmt = "CREATE INDEX idx_users_email ON public.users USING btree (email, created_at)".into();

        let ops = diff(Some(&old), Some(&new));
        assert_eq!(
            ops,
            vec![
                Op::DropIndex {
                    name: "idx_users_email".into(),
                    table_name: "users".into(),
                    concurrently: true,
                },
                Op::CreateIndex(new),
            ]
        );
    }

    #[test]
    fn rename_via_constraint_name_only_is_still_drop_and_rebuild() {
        let mut old = make_index("users_email_key");
        old.is_unique = true;
        old.constraint_name = "users_email_key".to_string();
        let mut new = old.clone();
        new.constraint_name = "users_email_unique".to_string();

        let ops = diff(Some(&old), Some(&new));
        assert!(ops.iter().any(|op| matches!(op, Op::DropIndex { .. })));
        assert!(ops.iter().any(|op| matches!(op, Op::CreateIndex(_))));
    }

    #[test]
    fn invalid_to_valid_with_no_other_change_is_reindex() {
        let mut old = make_index("idx_users_email");
        old.is_invalid = true;
        let new = make_index("idx_users_email");
        assert_eq!(
            diff(Some(&old), Some(&new)),
            vec![Op::AlterIndex {
                name: "idx_users_email".into(),
                ops: vec![AlterIndexOp::Reindex],
            }]
        );
    }

    #[test]
    fn no_change_emits_nothing() {
        let idx = make_index("idx_users_email");
        assert!(diff(Some(&idx), Some(&idx)).is_empty());
    }
}
