//! Column-level diff, nested inside a table's diff. Matched by name; order is never compared.

use crate::model::Column;
use crate::ops::AlterColumnOp;

pub fn diff(old: &Column, new: &Column) -> Vec<AlterColumnOp> {
    let mut ops = Vec::new();

    if old.r#type != new.r#type {
        ops.push(AlterColumnOp::SetType {
            column: new.name.clone(),
            new_type: new.r#type.clone(),
        });
    }

    if old.default != new.default {
        if new.has_default() {
            ops.push(AlterColumnOp::SetDefault {
                column: new.name.clone(),
                expression: new.default.clone(),
            });
        } else {
            ops.push(AlterColumnOp::DropDefault {
                column: new.name.clone(),
            });
        }
    }

    if old.is_nullable != new.is_nullable {
        if new.is_nullable {
            ops.push(AlterColumnOp::DropNotNull {
                column: new.name.clone(),
            });
        } else {
            ops.push(AlterColumnOp::SetNotNull {
                column: new.name.clone(),
            });
        }
    }

    if old.collation != new.collation {
        if let Some(collation) = &new.collation {
            ops.push(AlterColumnOp::SetCollation {
                column: new.name.clone(),
                collation: collation.clone(),
            });
        }
    }

    ops
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn make_column(name: &str) -> Column {
        Column {
            name: name.to_string(),
            r#type: "integer".to_string(),
            collation: None,
            default: String::new(),
            is_nullable: true,
            size_bytes: 4,
        }
    }

    #[test]
    fn no_change_emits_nothing() {
        let col = make_column("id");
        assert!(diff(&col, &col).is_empty());
    }

    #[test]
    fn type_change_emits_set_type() {
        let old = make_column("id");
        let mut new = old.clone();
        new.r#type = "bigint".to_string();
        let ops = diff(&old, &new);
        assert_eq!(ops, vec![AlterColumnOp::SetType { column: "id".into(), new_type: "bigint".into() }]);
    }

    #[test]
    fn adding_default_emits_set_default() {
        let old = make_column("id");
        let mut new = old.clone();
        new.default = "0".to_string();
        let ops = diff(&old, &new);
        assert_eq!(ops, vec![AlterColumnOp::SetDefault { column: "id".into(), expression: "0".into() }]);
    }

    #[test]
    fn removing_default_emits_drop_default() {
        let mut old = make_column("id");
        old.default = "0".to_string();
        let new = make_column("id");
        let ops = diff(&old, &new);
        assert_eq!(ops, vec![AlterColumnOp::DropDefault { column: "id".into() }]);
    }

    #[rstest]
    #[case(true, false, AlterColumnOp::SetNotNull { column: "id".into() })]
    #[case(false, true, AlterColumnOp::DropNotNull { column: "id".into() })]
    fn nullability_flip_emits_matching_sub_op(
        #[case] old_nullable: bool,
        #[case] new_nullable: bool,
        #[case] expected: AlterColumnOp,
    ) {
        let mut old = make_column("id");
        old.is_nullable = old_nullable;
        let mut new = old.clone();
        new.is_nullable = new_nullable;

        let ops = diff(&old, &new);
        assert_eq!(ops, vec![expected]);
    }
}
