//! Statement Renderer: turns an ordered, hazard-free [`Op`] plan into the final `{sql,
//! hazards, is_barrier}` records a caller executes in order.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::hazard::{self, Hazard, HazardContext};
use crate::model::function::is_untracked_language;
use crate::ops::{AlterColumnOp, AlterIndexOp, AlterTableOp, Op};
use crate::planner::PlannedOp;
use crate::rewrite::{quote_ident, to_concurrent, to_or_replace_trigger};
use crate::error::DriftResult;

/// Caller-supplied facts the renderer/classifier can't derive from the Op stream alone.
#[derive(Debug, Clone, Default)]
pub struct RenderHints {
    /// Tables large enough that a `SET NOT NULL` or rewriting `ALTER COLUMN TYPE` should be
    /// flagged (and, for `SET NOT NULL`, split into the four-statement safe sequence).
    pub large_tables: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedStatement {
    pub sql: String,
    pub hazards: BTreeSet<Hazard>,
    pub is_barrier: bool,
}

pub fn render_plan(plan: &[PlannedOp], hints: &RenderHints) -> DriftResult<Vec<RenderedStatement>> {
    let mut out = Vec::new();
    for planned in plan {
        out.extend(render_op(planned, hints)?);
    }
    Ok(out)
}

/// Serializes a rendered plan to the `{sql, hazards, is_barrier}` JSON form external
/// consumers (the executor, a review UI) are expected to read.
pub fn to_json(plan: &[RenderedStatement]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(plan)
}

fn render_op(planned: &PlannedOp, hints: &RenderHints) -> DriftResult<Vec<RenderedStatement>> {
    let ctx = hazard_context(&planned.op, hints);
    let hazards = hazard::classify(&planned.op, &ctx);

    let sqls = match &planned.op {
        Op::CreateTable(table) => vec![render_create_table(table)],
        Op::DropTable(name) => vec![format!("DROP TABLE {};", quote_ident(name))],
        Op::AlterTable { table, ops } => render_alter_table(table, ops, hints),

        Op::CreateIndex(index) => vec![render_create_index(index)?],
        Op::DropIndex { name, table_name: _, concurrently } => {
            vec![format!(
                "DROP INDEX {}{};",
                if *concurrently { "CONCURRENTLY " } else { "" },
                quote_ident(name)
            )]
        }
        Op::AlterIndex { name, ops } => ops
            .iter()
            .map(|sub| match sub {
                AlterIndexOp::Reindex => {
                    format!("REINDEX INDEX CONCURRENTLY {};", quote_ident(name))
                }
            })
            .collect(),

        Op::CreateConstraint { table, constraint_name, definition, not_valid } => {
            vec![format!(
                "ALTER TABLE {} ADD CONSTRAINT {} {}{};",
                quote_ident(table),
                quote_ident(constraint_name),
                definition,
                if *not_valid { " NOT VALID" } else { "" }
            )]
        }
        Op::DropConstraint { table, constraint_name } => vec![format!(
            "ALTER TABLE {} DROP CONSTRAINT {};",
            quote_ident(table),
            quote_ident(constraint_name)
        )],
        Op::ValidateConstraint { table, constraint_name } => vec![format!(
            "ALTER TABLE {} VALIDATE CONSTRAINT {};",
            quote_ident(table),
            quote_ident(constraint_name)
        )],

        Op::CreateFunction { function, .. } => vec![function.definition.clone()],
        Op::DropFunction { escaped_name } => vec![format!("DROP FUNCTION {escaped_name};")],

        Op::CreateTrigger { trigger, replace } => {
            let stmt = if *replace {
                to_or_replace_trigger(&trigger.definition_stmt)?
            } else {
                trigger.definition_stmt.clone()
            };
            vec![format!("{stmt};")]
        }
        Op::DropTrigger { name, owning_table } => vec![format!(
            "DROP TRIGGER {} ON {};",
            quote_ident(name),
            quote_ident(owning_table)
        )],
    };

    Ok(sqls
        .into_iter()
        .map(|sql| RenderedStatement {
            sql,
            hazards: hazards.clone(),
            is_barrier: planned.is_barrier,
        })
        .collect())
}

fn hazard_context(op: &Op, hints: &RenderHints) -> HazardContext {
    let mut ctx = HazardContext::default();

    if let Op::AlterTable { table, ops } = op {
        let is_large = hints.large_tables.contains(table);
        ctx.is_large_table = is_large;
        ctx.causes_table_rewrite = ops
            .iter()
            .any(|sub| matches!(sub, AlterTableOp::AlterColumn(AlterColumnOp::SetType { .. })))
            && is_large;
    }

    if let Op::CreateFunction { function, .. } = op {
        ctx.function_untracked_language = is_untracked_language(&function.language);
    }

    ctx
}

fn render_create_table(table: &crate::model::Table) -> String {
    use itertools::Itertools;

    let columns = table
        .columns
        .iter()
        .map(|c| {
            let mut parts = vec![quote_ident(&c.name), c.r#type.clone()];
            if let Some(collation) = &c.collation {
                parts.push(format!("COLLATE {}", quote_ident(collation)));
            }
            if !c.is_nullable {
                parts.push("NOT NULL".to_string());
            }
            if c.has_default() {
                parts.push(format!("DEFAULT {}", c.default));
            }
            parts.join(" ")
        })
        .join(", ");

    let mut stmt = format!("CREATE TABLE {} ({})", quote_ident(&table.name), columns);

    if table.is_partitioned() {
        stmt.push_str(&format!(" PARTITION BY {}", table.partition_key_def));
    }
    if table.is_partition() {
        stmt = format!(
            "CREATE TABLE {} PARTITION OF {} FOR VALUES {}",
            quote_ident(&table.name),
            quote_ident(&table.parent_table_name),
            table.for_values
        );
    }

    stmt.push(';');
    stmt
}

fn render_alter_table(table: &str, ops: &[AlterTableOp], hints: &RenderHints) -> Vec<String> {
    let mut stmts = Vec::new();
    let t = quote_ident(table);

    for sub in ops {
        match sub {
            AlterTableOp::AddColumn(col) => {
                let mut def = format!("{} {}", quote_ident(&col.name), col.r#type);
                if !col.is_nullable {
                    def.push_str(" NOT NULL");
                }
                if col.has_default() {
                    def.push_str(&format!(" DEFAULT {}", col.default));
                }
                stmts.push(format!("ALTER TABLE {t} ADD COLUMN {def};"));
            }
            AlterTableOp::DropColumn(name) => {
                stmts.push(format!("ALTER TABLE {t} DROP COLUMN {};", quote_ident(name)));
            }
            AlterTableOp::AlterColumn(alter) => stmts.extend(render_alter_column(&t, table, alter, hints)),
            AlterTableOp::AddCheckConstraint(check) => {
                // Always added NOT VALID; tables.rs emits a follow-on ValidateCheckConstraint
                // when the target state wants it already validated.
                stmts.push(format!(
                    "ALTER TABLE {t} ADD CONSTRAINT {} CHECK ({}) NOT VALID;",
                    quote_ident(&check.name),
                    check.expression,
                ));
            }
            AlterTableOp::DropCheckConstraint(name) | AlterTableOp::DropConstraint(name) => {
                stmts.push(format!("ALTER TABLE {t} DROP CONSTRAINT {};", quote_ident(name)));
            }
            AlterTableOp::ValidateCheckConstraint(name) => {
                stmts.push(format!("ALTER TABLE {t} VALIDATE CONSTRAINT {};", quote_ident(name)));
            }
            AlterTableOp::AddPrimaryKeyUsingIndex { constraint_name, index_name } => {
                stmts.push(format!(
                    "ALTER TABLE {t} ADD CONSTRAINT {} PRIMARY KEY USING INDEX {};",
                    quote_ident(constraint_name),
                    quote_ident(index_name)
                ));
            }
        }
    }

    stmts
}

fn render_alter_column(t: &str, table: &str, op: &AlterColumnOp, hints: &RenderHints) -> Vec<String> {
    match op {
        AlterColumnOp::SetType { column, new_type } => {
            vec![format!(
                "ALTER TABLE {t} ALTER COLUMN {} SET DATA TYPE {};",
                quote_ident(column),
                new_type
            )]
        }
        AlterColumnOp::SetDefault { column, expression } => vec![format!(
            "ALTER TABLE {t} ALTER COLUMN {} SET DEFAULT {};",
            quote_ident(column),
            expression
        )],
        AlterColumnOp::DropDefault { column } => {
            vec![format!("ALTER TABLE {t} ALTER COLUMN {} DROP DEFAULT;", quote_ident(column))]
        }
        AlterColumnOp::SetNotNull { column } => {
            if hints.large_tables.contains(table) {
                // Avoid a full-table scan under an AEL `SET NOT NULL` by proving the
                // invariant with a `NOT VALID` check first, validating it without a lock
                // upgrade, then promoting it and dropping the now-redundant check.
                let check_name = format!("{column}_not_null_check");
                vec![
                    format!(
                        "ALTER TABLE {t} ADD CONSTRAINT {} CHECK ({} IS NOT NULL) NOT VALID;",
                        quote_ident(&check_name),
                        quote_ident(column)
                    ),
                    format!("ALTER TABLE {t} VALIDATE CONSTRAINT {};", quote_ident(&check_name)),
                    format!("ALTER TABLE {t} ALTER COLUMN {} SET NOT NULL;", quote_ident(column)),
                    format!("ALTER TABLE {t} DROP CONSTRAINT {};", quote_ident(&check_name)),
                ]
            } else {
                vec![format!("ALTER TABLE {t} ALTER COLUMN {} SET NOT NULL;", quote_ident(column))]
            }
        }
        AlterColumnOp::DropNotNull { column } => {
            vec![format!("ALTER TABLE {t} ALTER COLUMN {} DROP NOT NULL;", quote_ident(column))]
        }
        AlterColumnOp::SetCollation { column, collation } => vec![format!(
            "ALTER TABLE {t} ALTER COLUMN {} SET DATA TYPE {} COLLATE {};",
            quote_ident(column),
            collation,
            quote_ident(collation)
        )],
    }
}

fn render_create_index(index: &crate::model::Index) -> DriftResult<String> {
    // Partition-of-index indexes can't be built CONCURRENTLY — Postgres rejects it outright
    // for the catalog-managed partition attach — so we fall back to a blocking build and let
    // the hazard classifier's AEL tag warn the caller.
    if index.is_partition_of_index() {
        return Ok(format!("{};", index.definition_stmt));
    }
    Ok(format!("{};", to_concurrent(&index.definition_stmt)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Table;
    use std::collections::BTreeSet as Set;

    #[test]
    fn drop_table_renders_plain_ddl() {
        let planned = PlannedOp { op: Op::DropTable("users".into()), is_barrier: false };
        let rendered = render_plan(&[planned], &RenderHints::default()).unwrap();
        assert_eq!(rendered[0].sql, "DROP TABLE \"users\";");
    }

    #[test]
    fn add_check_constraint_is_always_not_valid() {
        use crate::model::table::CheckConstraint;
        let check = CheckConstraint {
            name: "chk_amount_positive".into(),
            expression: "amount > 0".into(),
            is_valid: true,
            is_inheritable: true,
            depends_on_functions: Set::new(),
        };
        let planned = PlannedOp {
            op: Op::AlterTable {
                table: "orders".into(),
                ops: vec![AlterTableOp::AddCheckConstraint(check)],
            },
            is_barrier: false,
        };
        let rendered = render_plan(&[planned], &RenderHints::default()).unwrap();
        assert_eq!(
            rendered[0].sql,
            "ALTER TABLE \"orders\" ADD CONSTRAINT \"chk_amount_positive\" CHECK (amount > 0) NOT VALID;"
        );
    }

    #[test]
    fn create_index_is_rewritten_concurrently() {
        let idx = crate::model::Index {
            name: "idx_users_email".into(),
            table_name: "users".into(),
            columns: vec!["email".into()],
            is_invalid: false,
            is_primary_key: false,
            is_unique: false,
            constraint_name: String::new(),
            definition_stmt: "CREATE INDEX idx_users_email ON public.users USING btree (email)".into(),
            parent_index_name: String::new(),
        };
        let planned = PlannedOp { op: Op::CreateIndex(idx), is_barrier: true };
        let rendered = render_plan(&[planned], &RenderHints::default()).unwrap();
        assert!(rendered[0].sql.starts_with("CREATE INDEX CONCURRENTLY idx_users_email"));
        assert!(rendered[0].is_barrier);
    }

    #[test]
    fn set_not_null_on_large_table_is_split_into_four_statements() {
        let op = Op::AlterTable {
            table: "events".into(),
            ops: vec![AlterTableOp::AlterColumn(AlterColumnOp::SetNotNull { column: "user_id".into() })],
        };
        let mut hints = RenderHints::default();
        hints.large_tables.insert("events".into());
        let planned = PlannedOp { op, is_barrier: false };
        let rendered = render_plan(&[planned], &hints).unwrap();
        assert_eq!(rendered.len(), 4);
        assert!(rendered[0].sql.contains("NOT VALID"));
        assert!(rendered[1].sql.contains("VALIDATE CONSTRAINT"));
        assert!(rendered[2].sql.contains("SET NOT NULL"));
        assert!(rendered[3].sql.contains("DROP CONSTRAINT"));
    }

    #[test]
    fn create_table_renders_columns_in_order() {
        let table = Table {
            schema: "public".into(),
            name: "users".into(),
            columns: vec![
                crate::model::Column {
                    name: "id".into(),
                    r#type: "integer".into(),
                    collation: None,
                    default: String::new(),
                    is_nullable: false,
                    size_bytes: 4,
                },
                crate::model::Column {
                    name: "email".into(),
                    r#type: "text".into(),
                    collation: None,
                    default: String::new(),
                    is_nullable: true,
                    size_bytes: -1,
                },
            ],
            check_constraints: Set::new(),
            partition_key_def: String::new(),
            parent_table_name: String::new(),
            for_values: String::new(),
        };
        let planned = PlannedOp { op: Op::CreateTable(table), is_barrier: false };
        let rendered = render_plan(&[planned], &RenderHints::default()).unwrap();
        assert_eq!(
            rendered[0].sql,
            "CREATE TABLE \"users\" (\"id\" integer NOT NULL, \"email\" text);"
        );
    }
}
