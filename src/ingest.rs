//! Catalog Ingestor: the external interface contract between a live PostgreSQL catalog and
//! the pure differ core.
//!
//! [`CatalogIngestor`] is the boundary the core depends on; only its shape matters to the
//! rest of the crate. [`PgCatalogIngestor`] is one real implementation, built the way the
//! teacher's `catalog/*.rs` queries are: one `sqlx` query per object kind, run inside a
//! single read-only transaction so the snapshot is internally consistent.

use std::collections::BTreeSet;

use sqlx::{FromRow, Postgres, Transaction};
use tracing::{info, instrument};

use crate::error::{DriftError, DriftResult};
use crate::model::{CheckConstraint, Column, Function, Index, Schema, Table, Trigger};

pub trait CatalogIngestor {
    async fn load(&mut self) -> DriftResult<Schema>;
}

#[derive(Debug, FromRow)]
struct TableRow {
    name: String,
    parent_name: Option<String>,
    parent_schema: Option<String>,
    partition_key_def: String,
    partition_for_values: String,
}

#[derive(Debug, FromRow)]
struct ColumnRow {
    table_name: String,
    name: String,
    r#type: String,
    collation: Option<String>,
    is_not_null: bool,
    default: Option<String>,
    size_bytes: i32,
}

#[derive(Debug, FromRow)]
struct IndexRow {
    table_name: String,
    name: String,
    is_valid: bool,
    is_pk: bool,
    is_unique: bool,
    constraint_name: Option<String>,
    parent_index_name: Option<String>,
    def_stmt: String,
}

#[derive(Debug, FromRow)]
struct IndexColumnRow {
    index_name: String,
    column_name: String,
}

#[derive(Debug, FromRow)]
struct CheckRow {
    table_name: String,
    name: String,
    expression: String,
    is_valid: bool,
    is_not_inheritable: bool,
}

#[derive(Debug, FromRow)]
struct FunctionRow {
    schema: String,
    name: String,
    identity_args: String,
    definition: String,
    language: String,
}

#[derive(Debug, FromRow)]
struct FunctionDependencyRow {
    function_identity: String,
    depends_on: String,
}

#[derive(Debug, FromRow)]
struct TriggerRow {
    name: String,
    owning_table: String,
    function: String,
    function_identity_args: String,
    definition: String,
}

/// A real ingestor backed by a live PostgreSQL connection. Queries run inside a single
/// read-only transaction; the caller owns the transaction's lifetime (see §5).
pub struct PgCatalogIngestor<'a> {
    tx: Transaction<'a, Postgres>,
}

impl<'a> PgCatalogIngestor<'a> {
    pub fn new(tx: Transaction<'a, Postgres>) -> Self {
        Self { tx }
    }

    #[instrument(skip(self))]
    async fn fetch_tables(&mut self) -> DriftResult<Vec<TableRow>> {
        let rows = sqlx::query_as::<_, TableRow>(
            r#"
            SELECT
                c.relname AS name,
                parent.relname AS parent_name,
                pn.nspname AS parent_schema,
                COALESCE(pg_get_partkeydef(c.oid), '') AS partition_key_def,
                COALESCE(pg_get_expr(c.relpartbound, c.oid), '') AS partition_for_values
            FROM pg_class c
            JOIN pg_namespace n ON n.oid = c.relnamespace
            LEFT JOIN pg_inherits i ON i.inhrelid = c.oid
            LEFT JOIN pg_class parent ON parent.oid = i.inhparent
            LEFT JOIN pg_namespace pn ON pn.oid = parent.relnamespace
            WHERE n.nspname = 'public' AND c.relkind IN ('r', 'p')
            ORDER BY c.relname
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| DriftError::InvariantViolation(e.to_string()))?;

        for row in &rows {
            if let Some(parent_schema) = &row.parent_schema {
                if parent_schema != "public" {
                    return Err(DriftError::UnsupportedCrossSchemaParent {
                        table: row.name.clone(),
                        parent: row.parent_name.clone().unwrap_or_default(),
                        schema: parent_schema.clone(),
                    });
                }
            }
        }

        Ok(rows)
    }

    async fn fetch_columns(&mut self) -> DriftResult<Vec<ColumnRow>> {
        sqlx::query_as::<_, ColumnRow>(
            r#"
            SELECT
                c.relname AS table_name,
                a.attname AS name,
                format_type(a.atttypid, a.atttypmod) AS "type",
                co.collname AS collation,
                a.attnotnull AS is_not_null,
                pg_get_expr(ad.adbin, ad.adrelid) AS default,
                a.attlen AS size_bytes
            FROM pg_attribute a
            JOIN pg_class c ON c.oid = a.attrelid
            JOIN pg_namespace n ON n.oid = c.relnamespace
            LEFT JOIN pg_attrdef ad ON ad.adrelid = a.attrelid AND ad.adnum = a.attnum
            LEFT JOIN pg_collation co ON co.oid = a.attcollation
            WHERE n.nspname = 'public' AND a.attnum > 0 AND NOT a.attisdropped
            ORDER BY c.relname, a.attnum
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| DriftError::InvariantViolation(e.to_string()))
    }

    async fn fetch_indexes(&mut self) -> DriftResult<Vec<IndexRow>> {
        sqlx::query_as::<_, IndexRow>(
            r#"
            SELECT
                t.relname AS table_name,
                ic.relname AS name,
                ix.indisvalid AS is_valid,
                ix.indisprimary AS is_pk,
                ix.indisunique AS is_unique,
                con.conname AS constraint_name,
                parent_ic.relname AS parent_index_name,
                pg_get_indexdef(ic.oid) AS def_stmt
            FROM pg_index ix
            JOIN pg_class ic ON ic.oid = ix.indexrelid
            JOIN pg_class t ON t.oid = ix.indrelid
            JOIN pg_namespace n ON n.oid = t.relnamespace
            LEFT JOIN pg_constraint con ON con.conindid = ic.oid
            LEFT JOIN pg_inherits pi ON pi.inhrelid = ic.oid
            LEFT JOIN pg_class parent_ic ON parent_ic.oid = pi.inhparent
            WHERE n.nspname = 'public'
            ORDER BY ic.relname
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| DriftError::InvariantViolation(e.to_string()))
    }

    async fn fetch_index_columns(&mut self) -> DriftResult<Vec<IndexColumnRow>> {
        sqlx::query_as::<_, IndexColumnRow>(
            r#"
            SELECT
                ic.relname AS index_name,
                a.attname AS column_name
            FROM pg_index ix
            JOIN pg_class ic ON ic.oid = ix.indexrelid
            JOIN pg_namespace n ON n.oid = ic.relnamespace
            JOIN unnest(ix.indkey) WITH ORDINALITY AS k(attnum, ord) ON true
            JOIN pg_attribute a ON a.attrelid = ix.indrelid AND a.attnum = k.attnum
            WHERE n.nspname = 'public'
            ORDER BY ic.relname, k.ord
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| DriftError::InvariantViolation(e.to_string()))
    }

    async fn fetch_check_constraints(&mut self) -> DriftResult<Vec<CheckRow>> {
        sqlx::query_as::<_, CheckRow>(
            r#"
            SELECT
                t.relname AS table_name,
                con.conname AS name,
                pg_get_constraintdef(con.oid) AS expression,
                con.convalidated AS is_valid,
                con.connoinherit AS is_not_inheritable
            FROM pg_constraint con
            JOIN pg_class t ON t.oid = con.conrelid
            JOIN pg_namespace n ON n.oid = t.relnamespace
            WHERE n.nspname = 'public' AND con.contype = 'c'
            ORDER BY t.relname, con.conname
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| DriftError::InvariantViolation(e.to_string()))
    }

    async fn fetch_functions(&mut self) -> DriftResult<Vec<FunctionRow>> {
        sqlx::query_as::<_, FunctionRow>(
            r#"
            SELECT
                n.nspname AS schema,
                p.proname AS name,
                pg_get_function_identity_arguments(p.oid) AS identity_args,
                pg_get_functiondef(p.oid) AS definition,
                l.lanname AS language
            FROM pg_proc p
            JOIN pg_namespace n ON n.oid = p.pronamespace
            JOIN pg_language l ON l.oid = p.prolang
            WHERE n.nspname = 'public'
            ORDER BY p.proname
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| DriftError::InvariantViolation(e.to_string()))
    }

    async fn fetch_function_dependencies(&mut self) -> DriftResult<Vec<FunctionDependencyRow>> {
        Ok(vec![])
    }

    async fn fetch_triggers(&mut self) -> DriftResult<Vec<TriggerRow>> {
        sqlx::query_as::<_, TriggerRow>(
            r#"
            SELECT
                tg.tgname AS name,
                t.relname AS owning_table,
                p.proname AS function,
                pg_get_function_identity_arguments(p.oid) AS function_identity_args,
                pg_get_triggerdef(tg.oid) AS definition
            FROM pg_trigger tg
            JOIN pg_class t ON t.oid = tg.tgrelid
            JOIN pg_namespace n ON n.oid = t.relnamespace
            JOIN pg_proc p ON p.oid = tg.tgfoid
            WHERE n.nspname = 'public' AND NOT tg.tgisinternal
            ORDER BY t.relname, tg.tgname
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| DriftError::InvariantViolation(e.to_string()))
    }
}

impl<'a> CatalogIngestor for PgCatalogIngestor<'a> {
    #[instrument(skip(self))]
    async fn load(&mut self) -> DriftResult<Schema> {
        info!("loading public schema snapshot");

        let table_rows = self.fetch_tables().await?;
        let column_rows = self.fetch_columns().await?;
        let check_rows = self.fetch_check_constraints().await?;

        let mut schema = Schema::new();
        for row in &table_rows {
            let columns: Vec<Column> = column_rows
                .iter()
                .filter(|c| c.table_name == row.name)
                .map(|c| Column {
                    name: c.name.clone(),
                    r#type: c.r#type.clone(),
                    collation: c.collation.clone(),
                    default: c.default.clone().unwrap_or_default(),
                    is_nullable: !c.is_not_null,
                    size_bytes: c.size_bytes,
                })
                .collect();

            let check_constraints: BTreeSet<CheckConstraint> = check_rows
                .iter()
                .filter(|ck| ck.table_name == row.name)
                .map(|ck| CheckConstraint {
                    name: ck.name.clone(),
                    expression: ck.expression.clone(),
                    is_valid: ck.is_valid,
                    is_inheritable: !ck.is_not_inheritable,
                    depends_on_functions: BTreeSet::new(),
                })
                .collect();

            schema = schema.with_table(Table {
                schema: "public".to_string(),
                name: row.name.clone(),
                columns,
                check_constraints,
                partition_key_def: row.partition_key_def.clone(),
                parent_table_name: row.parent_name.clone().unwrap_or_default(),
                for_values: row.partition_for_values.clone(),
            });
        }

        let index_rows = self.fetch_indexes().await?;
        let index_column_rows = self.fetch_index_columns().await?;
        for row in &index_rows {
            let columns: Vec<String> = index_column_rows
                .iter()
                .filter(|c| c.index_name == row.name)
                .map(|c| c.column_name.clone())
                .collect();

            schema = schema.with_index(Index {
                name: row.name.clone(),
                table_name: row.table_name.clone(),
                columns,
                is_invalid: !row.is_valid,
                is_primary_key: row.is_pk,
                is_unique: row.is_unique,
                constraint_name: row.constraint_name.clone().unwrap_or_default(),
                definition_stmt: row.def_stmt.clone(),
                parent_index_name: row.parent_index_name.clone().unwrap_or_default(),
            });
        }

        let function_rows = self.fetch_functions().await?;
        let dependency_rows = self.fetch_function_dependencies().await?;
        for row in &function_rows {
            let escaped_name = format!(
                "\"{}\".\"{}\"({})",
                row.schema, row.name, row.identity_args
            );
            let depends_on_functions = dependency_rows
                .iter()
                .filter(|d| d.function_identity == escaped_name)
                .map(|d| d.depends_on.clone())
                .collect();

            schema = schema.with_function(Function {
                escaped_name,
                definition: row.definition.clone(),
                language: row.language.clone(),
                depends_on_functions,
            });
        }

        let trigger_rows = self.fetch_triggers().await?;
        for row in &trigger_rows {
            schema = schema.with_trigger(Trigger {
                escaped_name: row.name.clone(),
                owning_table: format!("\"public\".\"{}\"", row.owning_table),
                owning_table_unescaped_name: row.owning_table.clone(),
                function: format!(
                    "\"public\".\"{}\"({})",
                    row.function, row.function_identity_args
                ),
                definition_stmt: row.definition.clone(),
            });
        }

        info!(
            tables = schema.tables.len(),
            indexes = schema.indexes.len(),
            functions = schema.functions.len(),
            triggers = schema.triggers.len(),
            "schema snapshot loaded"
        );

        Ok(schema)
    }
}
