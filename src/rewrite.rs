//! Identifier escaping and DDL statement rewriting.
//!
//! Postgres's catalog functions (`pg_get_indexdef`, `pg_get_triggerdef`, `pg_get_functiondef`)
//! hand back complete, already-valid DDL text. Rather than re-derive that DDL from structured
//! fields, we keep it opaque and rewrite it with small prefix substitutions. This keeps the
//! rewriter isolated in one module and immune to drift from catalog output formatting we don't
//! otherwise model (collations, storage params, tablespaces, ...).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::DriftError;

static INDEX_TO_CONCURRENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(CREATE (UNIQUE )?INDEX )(.*)$").expect("valid regex"));

static TRIGGER_TO_OR_REPLACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(CREATE )(.*)$").expect("valid regex"));

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn escape_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Rewrites a `CREATE [UNIQUE] INDEX ...` statement into its `CONCURRENTLY` form.
///
/// Grounded in the one textual shape `pg_get_indexdef` is guaranteed to emit; any other shape
/// is a sign the statement isn't what we think it is, so we fail loudly rather than guess.
pub fn to_concurrent(def: &str) -> Result<String, DriftError> {
    let caps = INDEX_TO_CONCURRENT
        .captures(def)
        .ok_or_else(|| DriftError::malformed_definition("index", def))?;
    Ok(format!("{}CONCURRENTLY {}", &caps[1], &caps[3]))
}

/// Rewrites a `CREATE TRIGGER ...` statement into `CREATE OR REPLACE TRIGGER ...`.
pub fn to_or_replace_trigger(def: &str) -> Result<String, DriftError> {
    let caps = TRIGGER_TO_OR_REPLACE
        .captures(def)
        .ok_or_else(|| DriftError::malformed_definition("trigger", def))?;
    Ok(format!("CREATE OR REPLACE {}", &caps[2]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_plain_index_to_concurrent() {
        let def = "CREATE INDEX idx_users_email ON public.users USING btree (email)";
        assert_eq!(
            to_concurrent(def).unwrap(),
            "CREATE INDEX CONCURRENTLY idx_users_email ON public.users USING btree (email)"
        );
    }

    #[test]
    fn rewrites_unique_index_to_concurrent() {
        let def = "CREATE UNIQUE INDEX idx_users_email ON public.users USING btree (email)";
        assert_eq!(
            to_concurrent(def).unwrap(),
            "CREATE UNIQUE INDEX CONCURRENTLY idx_users_email ON public.users USING btree (email)"
        );
    }

    #[test]
    fn rejects_malformed_index_def() {
        let def = "ALTER INDEX idx_users_email SET (fillfactor = 90)";
        assert!(to_concurrent(def).is_err());
    }

    #[test]
    fn rewrites_trigger_to_or_replace() {
        let def = "CREATE TRIGGER set_updated_at BEFORE UPDATE ON public.users FOR EACH ROW EXECUTE FUNCTION touch_updated_at()";
        assert_eq!(
            to_or_replace_trigger(def).unwrap(),
            "CREATE OR REPLACE TRIGGER set_updated_at BEFORE UPDATE ON public.users FOR EACH ROW EXECUTE FUNCTION touch_updated_at()"
        );
    }

    #[test]
    fn rejects_malformed_trigger_def() {
        assert!(to_or_replace_trigger("DROP TRIGGER set_updated_at ON public.users").is_err());
    }

    #[test]
    fn quotes_and_doubles_embedded_quotes() {
        assert_eq!(quote_ident("plain"), "\"plain\"");
        assert_eq!(quote_ident(r#"weird"name"#), "\"weird\"\"name\"");
    }
}
