use std::collections::BTreeSet;

use super::{Identified, ObjectId};

/// A PL/pgSQL (or other) function. Identity is the pre-escaped, signature-qualified name
/// `"schema"."name"(identity_args)` rather than the bare name, since Postgres allows
/// overloading: two functions can share a name and differ only in argument types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    /// Pre-escaped `"schema"."name"(identity_args)`. Built once by the ingestor; the differ
    /// and renderer always treat it as an opaque string, never re-parse or re-escape it.
    pub escaped_name: String,
    /// Verbatim `CREATE OR REPLACE FUNCTION ...` statement from `pg_get_functiondef()`.
    pub definition: String,
    pub language: String,
    pub depends_on_functions: BTreeSet<String>,
}

impl Function {
    /// The key this function is stored and diffed under.
    pub fn id_key(&self) -> String {
        self.escaped_name.clone()
    }
}

impl Identified for Function {
    fn id(&self) -> ObjectId {
        ObjectId::Function(self.escaped_name.clone())
    }
}

/// `plpgsql` and other non-SQL languages have bodies Postgres doesn't expose structurally, so
/// the differ can't tell which internal details changed. Any definition change for such a
/// function is therefore always emitted, even when every field we can compare looks the same.
pub fn is_untracked_language(language: &str) -> bool {
    !language.eq_ignore_ascii_case("sql")
}
