use super::{Identified, ObjectId};

/// A row-level or statement-level trigger.
///
/// Identity is `owning_table` + `"_"` + the trigger's own escaped name, matching how Postgres
/// itself disambiguates triggers: names only need to be unique per-table, not schema-wide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub escaped_name: String,
    pub owning_table: String,
    pub owning_table_unescaped_name: String,
    pub function: String,
    /// Verbatim `pg_get_triggerdef()` output, rewritten through
    /// [`crate::rewrite::to_or_replace`] when (re)creating the trigger.
    pub definition_stmt: String,
}

impl Trigger {
    pub fn id_key(&self) -> String {
        format!("{}_{}", self.owning_table, self.escaped_name)
    }
}

impl Identified for Trigger {
    fn id(&self) -> ObjectId {
        ObjectId::Trigger(self.id_key())
    }
}
