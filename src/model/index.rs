use super::{Identified, ObjectId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: String,
    pub table_name: String,
    /// Column (or expression) names in index order; order is significant.
    pub columns: Vec<String>,
    pub is_invalid: bool,
    pub is_primary_key: bool,
    pub is_unique: bool,
    /// Name of the constraint this index backs, empty when the index has no owning constraint.
    pub constraint_name: String,
    /// Verbatim `pg_get_indexdef()` output. Treated as opaque; only ever rewritten through
    /// [`crate::rewrite::to_concurrent`], never reconstructed field-by-field.
    pub definition_stmt: String,
    /// Name of the parent index, if this index is itself a partition of a partitioned index.
    pub parent_index_name: String,
}

impl Index {
    pub fn has_owning_constraint(&self) -> bool {
        !self.constraint_name.is_empty()
    }

    pub fn is_partition_of_index(&self) -> bool {
        !self.parent_index_name.is_empty()
    }
}

impl Identified for Index {
    fn id(&self) -> ObjectId {
        ObjectId::Index(self.name.clone())
    }
}

/// An index is structurally different from another with the same name when anything other
/// than validity has changed. This includes `constraint_name`: a same-shape index reattached
/// to a differently named constraint is a rename, and renames are intentionally not
/// optimized — they go through the same drop-and-rebuild path as any other structural change
/// (see the design note on renamed PK/unique-constraint indexes).
pub fn structurally_different(old: &Index, new: &Index) -> bool {
    old.table_name != new.table_name
        || old.columns != new.columns
        || old.is_primary_key != new.is_primary_key
        || old.is_unique != new.is_unique
        || old.definition_stmt != new.definition_stmt
        || old.parent_index_name != new.parent_index_name
        || old.constraint_name != new.constraint_name
}
