use std::collections::BTreeMap;

use super::{Function, Index, Table, Trigger};

/// A fully loaded `public` schema: four maps keyed by each object kind's identity.
///
/// Keying by `BTreeMap` (rather than the insertion-order `Vec` the catalog ingestor sees)
/// is what gives the differ invariant #4: iterating a normalized `Schema` is deterministic
/// regardless of the order the catalog happened to return rows in. Column order within a
/// table is the one place order is meaningful, and that's preserved inside `Table::columns`.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub tables: BTreeMap<String, Table>,
    pub indexes: BTreeMap<String, Index>,
    pub functions: BTreeMap<String, Function>,
    pub triggers: BTreeMap<String, Trigger>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: Table) -> Self {
        self.tables.insert(table.name.clone(), table);
        self
    }

    pub fn with_index(mut self, index: Index) -> Self {
        self.indexes.insert(index.name.clone(), index);
        self
    }

    pub fn with_function(mut self, function: Function) -> Self {
        self.functions.insert(function.id_key(), function);
        self
    }

    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.triggers.insert(trigger.id_key(), trigger);
        self
    }
}
