//! Per-object-kind differs.
//!
//! Each submodule compares one kind of `Persisted` object and returns zero or more `Op`
//! records. [`diff_schema`] walks the two schemas in the fixed order the design calls for —
//! tables, indexes, functions, triggers — and feeds each kind through a shared keyed-diff
//! helper so identity classification (`Added`/`Dropped`/`Persisted`) lives in one place.

pub mod columns;
pub mod functions;
pub mod indexes;
pub mod tables;
pub mod triggers;

use std::collections::{BTreeMap, BTreeSet};

use crate::model::Schema;
use crate::ops::Op;

pub fn diff_schema(old: &Schema, new: &Schema) -> Vec<Op> {
    let mut ops = Vec::new();

    ops.extend(diff_keyed(&old.tables, &new.tables, tables::diff));
    ops.extend(diff_keyed(&old.indexes, &new.indexes, indexes::diff));
    ops.extend(diff_keyed(&old.functions, &new.functions, functions::diff));
    ops.extend(diff_keyed(&old.triggers, &new.triggers, triggers::diff));

    ops
}

/// Classifies every identity in `old`/`new` as `Added`, `Dropped`, or `Persisted` and calls
/// `diff_fn` once per identity. Keying through a `BTreeMap` means the order identities are
/// visited in is the order `Ord` puts them in, not catalog fetch order — invariant #4.
fn diff_keyed<T, R>(
    old: &BTreeMap<String, T>,
    new: &BTreeMap<String, T>,
    diff_fn: impl Fn(Option<&T>, Option<&T>) -> Vec<R>,
) -> Vec<R> {
    let all_ids: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    all_ids
        .into_iter()
        .flat_map(|id| diff_fn(old.get(id), new.get(id)))
        .collect()
}
