//! Trigger diff. Triggers can't be altered in PostgreSQL except by replace, so every
//! persisted-and-changed trigger is a single `CREATE OR REPLACE TRIGGER`.

use crate::model::Trigger;
use crate::ops::Op;

pub fn diff(old: Option<&Trigger>, new: Option<&Trigger>) -> Vec<Op> {
    match (old, new) {
        (None, Some(new_trigger)) => vec![Op::CreateTrigger {
            trigger: new_trigger.clone(),
            replace: false,
        }],

        (Some(old_trigger), None) => vec![Op::DropTrigger {
            name: old_trigger.escaped_name.clone(),
            owning_table: old_trigger.owning_table_unescaped_name.clone(),
        }],

        (Some(old_trigger), Some(new_trigger)) => {
            if triggers_differ_structurally(old_trigger, new_trigger) {
                vec![Op::CreateTrigger {
                    trigger: new_trigger.clone(),
                    replace: true,
                }]
            } else {
                vec![]
            }
        }

        (None, None) => vec![],
    }
}

/// Timing, events, `WHEN` conditions, and the bound function are all captured by the raw
/// `pg_get_triggerdef` text, so a plain string comparison is sufficient and authoritative.
fn triggers_differ_structurally(old: &Trigger, new: &Trigger) -> bool {
    old.definition_stmt != new.definition_stmt
}
