//! Maps an [`Op`] (plus a little surrounding context) to the advisory hazard tags it carries.
//!
//! Hazards never influence ordering; see [`crate::planner`] for that. They exist purely so a
//! caller can warn an operator before running the plan.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::ops::{AlterColumnOp, AlterTableOp, Op};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Hazard {
    AcquiresAccessExclusiveLock,
    IndexBuild,
    IndexDropped,
    DeletesData,
    ImpactsDatabasePerformance,
    HasUntrackableDependencies,
    IsUserGenerated,
}

/// Context the classifier needs beyond the Op itself: things the differ knew at emission
/// time but that don't belong on the Op's own shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct HazardContext {
    pub column_added_not_null_no_default: bool,
    pub causes_table_rewrite: bool,
    pub is_large_table: bool,
    pub function_untracked_language: bool,
    pub user_generated: bool,
}

pub fn classify(op: &Op, ctx: &HazardContext) -> BTreeSet<Hazard> {
    let mut hazards = BTreeSet::new();

    if ctx.user_generated {
        hazards.insert(Hazard::IsUserGenerated);
    }
    if ctx.function_untracked_language {
        hazards.insert(Hazard::HasUntrackableDependencies);
    }

    match op {
        Op::CreateTable(_) => {}
        Op::DropTable(_) => {
            hazards.insert(Hazard::DeletesData);
        }
        Op::AlterTable { ops, .. } => {
            for sub in ops {
                match sub {
                    AlterTableOp::AddColumn(col) => {
                        if !col.is_nullable && !col.has_default() {
                            hazards.insert(Hazard::AcquiresAccessExclusiveLock);
                        }
                    }
                    AlterTableOp::DropColumn(_) => {
                        hazards.insert(Hazard::DeletesData);
                    }
                    AlterTableOp::AlterColumn(alter) => match alter {
                        AlterColumnOp::SetType { .. } => {
                            hazards.insert(Hazard::AcquiresAccessExclusiveLock);
                            if ctx.causes_table_rewrite {
                                hazards.insert(Hazard::ImpactsDatabasePerformance);
                            }
                        }
                        AlterColumnOp::SetNotNull { .. } => {
                            hazards.insert(Hazard::AcquiresAccessExclusiveLock);
                            if ctx.is_large_table {
                                hazards.insert(Hazard::ImpactsDatabasePerformance);
                            }
                        }
                        AlterColumnOp::DropNotNull { .. } => {
                            hazards.insert(Hazard::AcquiresAccessExclusiveLock);
                        }
                        AlterColumnOp::SetDefault { .. }
                        | AlterColumnOp::DropDefault { .. }
                        | AlterColumnOp::SetCollation { .. } => {
                            hazards.insert(Hazard::AcquiresAccessExclusiveLock);
                        }
                    },
                    AlterTableOp::AddCheckConstraint(_) => {}
                    AlterTableOp::DropCheckConstraint(_) => {
                        hazards.insert(Hazard::AcquiresAccessExclusiveLock);
                    }
                    AlterTableOp::ValidateCheckConstraint(_) => {
                        hazards.insert(Hazard::ImpactsDatabasePerformance);
                    }
                    AlterTableOp::AddPrimaryKeyUsingIndex { .. } => {
                        hazards.insert(Hazard::AcquiresAccessExclusiveLock);
                    }
                    AlterTableOp::DropConstraint(_) => {
                        hazards.insert(Hazard::AcquiresAccessExclusiveLock);
                    }
                }
            }
        }
        Op::CreateIndex(_) => {
            hazards.insert(Hazard::IndexBuild);
        }
        Op::DropIndex { concurrently, .. } => {
            hazards.insert(Hazard::IndexDropped);
            if !concurrently {
                hazards.insert(Hazard::AcquiresAccessExclusiveLock);
            }
        }
        Op::AlterIndex { .. } => {
            hazards.insert(Hazard::ImpactsDatabasePerformance);
        }
        Op::CreateConstraint { .. } => {}
        Op::DropConstraint { .. } => {
            hazards.insert(Hazard::AcquiresAccessExclusiveLock);
        }
        Op::ValidateConstraint { .. } => {
            hazards.insert(Hazard::ImpactsDatabasePerformance);
        }
        Op::CreateFunction { .. } | Op::DropFunction { .. } => {}
        Op::CreateTrigger { .. } | Op::DropTrigger { .. } => {}
    }

    hazards
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Column, Index};

    fn nullable_default_ctx() -> HazardContext {
        HazardContext::default()
    }

    #[test]
    fn create_index_is_always_index_build() {
        let idx = Index {
            name: "idx".into(),
            table_name: "t".into(),
            columns: vec!["a".into()],
            is_invalid: false,
            is_primary_key: false,
            is_unique: false,
            constraint_name: String::new(),
            definition_stmt: "CREATE INDEX idx ON t (a)".into(),
            parent_index_name: String::new(),
        };
        let op = Op::CreateIndex(idx);
        let hazards = classify(&op, &nullable_default_ctx());
        assert!(hazards.contains(&Hazard::IndexBuild));
        assert!(!hazards.contains(&Hazard::AcquiresAccessExclusiveLock));
    }

    #[test]
    fn add_not_null_column_without_default_is_ael() {
        let col = Column {
            name: "c".into(),
            r#type: "int".into(),
            collation: None,
            default: String::new(),
            is_nullable: false,
            size_bytes: 4,
        };
        let op = Op::AlterTable {
            table: "t".into(),
            ops: vec![AlterTableOp::AddColumn(col)],
        };
        let hazards = classify(&op, &nullable_default_ctx());
        assert!(hazards.contains(&Hazard::AcquiresAccessExclusiveLock));
    }

    #[test]
    fn drop_table_deletes_data() {
        let hazards = classify(&Op::DropTable("t".into()), &nullable_default_ctx());
        assert_eq!(hazards, BTreeSet::from([Hazard::DeletesData]));
    }

    #[test]
    fn drop_index_non_concurrent_is_ael_and_dropped() {
        let op = Op::DropIndex {
            name: "idx".into(),
            table_name: "t".into(),
            concurrently: false,
        };
        let hazards = classify(&op, &nullable_default_ctx());
        assert!(hazards.contains(&Hazard::IndexDropped));
        assert!(hazards.contains(&Hazard::AcquiresAccessExclusiveLock));
    }
}
