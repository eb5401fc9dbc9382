//! Dependency Graph & Planner.
//!
//! Builds a DAG over emitted [`Op`]s, adds the ordering constraints the design calls for on
//! top of raw read/write dependencies, topologically sorts with a deterministic tie-break,
//! and marks which ops need a transaction barrier around them.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::graph::DiGraph;
use petgraph::visit::EdgeRef;

use crate::error::{DriftError, DriftResult};
use crate::model::ObjectId;
use crate::ops::{AlterTableOp, Op};

/// One statement in the final plan: the op itself, plus whether the executor must commit
/// and start a fresh transaction immediately before running it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedOp {
    pub op: Op,
    pub is_barrier: bool,
}

pub fn plan(ops: Vec<Op>) -> DriftResult<Vec<PlannedOp>> {
    let ordered = order(ops)?;
    Ok(ordered
        .into_iter()
        .map(|op| {
            let is_barrier = needs_barrier(&op);
            PlannedOp { op, is_barrier }
        })
        .collect())
}

/// An op cannot run inside a transaction block alongside other statements.
fn needs_barrier(op: &Op) -> bool {
    matches!(
        op,
        Op::DropIndex { concurrently: true, .. } | Op::AlterIndex { .. }
    ) || matches!(op, Op::CreateIndex(idx) if !idx.is_partition_of_index())
}

fn order(ops: Vec<Op>) -> DriftResult<Vec<Op>> {
    let mut graph: DiGraph<usize, ()> = DiGraph::new();
    let mut node_of = Vec::with_capacity(ops.len());
    let mut indices_by_id: BTreeMap<ObjectId, Vec<usize>> = BTreeMap::new();

    for (i, op) in ops.iter().enumerate() {
        node_of.push(graph.add_node(i));
        indices_by_id.entry(op.product()).or_default().push(i);
    }

    // read-before-write: whatever an op depends on must already exist.
    for (i, op) in ops.iter().enumerate() {
        for dep in op.dependencies() {
            if let Some(dep_indices) = indices_by_id.get(&dep) {
                for &dep_i in dep_indices {
                    if dep_i != i {
                        graph.add_edge(node_of[dep_i], node_of[i], ());
                    }
                }
            }
        }
    }

    // Drops before creates of the same identity (rebuilds).
    let mut drop_indices: BTreeMap<ObjectId, Vec<usize>> = BTreeMap::new();
    let mut create_indices: BTreeMap<ObjectId, Vec<usize>> = BTreeMap::new();
    let mut other_indices: BTreeMap<ObjectId, Vec<usize>> = BTreeMap::new();

    for (i, op) in ops.iter().enumerate() {
        let id = op.product();
        if op.is_drop() {
            drop_indices.entry(id).or_default().push(i);
        } else if op.is_create() {
            create_indices.entry(id).or_default().push(i);
        } else {
            other_indices.entry(id).or_default().push(i);
        }
    }

    for (id, drops) in &drop_indices {
        if let Some(creates) = create_indices.get(id) {
            for &drop_i in drops {
                for &create_i in creates {
                    graph.add_edge(node_of[drop_i], node_of[create_i], ());
                }
            }
        }
    }

    // Table/function creates before anything (index, constraint, trigger) built on them —
    // already covered by read-before-write above since those ops declare the table/function
    // as a dependency; creates-before-other below covers same-identity alter-after-create.
    for (id, creates) in &create_indices {
        if let Some(others) = other_indices.get(id) {
            for &create_i in creates {
                for &other_i in others {
                    graph.add_edge(node_of[create_i], node_of[other_i], ());
                }
            }
        }
    }

    // A constraint drop must run before any index drop on the same table: Postgres refuses
    // to drop an index that still backs a live constraint.
    for (i, op) in ops.iter().enumerate() {
        if let Op::AlterTable { table, ops: sub_ops } = op {
            if sub_ops.iter().any(|sub| matches!(sub, AlterTableOp::DropConstraint(_))) {
                for (j, other) in ops.iter().enumerate() {
                    if let Op::DropIndex { table_name, .. } = other {
                        if table_name == table {
                            graph.add_edge(node_of[i], node_of[j], ());
                        }
                    }
                }
            }
        }
    }

    // Kahn's algorithm with a deterministic frontier: among all ops whose dependencies are
    // already satisfied, always pick the one with the smallest (kind rank, identity). This
    // keeps every edge added above honored in the final order, using (kind rank, identity)
    // only to break ties the graph itself leaves open — unlike a post-hoc sort over the whole
    // list, which would silently undo edges whenever two connected ops compare unequal.
    let mut in_degree: Vec<usize> = vec![0; ops.len()];
    for edge in graph.edge_references() {
        in_degree[graph[edge.target()]] += 1;
    }

    let mut frontier: BTreeSet<(u8, ObjectId, usize)> = BTreeSet::new();
    for (i, op) in ops.iter().enumerate() {
        if in_degree[i] == 0 {
            frontier.insert((op.kind_rank(), op.product(), i));
        }
    }

    let mut visited = vec![false; ops.len()];
    let mut order = Vec::with_capacity(ops.len());
    while let Some(&(_, _, i)) = frontier.iter().next() {
        frontier.remove(&(ops[i].kind_rank(), ops[i].product(), i));
        visited[i] = true;
        order.push(i);
        for edge in graph.edges(node_of[i]) {
            let j = graph[edge.target()];
            in_degree[j] -= 1;
            if in_degree[j] == 0 {
                frontier.insert((ops[j].kind_rank(), ops[j].product(), j));
            }
        }
    }

    if order.len() != ops.len() {
        let stuck_idx = (0..ops.len()).find(|&i| !visited[i]).unwrap();
        return Err(DriftError::SchemaCycle(vec![ops[stuck_idx].product()]));
    }

    Ok(order.into_iter().map(|i| ops[i].clone()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Index, Table};
    use std::collections::BTreeSet;

    fn make_table(name: &str) -> Table {
        Table {
            schema: "public".into(),
            name: name.into(),
            columns: vec![],
            check_constraints: BTreeSet::new(),
            partition_key_def: String::new(),
            parent_table_name: String::new(),
            for_values: String::new(),
        }
    }

    fn make_index(name: &str, table: &str) -> Index {
        Index {
            name: name.into(),
            table_name: table.into(),
            columns: vec!["id".into()],
            is_invalid: false,
            is_primary_key: false,
            is_unique: false,
            constraint_name: String::new(),
            definition_stmt: format!("CREATE INDEX {name} ON public.{table} USING btree (id)"),
            parent_index_name: String::new(),
        }
    }

    #[test]
    fn table_create_before_its_index_create() {
        let ops = vec![
            Op::CreateIndex(make_index("idx_id", "users")),
            Op::CreateTable(make_table("users")),
        ];
        let planned = plan(ops).unwrap();
        let table_pos = planned.iter().position(|p| matches!(p.op, Op::CreateTable(_))).unwrap();
        let index_pos = planned.iter().position(|p| matches!(p.op, Op::CreateIndex(_))).unwrap();
        assert!(table_pos < index_pos);
    }

    #[test]
    fn concurrent_index_create_is_barriered() {
        let ops = vec![Op::CreateIndex(make_index("idx_id", "users"))];
        let planned = plan(ops).unwrap();
        assert!(planned[0].is_barrier);
    }

    #[test]
    fn plain_alter_table_is_not_barriered() {
        let ops = vec![Op::DropTable("users".into())];
        let planned = plan(ops).unwrap();
        assert!(!planned[0].is_barrier);
    }

    #[test]
    fn constraint_drop_orders_before_backing_index_drop() {
        let ops = vec![
            Op::DropIndex { name: "users_email_key".into(), table_name: "users".into(), concurrently: true },
            Op::AlterTable {
                table: "users".into(),
                ops: vec![crate::ops::AlterTableOp::DropConstraint("users_email_key".into())],
            },
        ];
        let planned = plan(ops).unwrap();
        let constraint_pos = planned.iter().position(|p| matches!(p.op, Op::AlterTable { .. })).unwrap();
        let index_pos = planned.iter().position(|p| matches!(p.op, Op::DropIndex { .. })).unwrap();
        assert!(constraint_pos < index_pos);
    }

    #[test]
    fn deterministic_tie_break_orders_by_identity() {
        let ops = vec![Op::DropTable("zebra".into()), Op::DropTable("apple".into())];
        let planned = plan(ops).unwrap();
        let names: Vec<_> = planned
            .iter()
            .map(|p| match &p.op {
                Op::DropTable(n) => n.clone(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(names, vec!["apple".to_string(), "zebra".to_string()]);
    }
}
