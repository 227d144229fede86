//! Circular foreign key dependency search
//!
//! Depth-first search from every unvisited node. Once a back edge is found
//! the current root stops exploring; other roots are still searched, so
//! disjoint cycles are all reported. Cycles over the same set of tables are
//! reported once, first occurrence wins.

use crate::graph::DependencyGraph;
use std::collections::HashSet;

/// Each cycle lists its tables in traversal order with the first table
/// repeated at the end, e.g. `[a, b, c, a]`.
pub fn find_cycles(graph: &DependencyGraph) -> Vec<Vec<String>> {
    let mut search = CycleSearch::new(graph);

    for root in 0..graph.node_count() {
        if !search.visited[root] {
            search.visit(root);
            search.reset_stack();
        }
    }

    let mut seen: HashSet<Vec<usize>> = HashSet::new();
    search
        .cycles
        .into_iter()
        .filter(|cycle| seen.insert(canonical_key(cycle)))
        .map(|cycle| cycle.iter().map(|&id| graph.name(id).to_string()).collect())
        .collect()
}

/// Sorted, de-duplicated membership; rotations and reorderings collapse
fn canonical_key(cycle: &[usize]) -> Vec<usize> {
    let mut key = cycle.to_vec();
    key.sort_unstable();
    key.dedup();
    key
}

struct CycleSearch<'g> {
    graph: &'g DependencyGraph,
    visited: Vec<bool>,
    on_stack: Vec<bool>,
    path: Vec<usize>,
    cycles: Vec<Vec<usize>>,
}

impl<'g> CycleSearch<'g> {
    fn new(graph: &'g DependencyGraph) -> Self {
        let n = graph.node_count();
        Self {
            graph,
            visited: vec![false; n],
            on_stack: vec![false; n],
            path: Vec::new(),
            cycles: Vec::new(),
        }
    }

    /// Returns true as soon as a cycle is recorded beneath `node`
    fn visit(&mut self, node: usize) -> bool {
        self.visited[node] = true;
        self.on_stack[node] = true;
        self.path.push(node);

        let graph = self.graph;
        for &next in graph.successor_ids(node) {
            if !self.visited[next] {
                if self.visit(next) {
                    return true;
                }
            } else if self.on_stack[next] {
                if let Some(start) = self.path.iter().position(|&n| n == next) {
                    let mut cycle = self.path[start..].to_vec();
                    cycle.push(next);
                    self.cycles.push(cycle);
                }
                return true;
            }
        }

        self.path.pop();
        self.on_stack[node] = false;
        false
    }

    /// An early exit leaves the aborted chain on the stack; clear it so the
    /// next root starts clean.
    fn reset_stack(&mut self) {
        for &node in &self.path {
            self.on_stack[node] = false;
        }
        self.path.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Column, ForeignKey, SchemaMetadata, Table};

    fn table(name: &str, refs: &[&str]) -> Table {
        let mut t = Table::new(name).column(Column::new("id", "integer"));
        for (i, r) in refs.iter().enumerate() {
            let col = format!("ref_{}", i);
            t = t
                .column(Column::new(col.clone(), "integer"))
                .foreign_key(ForeignKey::new(col, format!("{}.id", r)));
        }
        t
    }

    fn cycles_of(tables: Vec<Table>) -> Vec<Vec<String>> {
        let schema = SchemaMetadata::new(tables, vec![]);
        find_cycles(&DependencyGraph::from_schema(&schema))
    }

    #[test]
    fn test_triangle_is_one_cycle() {
        let cycles = cycles_of(vec![
            table("a", &["b"]),
            table("b", &["c"]),
            table("c", &["a"]),
        ]);

        assert_eq!(cycles, vec![vec!["a", "b", "c", "a"]]);
    }

    #[test]
    fn test_acyclic_graph() {
        let cycles = cycles_of(vec![
            table("users", &[]),
            table("orders", &["users"]),
            table("items", &["orders", "users"]),
        ]);
        assert!(cycles.is_empty());
    }

    #[test]
    fn test_self_reference() {
        let cycles = cycles_of(vec![table("employees", &["employees"])]);
        assert_eq!(cycles, vec![vec!["employees", "employees"]]);
    }

    #[test]
    fn test_disjoint_cycles_are_both_found() {
        let cycles = cycles_of(vec![
            table("a", &["b"]),
            table("b", &["a"]),
            table("x", &["y"]),
            table("y", &["x"]),
        ]);
        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[1], vec!["x", "y", "x"]);
    }

    #[test]
    fn test_early_exit_under_reports_shared_root() {
        // a -> b -> a and a -> c -> a share root `a`; only the first is seen
        let cycles = cycles_of(vec![
            table("a", &["b", "c"]),
            table("b", &["a"]),
            table("c", &["a"]),
        ]);
        assert_eq!(cycles, vec![vec!["a", "b", "a"]]);
    }

    #[test]
    fn test_canonical_key_ignores_rotation() {
        assert_eq!(canonical_key(&[0, 1, 2, 0]), canonical_key(&[1, 2, 0, 1]));
        assert_ne!(canonical_key(&[0, 1, 0]), canonical_key(&[0, 2, 0]));
    }
}
