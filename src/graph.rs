//! Dependency graph over table names
//!
//! One node per table, one directed edge `from -> to` per relationship.
//! Nodes live in an arena indexed by position so traversals can track
//! membership with plain vectors instead of hashing names repeatedly.

use crate::models::SchemaMetadata;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    names: Vec<String>,
    index: HashMap<String, usize>,
    successors: Vec<Vec<usize>>,
}

impl DependencyGraph {
    /// Build the graph for a schema. Tables become nodes in declaration
    /// order; relationship targets that are not tables are added as
    /// extra nodes so dangling references stay visible to traversals.
    pub fn from_schema(schema: &SchemaMetadata) -> Self {
        let mut graph = Self::default();

        for table in schema.tables() {
            graph.add_node(&table.name);
        }

        for rel in schema.relationships() {
            graph.add_edge(&rel.from, &rel.to);
        }

        graph
    }

    fn add_node(&mut self, name: &str) -> usize {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), id);
        self.successors.push(Vec::new());
        id
    }

    /// Parallel edges collapse into one
    fn add_edge(&mut self, from: &str, to: &str) {
        let from = self.add_node(from);
        let to = self.add_node(to);
        if !self.successors[from].contains(&to) {
            self.successors[from].push(to);
        }
    }

    pub fn node_count(&self) -> usize {
        self.names.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn name(&self, id: usize) -> &str {
        &self.names[id]
    }

    /// Tables that `node`'s foreign keys point to. Empty when the node is
    /// unknown or has no outgoing edges.
    pub fn successors(&self, node: &str) -> Vec<&str> {
        self.index
            .get(node)
            .map(|&id| self.successor_ids(id).iter().map(|&s| self.name(s)).collect())
            .unwrap_or_default()
    }

    pub(crate) fn successor_ids(&self, id: usize) -> &[usize] {
        &self.successors[id]
    }
}
