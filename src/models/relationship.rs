//! Relationships derived from foreign keys

use crate::models::Table;
use serde::Serialize;

/// Best-effort cardinality of a single foreign key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipKind {
    OneToOne,
    OneToMany,
}

/// One edge per foreign key. Never stored on its own; always rebuilt
/// from the owning tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub from: String,
    pub to: String,
    pub from_column: String,
    pub to_column: String,
    #[serde(rename = "type")]
    pub kind: RelationshipKind,
}

/// Derive every relationship of a table set, in table then FK order.
/// Foreign keys whose reference is not `table.column` yield no edge.
pub fn derive_relationships(tables: &[Table]) -> Vec<Relationship> {
    tables
        .iter()
        .flat_map(|table| {
            table.foreign_keys.iter().filter_map(move |fk| {
                let (to, to_column) = fk.target()?;
                Some(Relationship {
                    from: table.name.clone(),
                    to: to.to_string(),
                    from_column: fk.column.clone(),
                    to_column: to_column.to_string(),
                    kind: classify(table, &fk.column),
                })
            })
        })
        .collect()
}

fn classify(table: &Table, fk_column: &str) -> RelationshipKind {
    if table.is_primary_key_column(fk_column) || table.has_unique_index_on(fk_column) {
        RelationshipKind::OneToOne
    } else {
        RelationshipKind::OneToMany
    }
}

/// Junction tables: at least two foreign keys and at most two columns
/// beyond them. These model many-to-many links.
pub fn is_junction_table(table: &Table) -> bool {
    let fk_count = table.foreign_keys.len();
    fk_count >= 2 && table.columns.len() <= fk_count + 2
}
