//! Layer Diff Engine
//!
//! Structural comparison of two layers' table sets. Tables are matched by
//! name, columns by name, foreign keys by `(column, reference)` and indexes
//! by name. Comparing a layer with itself always yields an empty diff.

use crate::layer::Layer;
use crate::models::{Column, ForeignKey, Index, Table};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Old/new pair for a single changed column attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change<T> {
    pub old: T,
    pub new: T,
}

impl<T: PartialEq + Clone> Change<T> {
    fn between(old: &T, new: &T) -> Option<Self> {
        (old != new).then(|| Self {
            old: old.clone(),
            new: new.clone(),
        })
    }
}

/// Column present on both sides whose definition changed.
/// Unchanged attributes are absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnModification {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<Change<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<Change<bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Change<Option<String>>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableModification {
    pub table_name: String,
    #[serde(default)]
    pub added_columns: Vec<Column>,
    #[serde(default)]
    pub removed_columns: Vec<String>,
    #[serde(default)]
    pub modified_columns: Vec<ColumnModification>,
    #[serde(default)]
    pub added_foreign_keys: Vec<ForeignKey>,
    #[serde(default)]
    pub removed_foreign_keys: Vec<ForeignKey>,
    #[serde(default)]
    pub added_indexes: Vec<Index>,
    #[serde(default)]
    pub removed_indexes: Vec<String>,
}

impl TableModification {
    pub fn is_empty(&self) -> bool {
        self.added_columns.is_empty()
            && self.removed_columns.is_empty()
            && self.modified_columns.is_empty()
            && self.added_foreign_keys.is_empty()
            && self.removed_foreign_keys.is_empty()
            && self.added_indexes.is_empty()
            && self.removed_indexes.is_empty()
    }
}

/// Structural delta from a base layer to a draft layer
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDiff {
    #[serde(default)]
    pub added: Vec<Table>,
    #[serde(default)]
    pub removed: Vec<String>,
    #[serde(default)]
    pub modified: Vec<TableModification>,
}

impl SchemaDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    pub fn summary(&self) -> DiffSummary {
        let sum = |f: fn(&TableModification) -> usize| self.modified.iter().map(f).sum::<usize>();

        let mut summary = DiffSummary {
            tables_added: self.added.len(),
            tables_removed: self.removed.len(),
            tables_modified: self.modified.len(),
            columns_added: sum(|m| m.added_columns.len()),
            columns_removed: sum(|m| m.removed_columns.len()),
            columns_modified: sum(|m| m.modified_columns.len()),
            fks_added: sum(|m| m.added_foreign_keys.len()),
            fks_removed: sum(|m| m.removed_foreign_keys.len()),
            indexes_added: sum(|m| m.added_indexes.len()),
            indexes_removed: sum(|m| m.removed_indexes.len()),
            total_changes: 0,
        };
        summary.total_changes = summary.tables_added
            + summary.tables_removed
            + summary.columns_added
            + summary.columns_removed
            + summary.columns_modified
            + summary.fks_added
            + summary.fks_removed
            + summary.indexes_added
            + summary.indexes_removed;
        summary
    }
}

/// Summary statistics for the diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    pub tables_added: usize,
    pub tables_removed: usize,
    pub tables_modified: usize,
    pub columns_added: usize,
    pub columns_removed: usize,
    pub columns_modified: usize,
    pub fks_added: usize,
    pub fks_removed: usize,
    pub indexes_added: usize,
    pub indexes_removed: usize,
    pub total_changes: usize,
}

/// The diff engine that compares layers
pub struct DiffEngine;

impl DiffEngine {
    /// Compare two layers
    pub fn compare(base: &Layer, draft: &Layer) -> SchemaDiff {
        Self::compare_tables(&base.tables, &draft.tables)
    }

    /// Added and modified tables follow draft order; removed tables follow
    /// base order.
    pub fn compare_tables(base: &[Table], draft: &[Table]) -> SchemaDiff {
        let base_map: HashMap<&str, &Table> = base.iter().map(|t| (t.name.as_str(), t)).collect();
        let draft_names: HashSet<&str> = draft.iter().map(|t| t.name.as_str()).collect();

        let mut diff = SchemaDiff::default();

        for draft_table in draft {
            match base_map.get(draft_table.name.as_str()) {
                None => diff.added.push(draft_table.clone()),
                Some(base_table) => {
                    let modification = Self::compare_table(base_table, draft_table);
                    if !modification.is_empty() {
                        diff.modified.push(modification);
                    }
                }
            }
        }

        diff.removed = base
            .iter()
            .filter(|t| !draft_names.contains(t.name.as_str()))
            .map(|t| t.name.clone())
            .collect();

        diff
    }

    fn compare_table(base: &Table, draft: &Table) -> TableModification {
        let base_cols: HashMap<&str, &Column> =
            base.columns.iter().map(|c| (c.name.as_str(), c)).collect();
        let draft_cols: HashSet<&str> = draft.columns.iter().map(|c| c.name.as_str()).collect();

        let mut modification = TableModification {
            table_name: draft.name.clone(),
            ..Default::default()
        };

        for col in &draft.columns {
            match base_cols.get(col.name.as_str()) {
                None => modification.added_columns.push(col.clone()),
                Some(base_col) => {
                    if let Some(change) = Self::compare_column(base_col, col) {
                        modification.modified_columns.push(change);
                    }
                }
            }
        }

        modification.removed_columns = base
            .columns
            .iter()
            .filter(|c| !draft_cols.contains(c.name.as_str()))
            .map(|c| c.name.clone())
            .collect();

        // FK identity ignores on_delete/on_update
        let base_fks: HashSet<(&str, &str)> = base.foreign_keys.iter().map(|fk| fk.identity()).collect();
        let draft_fks: HashSet<(&str, &str)> =
            draft.foreign_keys.iter().map(|fk| fk.identity()).collect();

        modification.added_foreign_keys = draft
            .foreign_keys
            .iter()
            .filter(|fk| !base_fks.contains(&fk.identity()))
            .cloned()
            .collect();
        modification.removed_foreign_keys = base
            .foreign_keys
            .iter()
            .filter(|fk| !draft_fks.contains(&fk.identity()))
            .cloned()
            .collect();

        // Indexes match by name only
        let base_idxs: HashSet<&str> = base.indexes.iter().map(|i| i.name.as_str()).collect();
        let draft_idxs: HashSet<&str> = draft.indexes.iter().map(|i| i.name.as_str()).collect();

        modification.added_indexes = draft
            .indexes
            .iter()
            .filter(|i| !base_idxs.contains(i.name.as_str()))
            .cloned()
            .collect();
        modification.removed_indexes = base
            .indexes
            .iter()
            .filter(|i| !draft_idxs.contains(i.name.as_str()))
            .map(|i| i.name.clone())
            .collect();

        modification
    }

    fn compare_column(base: &Column, draft: &Column) -> Option<ColumnModification> {
        let modification = ColumnModification {
            name: draft.name.clone(),
            data_type: Change::between(&base.data_type, &draft.data_type),
            nullable: Change::between(&base.nullable, &draft.nullable),
            default: Change::between(&base.default, &draft.default),
        };

        let changed = modification.data_type.is_some()
            || modification.nullable.is_some()
            || modification.default.is_some();

        changed.then_some(modification)
    }
}
