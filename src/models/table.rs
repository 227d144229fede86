//! Table, column and index models

use crate::models::ForeignKey;
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const DEFAULT_SCHEMA: &str = "public";

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

/// Column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    #[validate(length(min = 1, message = "Column name is required"))]
    pub name: String,

    /// Engine-specific declared type, kept verbatim
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "Column type is required"))]
    pub data_type: String,

    pub nullable: bool,

    #[serde(default)]
    pub default: Option<String>,

    /// Derived from the owning table's `primaryKeys`
    #[serde(default)]
    pub is_primary_key: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            default: None,
            is_primary_key: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_default(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }

    /// Default expression, treating an empty string as absent
    pub fn default_expr(&self) -> Option<&str> {
        self.default.as_deref().filter(|d| !d.is_empty())
    }
}

/// Index definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Index {
    #[validate(length(min = 1, message = "Index name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "Index must cover at least one column"))]
    pub columns: Vec<String>,

    #[serde(default)]
    pub unique: bool,
}

impl Index {
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            unique: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn covers(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

/// Table definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    #[validate(length(min = 1, message = "Table name is required"))]
    pub name: String,

    #[serde(default = "default_schema")]
    pub schema: String,

    #[validate(nested)]
    pub columns: Vec<Column>,

    #[serde(default)]
    #[validate(nested)]
    pub foreign_keys: Vec<ForeignKey>,

    #[serde(default)]
    #[validate(nested)]
    pub indexes: Vec<Index>,

    #[serde(default)]
    pub primary_keys: Vec<String>,

    // Observability only, never read by analysis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<i64>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: default_schema(),
            columns: Vec::new(),
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
            primary_keys: Vec::new(),
            row_count: None,
            size_bytes: None,
        }
    }

    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_keys = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    pub fn index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn is_primary_key_column(&self, column: &str) -> bool {
        self.primary_keys.iter().any(|pk| pk == column)
    }

    pub fn is_indexed(&self, column: &str) -> bool {
        self.indexes.iter().any(|idx| idx.covers(column))
    }

    /// True when a single-column unique index exists on `column`
    pub fn has_unique_index_on(&self, column: &str) -> bool {
        self.indexes
            .iter()
            .any(|idx| idx.unique && idx.columns.len() == 1 && idx.columns[0] == column)
    }

    /// Apply ingestion normalization: empty namespace falls back to
    /// `public`, primary-key flags follow `primary_keys`, and duplicate
    /// foreign keys by `(column, reference)` are dropped.
    pub fn normalize(&mut self) {
        if self.schema.trim().is_empty() {
            self.schema = default_schema();
        }

        let primary_keys = self.primary_keys.clone();
        for column in &mut self.columns {
            column.is_primary_key = primary_keys.iter().any(|pk| pk == &column.name);
        }

        let mut seen = std::collections::HashSet::new();
        self.foreign_keys
            .retain(|fk| seen.insert((fk.column.clone(), fk.references.clone())));
    }
}
