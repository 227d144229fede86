//! Schema model
//!
//! Canonical in-memory representation of a relational schema: tables with
//! their columns, foreign keys and indexes, plus the relationships derived
//! from those foreign keys.

pub mod foreign_key;
pub mod relationship;
pub mod table;

// Re-export commonly used types
pub use foreign_key::*;
pub use relationship::*;
pub use table::*;

use crate::error::{validation_error, AppError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use validator::Validate;

/// Schema as it arrives over the wire or from an export file.
/// Any `relationships` field is ignored; they are always re-derived.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDocument {
    #[validate(nested)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub schemas: Vec<String>,
}

/// Validated schema snapshot. `relationships` is a pure function of
/// `tables`; the only way to change tables is to build a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SchemaDocument")]
pub struct SchemaMetadata {
    tables: Vec<Table>,
    relationships: Vec<Relationship>,
    schemas: Vec<String>,
}

impl SchemaMetadata {
    /// Build from already-validated tables
    pub fn new(mut tables: Vec<Table>, schemas: Vec<String>) -> Self {
        for table in &mut tables {
            table.normalize();
        }

        let mut seen = HashSet::new();
        let mut namespaces: Vec<String> = schemas
            .into_iter()
            .chain(tables.iter().map(|t| t.schema.clone()))
            .filter(|s| seen.insert(s.clone()))
            .collect();
        if namespaces.is_empty() {
            namespaces.push(DEFAULT_SCHEMA.to_string());
        }

        let relationships = derive_relationships(&tables);

        Self {
            tables,
            relationships,
            schemas: namespaces,
        }
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn schemas(&self) -> &[String] {
        &self.schemas
    }

    pub fn into_tables(self) -> Vec<Table> {
        self.tables
    }

    /// Names of tables inferred to be many-to-many junctions
    pub fn junction_tables(&self) -> Vec<&str> {
        self.tables
            .iter()
            .filter(|t| is_junction_table(t))
            .map(|t| t.name.as_str())
            .collect()
    }

    pub fn overview(&self) -> RelationshipOverview {
        let one_to_one = self
            .relationships
            .iter()
            .filter(|r| r.kind == RelationshipKind::OneToOne)
            .count();
        let junction_tables: Vec<String> =
            self.junction_tables().into_iter().map(String::from).collect();

        RelationshipOverview {
            one_to_one,
            one_to_many: self.relationships.len() - one_to_one,
            many_to_many: junction_tables.len(),
            relationships: self.relationships.clone(),
            junction_tables,
        }
    }
}

impl TryFrom<SchemaDocument> for SchemaMetadata {
    type Error = AppError;

    fn try_from(doc: SchemaDocument) -> Result<Self, Self::Error> {
        validate_tables(&doc.tables)?;
        Ok(Self::new(doc.tables, doc.schemas))
    }
}

/// Relationship breakdown for the schema explorer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipOverview {
    pub relationships: Vec<Relationship>,
    pub junction_tables: Vec<String>,
    pub one_to_one: usize,
    pub one_to_many: usize,
    pub many_to_many: usize,
}

/// Structural validation of a table set: field-level rules plus name
/// uniqueness for tables, and for columns and indexes within each table.
pub fn validate_tables(tables: &[Table]) -> Result<(), AppError> {
    let mut table_names = HashSet::new();

    for (position, table) in tables.iter().enumerate() {
        table
            .validate()
            .map_err(|e| validation_error(format!("tables[{}] ({}): {}", position, table.name, e)))?;

        if !table_names.insert(table.name.as_str()) {
            return Err(validation_error(format!(
                "Duplicate table name '{}'",
                table.name
            )));
        }

        let mut column_names = HashSet::new();
        for column in &table.columns {
            if !column_names.insert(column.name.as_str()) {
                return Err(validation_error(format!(
                    "Duplicate column '{}' in table '{}'",
                    column.name, table.name
                )));
            }
        }

        let mut index_names = HashSet::new();
        for index in &table.indexes {
            if !index_names.insert(index.name.as_str()) {
                return Err(validation_error(format!(
                    "Duplicate index '{}' in table '{}'",
                    index.name, table.name
                )));
            }
        }
    }

    Ok(())
}
