//! Schema export loading
//!
//! Schemas arrive from outside as serialized exports: either a full schema
//! document or the flat `information_schema`-style rows a column/FK join
//! query produces. Both end up as a validated [`SchemaMetadata`].

use crate::error::{validation_error, AppError};
use crate::models::{validate_tables, Column, ForeignKey, SchemaDocument, SchemaMetadata, Table};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// One row of a flat export: a column, optionally joined with the foreign
/// key it participates in
#[derive(Debug, Clone, Deserialize)]
pub struct ExportRow {
    pub table_name: String,
    #[serde(default)]
    pub table_schema: Option<String>,
    pub column_name: String,
    pub data_type: String,
    #[serde(default)]
    pub is_nullable: Option<String>,
    #[serde(default)]
    pub column_default: Option<String>,
    #[serde(default)]
    pub foreign_table: Option<String>,
    #[serde(default)]
    pub foreign_column: Option<String>,
}

/// Group flat rows into tables, first-seen order
pub fn import_rows(rows: Vec<ExportRow>) -> Result<SchemaMetadata, AppError> {
    let mut tables: Vec<Table> = Vec::new();

    for row in rows {
        let pos = match tables.iter().position(|t| t.name == row.table_name) {
            Some(pos) => pos,
            None => {
                let mut table = Table::new(row.table_name.clone());
                if let Some(schema) = row.table_schema.as_deref().filter(|s| !s.is_empty()) {
                    table.schema = schema.to_string();
                }
                tables.push(table);
                tables.len() - 1
            }
        };
        let table = &mut tables[pos];

        // A column with several FKs shows up once per FK
        if table.find_column(&row.column_name).is_none() {
            let mut column = Column::new(row.column_name.clone(), row.data_type);
            column.nullable = row.is_nullable.as_deref() == Some("YES");
            column.default = row.column_default;
            table.columns.push(column);
        }

        if let (Some(foreign_table), Some(foreign_column)) = (
            row.foreign_table.filter(|s| !s.is_empty()),
            row.foreign_column.filter(|s| !s.is_empty()),
        ) {
            table.foreign_keys.push(ForeignKey::new(
                row.column_name,
                format!("{}.{}", foreign_table, foreign_column),
            ));
        }
    }

    validate_tables(&tables)?;
    Ok(SchemaMetadata::new(tables, Vec::new()))
}

/// Accept either export shape
pub fn parse_export(value: Value) -> Result<SchemaMetadata, AppError> {
    match value {
        Value::Array(items) => {
            let rows = items
                .into_iter()
                .enumerate()
                .map(|(i, item)| {
                    serde_json::from_value::<ExportRow>(item)
                        .map_err(|e| validation_error(format!("Invalid export row {}: {}", i, e)))
                })
                .collect::<Result<Vec<_>, _>>()?;
            import_rows(rows)
        }
        Value::Object(_) => {
            let doc: SchemaDocument = serde_json::from_value(value)
                .map_err(|e| validation_error(format!("Invalid schema document: {}", e)))?;
            SchemaMetadata::try_from(doc)
        }
        _ => Err(validation_error(
            "Schema export must be a schema document or an array of column rows",
        )),
    }
}

/// Read and parse an export file
pub async fn load_export_file(path: &Path) -> Result<SchemaMetadata, AppError> {
    let bytes = tokio::fs::read(path).await?;
    let value: Value = serde_json::from_slice(&bytes)?;
    let schema = parse_export(value)?;

    debug!(
        "Loaded schema export {}: {} tables, {} relationships",
        path.display(),
        schema.tables().len(),
        schema.relationships().len()
    );

    Ok(schema)
}
