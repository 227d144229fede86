//! Layer model: a named, timestamped snapshot of a full schema

use crate::error::{validation_error, AppError};
use crate::models::{validate_tables, SchemaMetadata, Table};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use validator::Validate;

/// Layer ids double as file names
static LAYER_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,128}$").expect("valid layer id pattern"));

const ID_SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 7;

/// Stored layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Label of the schema this layer was derived from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_schema: Option<String>,
    pub tables: Vec<Table>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Layer {
    /// View the layer's tables as a schema (relationships derived)
    pub fn schema(&self) -> SchemaMetadata {
        SchemaMetadata::new(self.tables.clone(), Vec::new())
    }

    /// SHA-256 over table, column, FK and index definitions, independent
    /// of table order
    pub fn checksum(&self) -> String {
        let mut tables: Vec<&Table> = self.tables.iter().collect();
        tables.sort_by(|a, b| a.name.cmp(&b.name));

        let mut hasher = Sha256::new();
        for table in tables {
            hasher.update(format!("T:{}.{}", table.schema, table.name).as_bytes());
            for col in &table.columns {
                hasher.update(
                    format!(
                        "C:{}:{}:{}:{}",
                        col.name,
                        col.data_type,
                        col.nullable,
                        col.default.as_deref().unwrap_or("")
                    )
                    .as_bytes(),
                );
            }
            hasher.update(format!("PK:{}", table.primary_keys.join(",")).as_bytes());
            for fk in &table.foreign_keys {
                hasher.update(format!("FK:{}->{}", fk.column, fk.references).as_bytes());
            }
            for idx in &table.indexes {
                hasher.update(
                    format!("IX:{}:{}:{}", idx.name, idx.columns.join(","), idx.unique).as_bytes(),
                );
            }
        }

        format!("{:x}", hasher.finalize())
    }
}

/// Save payload. A missing id means "new layer".
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LayerDraft {
    #[serde(default)]
    pub id: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Layer name must be between 1 and 255 characters"))]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub base_schema: Option<String>,

    #[validate(nested)]
    pub tables: Vec<Table>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl LayerDraft {
    pub fn new(name: impl Into<String>, tables: Vec<Table>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            base_schema: None,
            tables,
            created_at: None,
        }
    }

    /// Field and structural validation; also normalizes the tables
    pub fn validated(mut self) -> Result<Self, AppError> {
        // Treat "" as absent, as clients post blank ids for new layers
        self.id = self.id.filter(|id| !id.is_empty());

        if let Some(id) = &self.id {
            if !is_valid_layer_id(id) {
                return Err(validation_error(format!(
                    "Invalid layer id '{}': use letters, digits, '_' or '-'",
                    id
                )));
            }
        }

        self.validate()
            .map_err(|e| validation_error(e.to_string()))?;
        validate_tables(&self.tables)?;

        self.tables = SchemaMetadata::new(self.tables, Vec::new()).into_tables();
        Ok(self)
    }
}

/// Lightweight listing entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerSummary {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub table_count: usize,
    pub fk_count: usize,
    pub index_count: usize,
    pub checksum: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Layer> for LayerSummary {
    fn from(layer: &Layer) -> Self {
        Self {
            id: layer.id.clone(),
            name: layer.name.clone(),
            description: layer.description.clone(),
            table_count: layer.tables.len(),
            fk_count: layer.tables.iter().map(|t| t.foreign_keys.len()).sum(),
            index_count: layer.tables.iter().map(|t| t.indexes.len()).sum(),
            checksum: layer.checksum(),
            created_at: layer.created_at,
            updated_at: layer.updated_at,
        }
    }
}

pub fn is_valid_layer_id(id: &str) -> bool {
    LAYER_ID_PATTERN.is_match(id)
}

/// `layer_<unix millis>_<7 base36 chars>`
pub fn generate_layer_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| ID_SUFFIX_ALPHABET[rng.gen_range(0..ID_SUFFIX_ALPHABET.len())] as char)
        .collect();
    format!("layer_{}_{}", Utc::now().timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Column, ForeignKey};

    fn users() -> Table {
        Table::new("users")
            .column(Column::new("id", "integer").not_null())
            .primary_key(&["id"])
    }

    #[test]
    fn test_generated_ids_are_valid_and_distinct() {
        let a = generate_layer_id();
        let b = generate_layer_id();
        assert!(LAYER_ID_PATTERN.is_match(&a));
        assert!(a.starts_with("layer_"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_draft_rejects_path_like_ids() {
        let mut draft = LayerDraft::new("v1", vec![users()]);
        draft.id = Some("../etc/passwd".to_string());
        assert!(matches!(draft.validated(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_draft_blank_id_means_new() {
        let mut draft = LayerDraft::new("v1", vec![users()]);
        draft.id = Some(String::new());
        assert_eq!(draft.validated().unwrap().id, None);
    }

    #[test]
    fn test_draft_requires_name() {
        let draft = LayerDraft::new("", vec![users()]);
        assert!(draft.validated().is_err());
    }

    #[test]
    fn test_draft_normalizes_tables() {
        let draft = LayerDraft::new("v1", vec![users()]).validated().unwrap();
        assert!(draft.tables[0].columns[0].is_primary_key);
    }

    #[test]
    fn test_checksum_ignores_table_order() {
        let now = Utc::now();
        let orders = Table::new("orders")
            .column(Column::new("user_id", "integer"))
            .foreign_key(ForeignKey::new("user_id", "users.id"));
        let layer = |tables| Layer {
            id: "l".to_string(),
            name: "n".to_string(),
            description: None,
            base_schema: None,
            tables,
            created_at: now,
            updated_at: now,
        };

        let a = layer(vec![users(), orders.clone()]);
        let b = layer(vec![orders, users()]);
        assert_eq!(a.checksum(), b.checksum());

        let c = layer(vec![users()]);
        assert_ne!(a.checksum(), c.checksum());
    }
}
