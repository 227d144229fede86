//! Application state management
//!
//! Contains shared state accessible across all handlers.

use crate::config::Settings;
use crate::error::AppError;
use crate::introspection::load_export_file;
use crate::layer::LayerStore;
use crate::models::SchemaMetadata;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Settings,

    /// File-backed layer store (has internal locking)
    pub layers: LayerStore,
}

impl AppState {
    pub fn new(settings: Settings, layers: LayerStore) -> Self {
        Self { settings, layers }
    }

    /// Load the configured schema export. Re-read on every call so edits to
    /// the file show up without a restart.
    pub async fn current_schema(&self) -> Result<SchemaMetadata, AppError> {
        let path = self.settings.import.schema_export_path.as_ref().ok_or_else(|| {
            AppError::NotFound("No schema export configured (set SCHEMA_EXPORT_PATH)".to_string())
        })?;

        load_export_file(path).await
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
