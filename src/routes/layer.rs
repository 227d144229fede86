//! Layer, Diff and Export API Routes

use crate::error::{not_found_error, ApiResult};
use crate::introspection::parse_export;
use crate::layer::{DiffSummary, Layer, LayerDraft, LayerSummary, MigrationGenerator, SchemaDiff};
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

const IMPORTED_LAYER_NAME: &str = "Imported Schema";
const IMPORTED_LAYER_DESCRIPTION: &str = "Schema imported from JSON";

// ==================== Request/Response Types ====================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerResponse {
    pub success: bool,
    pub layer: Layer,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerListResponse {
    pub success: bool,
    pub layers: Vec<Layer>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerSummaryResponse {
    pub success: bool,
    pub layers: Vec<LayerSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffRequest {
    pub base_layer_id: String,
    pub draft_layer_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResponse {
    pub success: bool,
    pub diff: SchemaDiff,
    pub summary: DiffSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSqlResponse {
    pub success: bool,
    pub sql: String,
    pub statements: Vec<String>,
}

// ==================== Handlers ====================

/// Create or overwrite a layer
pub async fn save_layer(
    State(state): State<SharedState>,
    Json(draft): Json<LayerDraft>,
) -> ApiResult<Json<LayerResponse>> {
    let layer = state.layers.save(draft).await?;

    Ok(Json(LayerResponse {
        success: true,
        layer,
    }))
}

pub async fn list_layers(State(state): State<SharedState>) -> Json<LayerListResponse> {
    Json(LayerListResponse {
        success: true,
        layers: state.layers.list().await,
    })
}

pub async fn list_summaries(State(state): State<SharedState>) -> Json<LayerSummaryResponse> {
    Json(LayerSummaryResponse {
        success: true,
        layers: state.layers.summaries().await,
    })
}

pub async fn get_layer(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<LayerResponse>> {
    let layer = state
        .layers
        .get(&id)
        .await
        .ok_or_else(|| not_found_error(format!("Layer '{}' not found", id)))?;

    Ok(Json(LayerResponse {
        success: true,
        layer,
    }))
}

pub async fn delete_layer(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    if !state.layers.delete(&id).await? {
        return Err(not_found_error(format!("Layer '{}' not found", id)));
    }

    Ok(Json(DeleteResponse {
        success: true,
        message: format!("Layer '{}' deleted", id),
    }))
}

/// Compare two stored layers
pub async fn diff_layers(
    State(state): State<SharedState>,
    Json(req): Json<DiffRequest>,
) -> ApiResult<Json<DiffResponse>> {
    let diff = state
        .layers
        .compare(&req.base_layer_id, &req.draft_layer_id)
        .await?;
    let summary = diff.summary();

    tracing::info!(
        "Diff {} -> {}: {} changes",
        req.base_layer_id,
        req.draft_layer_id,
        summary.total_changes
    );

    Ok(Json(DiffResponse {
        success: true,
        diff,
        summary,
    }))
}

/// Render a diff as migration SQL
pub async fn export_sql(Json(diff): Json<SchemaDiff>) -> Json<ExportSqlResponse> {
    let statements = MigrationGenerator::statements(&diff);

    Json(ExportSqlResponse {
        success: true,
        sql: statements.join("\n\n"),
        statements,
    })
}

/// Import a schema export and store it as a new layer
pub async fn import_json(
    State(state): State<SharedState>,
    Json(value): Json<serde_json::Value>,
) -> ApiResult<Json<LayerResponse>> {
    let schema = parse_export(value)?;

    let mut draft = LayerDraft::new(IMPORTED_LAYER_NAME, schema.into_tables());
    draft.description = Some(IMPORTED_LAYER_DESCRIPTION.to_string());

    let layer = state.layers.save(draft).await?;

    Ok(Json(LayerResponse {
        success: true,
        layer,
    }))
}
