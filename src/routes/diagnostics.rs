//! Diagnostics API Routes

use crate::diagnostics::{DiagnosticResult, SchemaAnalyzer};
use crate::error::{not_found_error, ApiResult};
use crate::models::{SchemaDocument, SchemaMetadata};
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsResponse {
    pub success: bool,
    pub diagnostics: DiagnosticResult,
}

fn respond(schema: &SchemaMetadata) -> Json<DiagnosticsResponse> {
    let diagnostics = SchemaAnalyzer::new(schema).analyze();

    tracing::info!(
        "Analyzed {} tables: {} issues, average health {}",
        diagnostics.summary.total_tables,
        diagnostics.summary.total_issues,
        diagnostics.summary.average_health
    );

    Json(DiagnosticsResponse {
        success: true,
        diagnostics,
    })
}

/// Diagnose the configured export
pub async fn analyze_current(
    State(state): State<SharedState>,
) -> ApiResult<Json<DiagnosticsResponse>> {
    let schema = state.current_schema().await?;
    Ok(respond(&schema))
}

/// Diagnose a posted schema
pub async fn analyze_schema(
    Json(doc): Json<SchemaDocument>,
) -> ApiResult<Json<DiagnosticsResponse>> {
    let schema = SchemaMetadata::try_from(doc)?;
    Ok(respond(&schema))
}

/// Diagnose a stored layer
pub async fn analyze_layer(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DiagnosticsResponse>> {
    let layer = state
        .layers
        .get(&id)
        .await
        .ok_or_else(|| not_found_error(format!("Layer '{}' not found", id)))?;

    Ok(respond(&layer.schema()))
}
