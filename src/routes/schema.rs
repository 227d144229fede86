//! Schema API Routes
//!
//! Serve the configured schema export and normalize posted schemas.

use crate::error::ApiResult;
use crate::models::{RelationshipOverview, SchemaDocument, SchemaMetadata};
use crate::state::SharedState;
use axum::{extract::State, Json};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaResponse {
    pub success: bool,
    pub schema: SchemaMetadata,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipsResponse {
    pub success: bool,
    #[serde(flatten)]
    pub overview: RelationshipOverview,
}

/// Schema from the configured export file
pub async fn get_schema(
    State(state): State<SharedState>,
) -> ApiResult<Json<SchemaResponse>> {
    let schema = state.current_schema().await?;

    Ok(Json(SchemaResponse {
        success: true,
        schema,
    }))
}

/// Validate and normalize a client-supplied schema, returning it with
/// relationships derived
pub async fn normalize_schema(
    Json(doc): Json<SchemaDocument>,
) -> ApiResult<Json<SchemaResponse>> {
    let schema = SchemaMetadata::try_from(doc)?;

    Ok(Json(SchemaResponse {
        success: true,
        schema,
    }))
}

/// Relationship cardinalities and junction tables of the configured export
pub async fn get_relationships(
    State(state): State<SharedState>,
) -> ApiResult<Json<RelationshipsResponse>> {
    let schema = state.current_schema().await?;

    Ok(Json(RelationshipsResponse {
        success: true,
        overview: schema.overview(),
    }))
}
