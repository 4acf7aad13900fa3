/// AI conversion REST API endpoints
///
/// Text goes in, a structured workflow comes out. `convert` only runs the
/// generator; `convert-and-save` additionally persists the result through
/// the normal mutation paths so the audit trail stays complete.

use axum::{extract::State, response::Json, routing::post, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::Principal;
use crate::error::AppError;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct ConvertRequest {
    pub raw_text: String,
}

#[derive(Debug, Deserialize)]
pub struct ConvertAndSaveRequest {
    pub raw_text: String,
    #[serde(default, alias = "org_id")]
    pub organization_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RewriteRequest {
    pub step_text: String,
    #[serde(default)]
    pub tone: Option<String>,
}

/// Create AI conversion routes
pub fn create_ai_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/ai/convert", post(convert_text))
        .route("/api/v1/ai/convert-and-save", post(convert_and_save))
        .route("/api/v1/ai/rewrite", post(rewrite_step))
}

/// POST /api/v1/ai/convert
async fn convert_text(
    State(state): State<AppState>,
    _principal: Principal,
    Json(payload): Json<ConvertRequest>,
) -> Result<Json<Value>, AppError> {
    let workflow = state.generator.generate(&payload.raw_text).await?;

    Ok(Json(json!({ "success": true, "workflow": workflow })))
}

/// POST /api/v1/ai/convert-and-save
async fn convert_and_save(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<ConvertAndSaveRequest>,
) -> Result<Json<Value>, AppError> {
    let generated = state.generator.generate(&payload.raw_text).await?;

    let workflow = state
        .workflows
        .import_generated(
            generated,
            payload.organization_id.as_deref(),
            Some(&principal.user_id),
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "workflow_id": workflow.id.clone(),
        "steps_created": workflow.step_count,
        "workflow": workflow,
    })))
}

/// POST /api/v1/ai/rewrite
async fn rewrite_step(
    State(state): State<AppState>,
    _principal: Principal,
    Json(payload): Json<RewriteRequest>,
) -> Result<Json<Value>, AppError> {
    let rewritten = state
        .generator
        .rewrite(&payload.step_text, payload.tone.as_deref().unwrap_or(""))
        .await?;

    Ok(Json(json!({
        "success": true,
        "original_text": payload.step_text,
        "rewritten_text": rewritten,
    })))
}
