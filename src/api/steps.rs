/// Step management REST API endpoints
///
/// CRUD over workflow steps plus the dedicated status transition that
/// stamps completion metadata.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, patch},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::Principal;
use crate::error::AppError;
use crate::workflow::{NewStep, StepPatch, StepStatus};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct ListStepsQuery {
    pub workflow_id: String,
}

#[derive(Debug, Deserialize)]
pub struct StepStatusUpdate {
    pub status: StepStatus,
}

/// Create step management routes
pub fn create_step_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/steps", get(list_steps).post(create_step))
        .route(
            "/api/v1/steps/{id}",
            get(get_step)
                .put(update_step)
                .patch(update_step)
                .delete(delete_step),
        )
        .route("/api/v1/steps/{id}/status", patch(update_step_status))
}

/// GET /api/v1/steps?workflow_id=...
async fn list_steps(
    State(state): State<AppState>,
    _principal: Principal,
    Query(query): Query<ListStepsQuery>,
) -> Result<Json<Value>, AppError> {
    let steps = state.workflows.list_steps(&query.workflow_id).await?;

    Ok(Json(json!({
        "success": true,
        "workflow_id": query.workflow_id,
        "steps": steps,
    })))
}

/// POST /api/v1/steps
async fn create_step(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<NewStep>,
) -> Result<Json<Value>, AppError> {
    if payload.workflow_id.is_empty() {
        return Err(AppError::Validation("workflow_id is required".to_string()));
    }

    let step = state
        .workflows
        .create_step(payload, Some(&principal.user_id))
        .await?;

    Ok(Json(json!({ "success": true, "step": step })))
}

/// GET /api/v1/steps/:id
async fn get_step(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let step = state
        .workflows
        .get_step(&id)
        .await?
        .ok_or(AppError::NotFound("Step"))?;

    Ok(Json(json!({ "success": true, "step": step })))
}

/// PUT/PATCH /api/v1/steps/:id
async fn update_step(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    Json(patch): Json<StepPatch>,
) -> Result<Json<Value>, AppError> {
    let step = state
        .workflows
        .update_step(&id, patch, Some(&principal.user_id))
        .await?;

    Ok(Json(json!({ "success": true, "step": step })))
}

/// PATCH /api/v1/steps/:id/status
async fn update_step_status(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    Json(payload): Json<StepStatusUpdate>,
) -> Result<Json<Value>, AppError> {
    let step = state
        .workflows
        .set_step_status(&id, payload.status, Some(&principal.user_id))
        .await?;

    Ok(Json(json!({ "success": true, "step": step })))
}

/// DELETE /api/v1/steps/:id
async fn delete_step(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state
        .workflows
        .delete_step(&id, Some(&principal.user_id))
        .await?;

    Ok(Json(json!({ "success": true, "message": "Step deleted" })))
}
