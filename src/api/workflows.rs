/// Workflow management REST API endpoints
///
/// CRUD over workflows. Listing and single-workflow reads come back
/// annotated with the steps array and step count; the organization filter
/// on listings is lenient and never rejects a malformed value.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::Principal;
use crate::error::AppError;
use crate::workflow::{NewWorkflow, WorkflowPatch};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct ListWorkflowsQuery {
    #[serde(default)]
    pub org_id: Option<String>,
}

/// Create workflow management routes
pub fn create_workflow_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/workflows",
            get(list_workflows).post(create_workflow),
        )
        .route(
            "/api/v1/workflows/{id}",
            get(get_workflow)
                .put(update_workflow)
                .patch(update_workflow)
                .delete(delete_workflow),
        )
}

/// GET /api/v1/workflows
async fn list_workflows(
    State(state): State<AppState>,
    _principal: Principal,
    Query(query): Query<ListWorkflowsQuery>,
) -> Result<Json<Value>, AppError> {
    let workflows = state.workflows.list(query.org_id.as_deref()).await?;

    Ok(Json(json!({
        "success": true,
        "organization_id": query.org_id,
        "workflows": workflows,
    })))
}

/// GET /api/v1/workflows/:id
async fn get_workflow(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let workflow = state
        .workflows
        .get(&id)
        .await?
        .ok_or(AppError::NotFound("Workflow"))?;

    Ok(Json(json!({ "success": true, "workflow": workflow })))
}

/// POST /api/v1/workflows
async fn create_workflow(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<NewWorkflow>,
) -> Result<Json<Value>, AppError> {
    let created = state
        .workflows
        .create(payload, Some(&principal.user_id))
        .await?;

    Ok(Json(json!({
        "success": true,
        "workflow_id": created.id.clone(),
        "data": created,
    })))
}

/// PUT/PATCH /api/v1/workflows/:id
async fn update_workflow(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    Json(patch): Json<WorkflowPatch>,
) -> Result<Json<Value>, AppError> {
    let updated = state
        .workflows
        .update(&id, patch, Some(&principal.user_id))
        .await?;

    Ok(Json(json!({ "success": true, "workflow": updated })))
}

/// DELETE /api/v1/workflows/:id
async fn delete_workflow(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state
        .workflows
        .delete(&id, Some(&principal.user_id))
        .await?;

    Ok(Json(json!({ "success": true, "message": "Workflow deleted" })))
}
