/// Comment REST API endpoints
///
/// Comments list newest first with AND-combined workflow/step filters.
/// Updates and deletes are author-only; the ownership check lives in the
/// service.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, put},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::Principal;
use crate::comment::{CommentPatch, NewComment};
use crate::error::AppError;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct ListCommentsQuery {
    #[serde(default)]
    pub workflow_id: Option<String>,
    #[serde(default)]
    pub step_id: Option<String>,
}

/// Create comment routes
pub fn create_comment_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/comments", get(list_comments).post(create_comment))
        .route(
            "/api/v1/comments/step/{step_id}",
            get(list_comments_for_step),
        )
        .route(
            "/api/v1/comments/{id}",
            put(update_comment).delete(delete_comment),
        )
}

/// GET /api/v1/comments?workflow_id=...&step_id=...
async fn list_comments(
    State(state): State<AppState>,
    _principal: Principal,
    Query(query): Query<ListCommentsQuery>,
) -> Result<Json<Value>, AppError> {
    let comments = state
        .comments
        .list(query.workflow_id.as_deref(), query.step_id.as_deref())
        .await?;

    Ok(Json(json!({
        "success": true,
        "workflow_id": query.workflow_id,
        "step_id": query.step_id,
        "comments": comments,
    })))
}

/// GET /api/v1/comments/step/:step_id
async fn list_comments_for_step(
    State(state): State<AppState>,
    _principal: Principal,
    Path(step_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let comments = state.comments.list(None, Some(&step_id)).await?;

    Ok(Json(json!({
        "success": true,
        "step_id": step_id,
        "comments": comments,
    })))
}

/// POST /api/v1/comments
async fn create_comment(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<NewComment>,
) -> Result<Json<Value>, AppError> {
    let created = state
        .comments
        .create(payload, Some(&principal.user_id))
        .await?;

    Ok(Json(json!({
        "success": true,
        "comment_id": created.id.clone(),
        "data": created,
    })))
}

/// PUT /api/v1/comments/:id
async fn update_comment(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    Json(patch): Json<CommentPatch>,
) -> Result<Json<Value>, AppError> {
    let updated = state
        .comments
        .update(&id, patch, &principal.user_id)
        .await?;

    Ok(Json(json!({ "success": true, "comment": updated })))
}

/// DELETE /api/v1/comments/:id
async fn delete_comment(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state.comments.delete(&id, &principal.user_id).await?;

    Ok(Json(json!({ "success": true, "message": "Comment deleted" })))
}
