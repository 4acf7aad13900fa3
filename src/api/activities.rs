/// Activity log REST API endpoints
///
/// Read-only view over the append-only ledger.

use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::Principal;
use crate::error::AppError;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct ListActivitiesQuery {
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub workflow_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Create activity log routes
pub fn create_activity_routes() -> Router<AppState> {
    Router::new().route("/api/v1/activity-logs", get(list_activity_logs))
}

/// GET /api/v1/activity-logs
async fn list_activity_logs(
    State(state): State<AppState>,
    _principal: Principal,
    Query(query): Query<ListActivitiesQuery>,
) -> Result<Json<Value>, AppError> {
    let activities = state
        .activity
        .list(
            query.org_id.as_deref(),
            query.workflow_id.as_deref(),
            query.user_id.as_deref(),
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "organization_id": query.org_id,
        "workflow_id": query.workflow_id,
        "user_id": query.user_id,
        "activities": activities,
    })))
}
