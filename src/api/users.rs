/// User profile REST API endpoints
///
/// Profiles are created implicitly on first write: `PUT /users/me` upserts
/// the row for the authenticated principal, merging the token's email into
/// the patch.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};

use crate::auth::Principal;
use crate::error::AppError;
use crate::org::UserProfilePatch;

use super::AppState;

/// Create user profile routes
pub fn create_user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/users/me", get(get_me).put(update_me))
        .route("/api/v1/users/{user_id}", get(get_user))
}

/// GET /api/v1/users/me
async fn get_me(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Value>, AppError> {
    match state.users.get(&principal.user_id).await? {
        Some(user) => Ok(Json(json!({
            "success": true,
            "user_id": principal.user_id,
            "email": principal.email,
            "name": user.name,
            "avatar_url": user.avatar_url,
            "phone": user.phone,
            "created_at": user.created_at,
            "updated_at": user.updated_at,
        }))),
        None => Ok(Json(json!({
            "success": true,
            "user_id": principal.user_id,
            "email": principal.email,
        }))),
    }
}

/// PUT /api/v1/users/me
async fn update_me(
    State(state): State<AppState>,
    principal: Principal,
    Json(mut patch): Json<UserProfilePatch>,
) -> Result<Json<Value>, AppError> {
    // The token's email wins over whatever the client sent
    if principal.email.is_some() {
        patch.email = principal.email.clone();
    }

    let user = state.users.upsert(&principal.user_id, patch).await?;

    Ok(Json(json!({
        "success": true,
        "user_id": principal.user_id,
        "email": user.email,
        "name": user.name,
        "avatar_url": user.avatar_url,
        "phone": user.phone,
        "updated_at": user.updated_at,
    })))
}

/// GET /api/v1/users/:user_id
async fn get_user(
    State(state): State<AppState>,
    _principal: Principal,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let user = state
        .users
        .get(&user_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    Ok(Json(json!({
        "success": true,
        "user_id": user.id,
        "name": user.name,
        "avatar_url": user.avatar_url,
    })))
}
