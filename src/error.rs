/// Error taxonomy for the sopflow backend
///
/// Every fallible operation in the service layer returns `AppError`. The
/// variants map one-to-one onto HTTP statuses at the API boundary, so
/// handlers can bubble errors with `?` and let `IntoResponse` do the rest.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    /// A required field is missing or blank (400)
    #[error("{0}")]
    Validation(String),

    /// The referenced entity does not exist (404)
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The actor is not the resource owner (403)
    #[error("{0}")]
    Forbidden(String),

    /// Missing or unusable bearer credential (401)
    #[error("{0}")]
    Unauthenticated(String),

    /// The backing row store failed (503/502)
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The text-to-workflow generator failed (502)
    #[error("{0}")]
    Generation(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Store(_) => StatusCode::BAD_GATEWAY,
            AppError::Generation(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_taxonomy() {
        assert_eq!(
            AppError::Validation("title is required".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::NotFound("Workflow").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Forbidden("not your comment".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Store(StoreError::Unavailable("connection refused".into())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn not_found_message_names_the_entity() {
        assert_eq!(AppError::NotFound("Workflow").to_string(), "Workflow not found");
    }
}
