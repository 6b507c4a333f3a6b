use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use marquee_store::StoreError;
use marquee_tmdb::TmdbError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Metadata provider error: {0}")]
    Provider(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ServerError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            ServerError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            ServerError::Provider(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
            ServerError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = serde_json::json!({
            "success": false,
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ServerError::NotFound("Record not found".to_string()),
            StoreError::ParentSubjectMismatch => ServerError::BadRequest(e.to_string()),
            StoreError::HasReplies | StoreError::NotLiked => ServerError::Conflict(e.to_string()),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<TmdbError> for ServerError {
    fn from(e: TmdbError) -> Self {
        match e {
            TmdbError::NotFound => ServerError::NotFound("Record not found on provider".to_string()),
            other => ServerError::Provider(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_taxonomy() {
        assert!(matches!(
            ServerError::from(StoreError::NotFound),
            ServerError::NotFound(_)
        ));
        assert!(matches!(
            ServerError::from(StoreError::HasReplies),
            ServerError::Conflict(_)
        ));
        assert!(matches!(
            ServerError::from(StoreError::NotLiked),
            ServerError::Conflict(_)
        ));
        assert!(matches!(
            ServerError::from(StoreError::ParentSubjectMismatch),
            ServerError::BadRequest(_)
        ));
    }

    #[test]
    fn provider_errors_map_to_taxonomy() {
        assert!(matches!(
            ServerError::from(TmdbError::NotFound),
            ServerError::NotFound(_)
        ));
        assert!(matches!(
            ServerError::from(TmdbError::Status(500)),
            ServerError::Provider(_)
        ));
    }
}
