use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use parley_persist::PersistError;
use parley_pipeline::PipelineError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::ThreadNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Persist(e) => persist_status(e),
            ApiError::Pipeline(PipelineError::SessionBusy { .. }) => (StatusCode::CONFLICT, self.to_string()),
            ApiError::Pipeline(PipelineError::QueueFull { .. }) => {
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
            ApiError::Pipeline(PipelineError::Persist(e)) => persist_status(e),
            ApiError::Pipeline(PipelineError::Generation(msg)) => {
                tracing::error!("Generation error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Processing error".to_string())
            }
        }
    }
}

fn persist_status(e: &PersistError) -> (StatusCode, String) {
    match e {
        PersistError::ThreadNotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
        PersistError::Validation(_) | PersistError::InvalidObjectId(_) => (StatusCode::BAD_REQUEST, e.to_string()),
        PersistError::Unavailable(_) | PersistError::Connection(_) => {
            tracing::error!("Store unavailable: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "Storage unavailable".to_string())
        }
        _ => {
            tracing::error!("Persistence error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_of(ApiError::ThreadNotFound("t".into())), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(PersistError::ThreadNotFound("t".into()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(PersistError::Validation("blank".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(PipelineError::SessionBusy { thread_id: "t".into() }.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(PipelineError::QueueFull { capacity: 4 }.into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(PipelineError::Persist(PersistError::ThreadNotFound("t".into())).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(PersistError::Internal("boom".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
