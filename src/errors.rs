use std::any::Any;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

const GENERIC_ERROR: &str = "An internal error occurred.";

#[derive(Debug, thiserror::Error)]
pub enum ClassificationError {
    #[error("model call failed: {0:#}")]
    Provider(anyhow::Error),

    #[error("model call timed out after {0}s")]
    Timeout(u64),

    #[error("model returned an unrecognized intent label: {0:?}")]
    InvalidLabel(String),
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("model call failed: {0:#}")]
    Provider(anyhow::Error),

    #[error("model call timed out after {0}s")]
    Timeout(u64),

    #[error("model returned an empty reply")]
    EmptyReply,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("intent classification failed: {0}")]
    Classification(#[from] ClassificationError),

    #[error("response generation failed: {0}")]
    Generation(#[from] GenerationError),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("'{0}' is a required field")]
    Validation(&'static str),

    #[error("Invalid JSON format")]
    InvalidJson,

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) | AppError::InvalidJson => "validation_error",
            AppError::Pipeline(PipelineError::Classification(_)) => "classification_error",
            AppError::Pipeline(PipelineError::Generation(_)) => "generation_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidJson => StatusCode::BAD_REQUEST,
            AppError::Pipeline(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();

        // Caller errors are echoed back; everything else stays in the logs.
        let message = if status.is_client_error() {
            tracing::warn!(kind, error = %self, "rejected webhook request");
            self.to_string()
        } else {
            tracing::error!(kind, error = %self, "webhook request failed");
            GENERIC_ERROR.to_string()
        };

        let body = serde_json::json!({ "error": message, "kind": kind });
        (status, axum::Json(body)).into_response()
    }
}

/// Turns a panic caught at the router boundary into the generic 500.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    AppError::Internal(format!("panic while handling request: {detail}")).into_response()
}
