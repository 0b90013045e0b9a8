use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::practicum::SelectionServiceError;

/// Top-level error returned by binaries built on the engine.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("data error: {0}")]
    Data(#[from] serde_json::Error),
    #[error("selection workflow error: {0}")]
    Selection(#[from] SelectionServiceError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Data(_) => StatusCode::BAD_REQUEST,
            AppError::Selection(SelectionServiceError::OpeningNotOpen { .. }) => {
                StatusCode::CONFLICT
            }
            AppError::Selection(
                SelectionServiceError::StudentNotFound(_)
                | SelectionServiceError::OpeningNotFound(_)
                | SelectionServiceError::EnrollmentNotFound(_),
            ) => StatusCode::NOT_FOUND,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Selection(SelectionServiceError::Repository(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
