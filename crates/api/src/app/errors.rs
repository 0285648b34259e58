use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use rentpoint_infra::{ErrorKind, WorkflowError};

pub fn workflow_error_to_response(err: WorkflowError) -> axum::response::Response {
    let status = match err.kind() {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::InvalidTransition => StatusCode::CONFLICT,
        ErrorKind::Infrastructure => {
            tracing::error!(error = %err, "workflow infrastructure failure");
            StatusCode::SERVICE_UNAVAILABLE
        }
    };
    json_error(status, err.code(), err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
