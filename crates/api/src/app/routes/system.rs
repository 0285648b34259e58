use axum::{http::StatusCode, response::IntoResponse, Json};

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Rental Service API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}
