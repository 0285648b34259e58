use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use axum::{
    http::HeaderValue,
    middleware::Next,
    response::Response,
};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Log every request with its outcome and stamp a process-local request id.
///
/// A request id sent by the caller is kept and echoed back.
pub async fn request_log(mut req: axum::http::Request<axum::body::Body>, next: Next) -> Response {
    let request_id = match req.headers().get(REQUEST_ID_HEADER) {
        Some(id) => id.clone(),
        None => {
            let id = HeaderValue::from(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed));
            req.headers_mut().insert(REQUEST_ID_HEADER, id.clone());
            id
        }
    };
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let mut response = next.run(req).await;

    let status = response.status().as_u16();
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let id = request_id.to_str().unwrap_or("-");
    if response.status().is_server_error() {
        tracing::warn!(request_id = id, %method, path = %path, status, elapsed_ms, "request failed");
    } else {
        tracing::info!(request_id = id, %method, path = %path, status, elapsed_ms, "request served");
    }

    response.headers_mut().insert(REQUEST_ID_HEADER, request_id);
    response
}
