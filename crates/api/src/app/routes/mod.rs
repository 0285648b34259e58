use axum::{routing::post, Router};

pub mod orders;
pub mod system;

/// Router for the order workflow endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/api/orders", post(orders::create_order))
        .route("/api/orders/:id/cancel", post(orders::cancel_order))
        .route("/api/orders/:id/advance", post(orders::advance_order))
}
