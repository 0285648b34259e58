use axum::extract::Path;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rentpoint_core::OrderId;
use rentpoint_rental::{CancelReason, CreateOrder, Order, OrderStatus};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub client_id: i64,
    pub item_id: i64,
    pub pickup_point_id: i64,
    pub rental_duration_hours: i64,
}

impl From<CreateOrderRequest> for CreateOrder {
    fn from(r: CreateOrderRequest) -> Self {
        CreateOrder::new(r.client_id, r.item_id, r.pickup_point_id, r.rental_duration_hours)
    }
}

#[derive(Debug, Deserialize)]
pub struct CancelOrderRequest {
    pub reason: CancelReason,
    #[serde(default)]
    pub details: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdvanceOrderRequest {
    pub status: OrderStatus,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: u64,
    pub client_id: u64,
    pub item_id: u64,
    pub pickup_point_id: u64,
    pub rental_duration_hours: u32,
    pub status: OrderStatus,
    pub cancel_reason: Option<CancelReason>,
    pub cancel_details: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        Self {
            id: o.id.get(),
            client_id: o.client_id.get(),
            item_id: o.item_id.get(),
            pickup_point_id: o.pickup_point_id.get(),
            rental_duration_hours: o.rental_duration_hours,
            status: o.status,
            cancel_reason: o.cancel_reason,
            cancel_details: o.cancel_details,
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

// -------------------------
// Helpers
// -------------------------

/// Unwrap a JSON body, answering malformed input with the standard error shape.
pub fn json_body<T>(body: Result<axum::Json<T>, JsonRejection>) -> Result<T, axum::response::Response> {
    body.map(|axum::Json(v)| v)
        .map_err(|e| errors::json_error(StatusCode::BAD_REQUEST, "invalid_body", e.body_text()))
}

/// Extract an order id from the path; non-numeric and zero ids get the
/// standard error shape.
pub fn path_order_id(path: Result<Path<u64>, PathRejection>) -> Result<OrderId, axum::response::Response> {
    let Path(raw) = path.map_err(|e| errors::json_error(StatusCode::BAD_REQUEST, "invalid_path", e.body_text()))?;
    OrderId::new(raw).map_err(|e| errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()))
}
