use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Extension, Path,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use rentpoint_rental::CreateOrder;

use crate::app::dto::{self, AdvanceOrderRequest, CancelOrderRequest, CreateOrderRequest, OrderResponse};
use crate::app::errors;
use crate::app::services::AppServices;

/// Place an order: reserve the item and move the order to `AWAITING_PAYMENT`.
pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> axum::response::Response {
    let request: CreateOrder = match dto::json_body(body) {
        Ok(b) => b.into(),
        Err(resp) => return resp,
    };

    match services.orders.place_order(&request) {
        Ok(order) => (StatusCode::CREATED, Json(OrderResponse::from(order))).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn cancel_order(
    Extension(services): Extension<Arc<AppServices>>,
    id: Result<Path<u64>, PathRejection>,
    body: Result<Json<CancelOrderRequest>, JsonRejection>,
) -> axum::response::Response {
    let order_id = match dto::path_order_id(id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let body = match dto::json_body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    match services.orders.cancel_order(order_id, body.reason, body.details) {
        Ok(order) => Json(OrderResponse::from(order)).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

/// Status change reported by an external collaborator (payment, hand-off, return).
pub async fn advance_order(
    Extension(services): Extension<Arc<AppServices>>,
    id: Result<Path<u64>, PathRejection>,
    body: Result<Json<AdvanceOrderRequest>, JsonRejection>,
) -> axum::response::Response {
    let order_id = match dto::path_order_id(id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let body = match dto::json_body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    match services.orders.advance_order(order_id, body.status) {
        Ok(order) => Json(OrderResponse::from(order)).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}
