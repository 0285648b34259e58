//! Messages published on the downstream event channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use rentpoint_core::{ClientId, ItemId, OrderId, PickupPointId};
use rentpoint_rental::{Order, OrderStatus};

/// Published once per order that reaches `AWAITING_PAYMENT`.
///
/// Consumed by the documents and payment services. `event_id` lets consumers
/// deduplicate (delivery is at-least-once).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalOrderMessage {
    pub event_id: Uuid,
    pub order_id: OrderId,
    pub client_id: ClientId,
    pub item_id: ItemId,
    pub pickup_point_id: PickupPointId,
    pub rental_duration_hours: u32,
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
}

impl RentalOrderMessage {
    pub const EVENT_TYPE: &'static str = "rental.order.awaiting_payment";

    pub fn from_order(order: &Order, timestamp: DateTime<Utc>) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            order_id: order.id,
            client_id: order.client_id,
            item_id: order.item_id,
            pickup_point_id: order.pickup_point_id,
            rental_duration_hours: order.rental_duration_hours,
            status: order.status,
            timestamp,
        }
    }
}
