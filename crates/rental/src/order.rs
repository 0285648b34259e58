use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rentpoint_core::{ClientId, DomainError, DomainResult, Entity, ItemId, OrderId, PickupPointId};

/// Shortest rental window, in hours.
pub const MIN_RENTAL_HOURS: u32 = 1;
/// Longest rental window, in hours (30 days).
pub const MAX_RENTAL_HOURS: u32 = 720;

/// Rental order status lifecycle.
///
/// ```text
/// NEW -> AWAITING_PAYMENT -> AWAITING_RECEIPT -> AWAITING_RETURN -> RETURNED
///   \________________________________________________________/
///                  any non-terminal -> CANCELLED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    AwaitingPayment,
    AwaitingReceipt,
    AwaitingReturn,
    Returned,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::New,
        OrderStatus::AwaitingPayment,
        OrderStatus::AwaitingReceipt,
        OrderStatus::AwaitingReturn,
        OrderStatus::Returned,
        OrderStatus::Cancelled,
    ];

    /// No transition leaves a terminal status.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Returned)
    }

    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::New => "NEW",
            OrderStatus::AwaitingPayment => "AWAITING_PAYMENT",
            OrderStatus::AwaitingReceipt => "AWAITING_RECEIPT",
            OrderStatus::AwaitingReturn => "AWAITING_RETURN",
            OrderStatus::Returned => "RETURNED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an order was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancelReason {
    ItemNotFound,
    ItemNotAvailable,
    ItemNotInLocation,
    PickupPointInactive,
    ClientRequest,
    Other,
}

impl CancelReason {
    pub fn as_str(self) -> &'static str {
        match self {
            CancelReason::ItemNotFound => "ITEM_NOT_FOUND",
            CancelReason::ItemNotAvailable => "ITEM_NOT_AVAILABLE",
            CancelReason::ItemNotInLocation => "ITEM_NOT_IN_LOCATION",
            CancelReason::PickupPointInactive => "PICKUP_POINT_INACTIVE",
            CancelReason::ClientRequest => "CLIENT_REQUEST",
            CancelReason::Other => "OTHER",
        }
    }

    /// Text sent to the client when an order is cancelled for this reason.
    pub fn client_message(self, order_id: OrderId) -> String {
        match self {
            CancelReason::ItemNotFound => {
                format!("Order {order_id} cancelled. The requested item does not exist.")
            }
            CancelReason::ItemNotAvailable => {
                format!("Order {order_id} cancelled. The item is not available for booking.")
            }
            CancelReason::ItemNotInLocation => {
                format!("Order {order_id} cancelled. The item is not at the selected pickup point.")
            }
            CancelReason::PickupPointInactive => {
                format!("Order {order_id} cancelled. The selected pickup point is closed.")
            }
            CancelReason::ClientRequest => {
                format!("Order {order_id} cancelled at your request.")
            }
            CancelReason::Other => format!("Order {order_id} cancelled."),
        }
    }
}

impl core::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inbound request to create a rental order.
///
/// Fields are raw integers as received from the caller; `validate` turns them
/// into an [`OrderDraft`] with typed ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrder {
    pub client_id: i64,
    pub item_id: i64,
    pub pickup_point_id: i64,
    pub rental_duration_hours: i64,
}

/// A validated order request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderDraft {
    pub client_id: ClientId,
    pub item_id: ItemId,
    pub pickup_point_id: PickupPointId,
    pub rental_duration_hours: u32,
}

impl CreateOrder {
    pub fn new(
        client_id: impl Into<i64>,
        item_id: impl Into<i64>,
        pickup_point_id: impl Into<i64>,
        rental_duration_hours: impl Into<i64>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            item_id: item_id.into(),
            pickup_point_id: pickup_point_id.into(),
            rental_duration_hours: rental_duration_hours.into(),
        }
    }

    pub fn validate(&self) -> DomainResult<OrderDraft> {
        let hours = u32::try_from(self.rental_duration_hours)
            .ok()
            .filter(|h| (MIN_RENTAL_HOURS..=MAX_RENTAL_HOURS).contains(h))
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "rental_duration_hours must be within {MIN_RENTAL_HOURS}..={MAX_RENTAL_HOURS}, got {}",
                    self.rental_duration_hours
                ))
            })?;

        Ok(OrderDraft {
            client_id: positive_id("client_id", self.client_id)?,
            item_id: positive_id("item_id", self.item_id)?,
            pickup_point_id: positive_id("pickup_point_id", self.pickup_point_id)?,
            rental_duration_hours: hours,
        })
    }
}

fn positive_id<T>(field: &str, raw: i64) -> DomainResult<T>
where
    T: TryFrom<i64, Error = DomainError>,
{
    T::try_from(raw).map_err(|_| DomainError::validation(format!("{field} must be positive, got {raw}")))
}

/// A rental order.
///
/// Invariants:
/// - `cancel_reason.is_some()` iff `status == Cancelled`
/// - `updated_at >= created_at`, refreshed on every status change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub client_id: ClientId,
    pub item_id: ItemId,
    pub pickup_point_id: PickupPointId,
    pub rental_duration_hours: u32,
    pub status: OrderStatus,
    pub cancel_reason: Option<CancelReason>,
    pub cancel_details: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// A fresh order in `NEW`.
    pub fn new(id: OrderId, draft: OrderDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            client_id: draft.client_id,
            item_id: draft.item_id,
            pickup_point_id: draft.pickup_point_id,
            rental_duration_hours: draft.rental_duration_hours,
            status: OrderStatus::New,
            cancel_reason: None,
            cancel_details: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Move to `to`, driven by an external collaborator.
    ///
    /// Only the terminal rule is enforced here; callers sequence the states.
    /// `NEW` cannot be re-entered and `CANCELLED` is reached through
    /// [`Order::cancel`] so that a reason is always recorded.
    pub fn advance(&mut self, to: OrderStatus, now: DateTime<Utc>) -> DomainResult<()> {
        if self.is_terminal() {
            return Err(DomainError::invalid_transition(format!(
                "order {} is {} and cannot move to {to}",
                self.id, self.status
            )));
        }
        match to {
            OrderStatus::New => {
                return Err(DomainError::invalid_transition("orders cannot return to NEW"));
            }
            OrderStatus::Cancelled => {
                return Err(DomainError::invalid_transition(
                    "use cancellation to move an order to CANCELLED",
                ));
            }
            _ => {}
        }

        self.status = to;
        self.touch(now);
        Ok(())
    }

    /// Cancel the order.
    ///
    /// Returns `Ok(false)` when the order is already cancelled (nothing changes),
    /// `Ok(true)` when this call performed the cancellation.
    pub fn cancel(
        &mut self,
        reason: CancelReason,
        details: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<bool> {
        match self.status {
            OrderStatus::Cancelled => Ok(false),
            OrderStatus::Returned => Err(DomainError::invalid_transition(format!(
                "order {} is already RETURNED",
                self.id
            ))),
            _ => {
                self.status = OrderStatus::Cancelled;
                self.cancel_reason = Some(reason);
                self.cancel_details = details;
                self.touch(now);
                Ok(true)
            }
        }
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        // Keep updated_at monotonic even if the wall clock steps back.
        self.updated_at = now.max(self.updated_at);
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> Self::Id {
        self.id
    }
}
