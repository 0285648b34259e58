//! Cancellation and compensation.
//!
//! Reverses a partially completed order workflow: marks the order cancelled
//! with a reason, releases the item if this order holds it, then tells the
//! client. Used both for client-requested cancellation and to unwind
//! `place_order` when availability or reservation fails.
//!
//! The order lock is held for the status write and the release; the client
//! notice goes out after it is dropped. Notification is best-effort: a failure
//! is logged and the cancellation stands.
//!
//! Once the cancelled status is written the call succeeds and the client is
//! notified even if releasing the item fails. The leftover hold belongs to a
//! terminal order, so the next availability check or a repeat cancel reclaims
//! it.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use rentpoint_core::OrderId;
use rentpoint_events::{CancellationNotice, Notifier};
use rentpoint_rental::{CancelReason, Client, Order};

use crate::error::{WorkflowError, WorkflowResult};
use crate::locks::KeyedLocks;
use crate::reservation::ReservationEngine;
use crate::store::EntityStore;

pub(crate) fn load_order<S: EntityStore>(store: &S, order_id: OrderId) -> WorkflowResult<Order> {
    store.get::<Order>(order_id).map_err(|e| {
        if e.is_not_found() {
            WorkflowError::OrderNotFound(order_id)
        } else {
            e.into()
        }
    })
}

#[derive(Debug, Clone)]
pub struct Compensator<S, N> {
    store: S,
    reservations: ReservationEngine<S>,
    order_locks: Arc<KeyedLocks<OrderId>>,
    notifier: N,
}

impl<S, N> Compensator<S, N>
where
    S: EntityStore,
    N: Notifier,
{
    pub fn new(
        store: S,
        reservations: ReservationEngine<S>,
        order_locks: Arc<KeyedLocks<OrderId>>,
        notifier: N,
    ) -> Self {
        Self {
            store,
            reservations,
            order_locks,
            notifier,
        }
    }

    /// Cancel `order_id` with `reason`.
    ///
    /// - already `CANCELLED`: returns the order unchanged (a leftover hold is
    ///   still released) and sends no notice
    /// - `RETURNED`: `InvalidTransition`
    /// - release failure: logged when this call cancelled the order, returned
    ///   as an error on a repeat cancel
    pub fn cancel(&self, order_id: OrderId, reason: CancelReason, details: Option<String>) -> WorkflowResult<Order> {
        let (order, changed) = self.order_locks.with_lock(order_id, || -> WorkflowResult<(Order, bool)> {
            let mut order = load_order(&self.store, order_id)?;
            let changed = order.cancel(reason, details, Utc::now())?;

            if changed {
                order = self.store.update_fields::<Order>(
                    order_id,
                    &[
                        ("status", order.status.into()),
                        ("cancel_reason", order.cancel_reason.into()),
                        ("cancel_details", order.cancel_details.clone().into()),
                        ("updated_at", order.updated_at.into()),
                    ],
                )?;
            }

            // Runs on repeat cancels too, so a release that failed earlier is retried.
            if let Err(err) = self.reservations.release(order.item_id, order.id) {
                if !changed {
                    return Err(err);
                }
                warn!(
                    order_id = %order.id,
                    item_id = %order.item_id,
                    error = %err,
                    "item release failed after cancellation; hold left for reclaim"
                );
            }
            Ok((order, changed))
        })?;

        if changed {
            info!(
                order_id = %order.id,
                item_id = %order.item_id,
                reason = %reason,
                "order cancelled"
            );
            self.notify(&order, reason);
        }
        Ok(order)
    }

    fn notify(&self, order: &Order, reason: CancelReason) {
        let contact = match self.store.get::<Client>(order.client_id) {
            Ok(client) => client.contact().map(str::to_string),
            Err(err) => {
                warn!(order_id = %order.id, client_id = %order.client_id, error = %err, "client lookup for notice failed");
                None
            }
        };

        let notice = CancellationNotice::new(order.client_id, order.id, reason, order.cancel_details.clone(), contact);
        if let Err(err) = self.notifier.notify(&notice) {
            warn!(order_id = %order.id, client_id = %order.client_id, error = %err, "cancellation notice not delivered");
        }
    }
}
