//! Availability checks.
//!
//! Decides whether an item can be handed out at a pickup point right now.
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. the item exists (`ItemNotFound`)
//! 2. it sits at the requested pickup point (`ItemNotInLocation`)
//! 3. it is not held (`ItemNotAvailable`)
//!
//! Just before step 3 stale holds are reclaimed:
//!
//! - a hold whose order is already terminal is always released (a cancel
//!   whose item release failed leaves one behind)
//! - under [`ExpiryPolicy::Lazy`] a hold whose `reserved_until` has passed is
//!   released unless its order is still active; an overdue rental keeps its
//!   item until that order is cancelled or returned

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use rentpoint_core::{ItemId, PickupPointId};
use rentpoint_rental::{Item, Order, OrderStatus};

use crate::error::{WorkflowError, WorkflowResult};
use crate::locks::KeyedLocks;
use crate::store::{EntityStore, FieldValue};

/// What happens to reservations whose window has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpiryPolicy {
    /// Heal expired holds when the item is next checked.
    #[default]
    Lazy,
    /// Holds of active or unknown orders stay until explicitly released.
    Disabled,
}

impl FromStr for ExpiryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lazy" => Ok(ExpiryPolicy::Lazy),
            "disabled" | "off" | "none" => Ok(ExpiryPolicy::Disabled),
            other => Err(format!("unknown expiry policy: {other}")),
        }
    }
}

/// Load an item, mapping a store miss to `ItemNotFound`.
pub(crate) fn load_item<S: EntityStore>(store: &S, item_id: ItemId) -> WorkflowResult<Item> {
    store.get::<Item>(item_id).map_err(|e| {
        if e.is_not_found() {
            WorkflowError::ItemNotFound(item_id)
        } else {
            e.into()
        }
    })
}

#[derive(Debug, Clone)]
pub struct AvailabilityChecker<S> {
    store: S,
    item_locks: Arc<KeyedLocks<ItemId>>,
    policy: ExpiryPolicy,
}

impl<S: EntityStore> AvailabilityChecker<S> {
    pub fn new(store: S, item_locks: Arc<KeyedLocks<ItemId>>, policy: ExpiryPolicy) -> Self {
        Self {
            store,
            item_locks,
            policy,
        }
    }

    pub fn policy(&self) -> ExpiryPolicy {
        self.policy
    }

    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    pub(crate) fn item_locks(&self) -> &KeyedLocks<ItemId> {
        &self.item_locks
    }

    /// Check that `item_id` can be handed out at `pickup_point_id` now.
    ///
    /// Returns the item as seen by the check (healed if its hold expired).
    pub fn check_availability(&self, item_id: ItemId, pickup_point_id: PickupPointId) -> WorkflowResult<Item> {
        self.item_locks
            .with_lock(item_id, || self.check_locked(item_id, pickup_point_id, Utc::now()))
    }

    /// Same as [`check_availability`](Self::check_availability); the caller
    /// must hold the item lock.
    pub(crate) fn check_locked(
        &self,
        item_id: ItemId,
        pickup_point_id: PickupPointId,
        now: DateTime<Utc>,
    ) -> WorkflowResult<Item> {
        let item = load_item(&self.store, item_id)?;

        if !item.is_located_at(pickup_point_id) {
            return Err(WorkflowError::ItemNotInLocation {
                item_id,
                requested: pickup_point_id,
                actual: item.current_pickup_point_id,
            });
        }

        let stale = !item.is_available_now
            && match self.holder_status(&item)? {
                Some(status) => status.is_terminal(),
                None => self.policy == ExpiryPolicy::Lazy && item.reservation_expired(now),
            };
        let item = if stale { self.heal(item)? } else { item };

        if !item.is_available_now {
            return Err(WorkflowError::ItemNotAvailable(item_id));
        }
        Ok(item)
    }

    /// Status of the order named by `reserved_by`; `None` when the hold has
    /// no owner or the owner is not in the store.
    fn holder_status(&self, item: &Item) -> WorkflowResult<Option<OrderStatus>> {
        let Some(order_id) = item.reserved_by else {
            return Ok(None);
        };
        match self.store.get::<Order>(order_id) {
            Ok(order) => {
                debug!(item_id = %item.id, order_id = %order_id, status = %order.status, "hold owner");
                Ok(Some(order.status))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn heal(&self, item: Item) -> WorkflowResult<Item> {
        let healed = self.store.update_fields::<Item>(
            item.id,
            &[
                ("is_available_now", FieldValue::Bool(true)),
                ("reserved_until", FieldValue::Null),
                ("reserved_by", FieldValue::Null),
            ],
        )?;
        info!(
            item_id = %item.id,
            order_id = ?item.reserved_by.map(|o| o.get()),
            "stale reservation released"
        );
        Ok(healed)
    }
}
