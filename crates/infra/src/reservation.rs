//! Item reservations.
//!
//! A reservation marks an item unavailable, stamps when the hold expires and
//! records which order holds it. Release only undoes a hold owned by the
//! releasing order.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use rentpoint_core::{ItemId, OrderId, PickupPointId};
use rentpoint_rental::Item;

use crate::availability::{AvailabilityChecker, load_item};
use crate::error::{WorkflowError, WorkflowResult};
use crate::store::{EntityStore, FieldValue};

#[derive(Debug, Clone)]
pub struct ReservationEngine<S> {
    checker: AvailabilityChecker<S>,
}

impl<S: EntityStore> ReservationEngine<S> {
    /// Shares the checker's store and item locks.
    pub fn new(checker: AvailabilityChecker<S>) -> Self {
        Self { checker }
    }

    /// Hold `item_id` for `order_id` for `rental_hours` plus the handling buffer.
    ///
    /// Does not re-check availability; see [`reserve_if_available`](Self::reserve_if_available).
    pub fn reserve(&self, item_id: ItemId, order_id: OrderId, rental_hours: u32) -> WorkflowResult<Item> {
        self.checker
            .item_locks()
            .with_lock(item_id, || self.reserve_locked(item_id, order_id, rental_hours, Utc::now()))
    }

    /// Availability check and reservation under one item lock.
    ///
    /// Two callers racing for the same item are serialized here: the second
    /// one sees the first one's hold and fails with `ItemNotAvailable`.
    pub fn reserve_if_available(
        &self,
        item_id: ItemId,
        pickup_point_id: PickupPointId,
        order_id: OrderId,
        rental_hours: u32,
    ) -> WorkflowResult<Item> {
        self.checker.item_locks().with_lock(item_id, || {
            let now = Utc::now();
            self.checker.check_locked(item_id, pickup_point_id, now)?;
            self.reserve_locked(item_id, order_id, rental_hours, now)
        })
    }

    /// Release the hold on `item_id` if `order_id` owns it.
    ///
    /// Returns whether anything was released. A missing item is not an error.
    pub fn release(&self, item_id: ItemId, order_id: OrderId) -> WorkflowResult<bool> {
        self.checker.item_locks().with_lock(item_id, || {
            let item = match load_item(self.checker.store(), item_id) {
                Ok(item) => item,
                Err(WorkflowError::ItemNotFound(_)) => return Ok(false),
                Err(e) => return Err(e),
            };

            if !item.is_held_by(order_id) {
                debug!(item_id = %item_id, order_id = %order_id, "item not held by order; nothing to release");
                return Ok(false);
            }

            self.checker.store().update_fields::<Item>(
                item_id,
                &[
                    ("is_available_now", FieldValue::Bool(true)),
                    ("reserved_until", FieldValue::Null),
                    ("reserved_by", FieldValue::Null),
                ],
            )?;
            info!(item_id = %item_id, order_id = %order_id, "item released");
            Ok(true)
        })
    }

    fn reserve_locked(
        &self,
        item_id: ItemId,
        order_id: OrderId,
        rental_hours: u32,
        now: DateTime<Utc>,
    ) -> WorkflowResult<Item> {
        let until = Item::reservation_expiry(now, rental_hours)?;

        let item = self
            .checker
            .store()
            .update_fields::<Item>(
                item_id,
                &[
                    ("is_available_now", FieldValue::Bool(false)),
                    ("reserved_until", until.into()),
                    ("reserved_by", order_id.into()),
                ],
            )
            .map_err(|e| {
                if e.is_not_found() {
                    WorkflowError::ItemNotFound(item_id)
                } else {
                    e.into()
                }
            })?;

        info!(item_id = %item_id, order_id = %order_id, reserved_until = %until, "item reserved");
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Duration;
    use rentpoint_rental::HANDLING_BUFFER_MINUTES;

    use crate::availability::ExpiryPolicy;
    use crate::locks::KeyedLocks;
    use crate::store::InMemoryEntityStore;

    fn engine() -> (Arc<InMemoryEntityStore>, ReservationEngine<Arc<InMemoryEntityStore>>) {
        let store = Arc::new(InMemoryEntityStore::new());
        store
            .insert(Item {
                id: ItemId::new(456).unwrap(),
                description: "Makita drill".to_string(),
                hourly_price: 50,
                is_available_now: true,
                current_pickup_point_id: PickupPointId::new(789).unwrap(),
                reserved_until: None,
                reserved_by: None,
            })
            .unwrap();
        let checker = AvailabilityChecker::new(store.clone(), Arc::new(KeyedLocks::new("item")), ExpiryPolicy::Lazy);
        (store, ReservationEngine::new(checker))
    }

    fn item_id() -> ItemId {
        ItemId::new(456).unwrap()
    }

    fn order(id: u64) -> OrderId {
        OrderId::new(id).unwrap()
    }

    #[test]
    fn reserve_stamps_window_and_owner() {
        let (store, engine) = engine();
        let before = Utc::now();

        let item = engine.reserve(item_id(), order(1000), 48).unwrap();

        assert!(!item.is_available_now);
        assert_eq!(item.reserved_by, Some(order(1000)));
        let until = item.reserved_until.unwrap();
        let expected = before + Duration::hours(48) + Duration::minutes(HANDLING_BUFFER_MINUTES);
        assert!(until >= expected && until - expected < Duration::seconds(5));
        assert_eq!(store.get::<Item>(item_id()).unwrap(), item);
    }

    #[test]
    fn reserve_unknown_item_fails() {
        let (_, engine) = engine();
        let missing = ItemId::new(999).unwrap();
        assert_eq!(
            engine.reserve(missing, order(1000), 1),
            Err(WorkflowError::ItemNotFound(missing))
        );
    }

    #[test]
    fn second_reservation_sees_first_hold() {
        let (_, engine) = engine();
        let point = PickupPointId::new(789).unwrap();

        engine.reserve_if_available(item_id(), point, order(1000), 2).unwrap();
        let err = engine
            .reserve_if_available(item_id(), point, order(1001), 2)
            .unwrap_err();
        assert_eq!(err, WorkflowError::ItemNotAvailable(item_id()));
    }

    #[test]
    fn release_only_by_holder() {
        let (store, engine) = engine();
        engine.reserve(item_id(), order(1000), 2).unwrap();

        assert!(!engine.release(item_id(), order(1001)).unwrap());
        assert!(!store.get::<Item>(item_id()).unwrap().is_available_now);

        assert!(engine.release(item_id(), order(1000)).unwrap());
        let item: Item = store.get(item_id()).unwrap();
        assert!(item.is_available_now);
        assert_eq!(item.reserved_until, None);
        assert_eq!(item.reserved_by, None);

        // Second release is a no-op.
        assert!(!engine.release(item_id(), order(1000)).unwrap());
    }
}
