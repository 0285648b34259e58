//! Order lifecycle controller.
//!
//! Owns the order state machine and sequences the booking workflow:
//!
//! ```text
//! place_order
//!   ↓
//! 1. validate request, client, pickup point (no mutation on failure)
//!   ↓
//! 2. create order in NEW
//!   ↓
//! 3. availability check + reservation (one item lock)
//!   ↓                        ↘ failure: cancel with mapped reason, notify, return error
//! 4. advance to AWAITING_PAYMENT
//!   ↓
//! 5. enqueue event for the downstream channel (fire-and-forget)
//! ```
//!
//! Later transitions are driven by external collaborators through
//! `advance_order`; cancellation goes through the compensation path.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use rentpoint_core::{ClientId, ItemId, OrderId, PickupPointId};
use rentpoint_events::{Notifier, RentalOrderMessage};
use rentpoint_rental::{CancelReason, Client, CreateOrder, Item, Order, OrderDraft, OrderStatus, PickupPoint};

use crate::availability::AvailabilityChecker;
use crate::compensation::{Compensator, load_order};
use crate::config::WorkflowConfig;
use crate::error::{WorkflowError, WorkflowResult};
use crate::id_allocator::IdAllocator;
use crate::locks::KeyedLocks;
use crate::publisher::EventPublisher;
use crate::reservation::ReservationEngine;
use crate::store::{EntityStore, StoreError, Table};

/// How many times order creation re-allocates after losing an id race.
const INSERT_ATTEMPTS: u32 = 8;

/// Entry point of the rental order workflow.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
#[derive(Debug)]
pub struct OrderService<S, N> {
    store: S,
    ids: IdAllocator,
    availability: AvailabilityChecker<S>,
    reservations: ReservationEngine<S>,
    compensator: Compensator<S, N>,
    order_locks: Arc<KeyedLocks<OrderId>>,
    events: EventPublisher<RentalOrderMessage>,
}

impl<S, N> OrderService<S, N>
where
    S: EntityStore + Clone,
    N: Notifier,
{
    pub fn new(
        store: S,
        config: &WorkflowConfig,
        notifier: N,
        events: EventPublisher<RentalOrderMessage>,
    ) -> Self {
        let item_locks = Arc::new(KeyedLocks::new("item"));
        let order_locks = Arc::new(KeyedLocks::new("order"));

        let availability = AvailabilityChecker::new(store.clone(), item_locks, config.expiry_policy);
        let reservations = ReservationEngine::new(availability.clone());
        let compensator = Compensator::new(store.clone(), reservations.clone(), order_locks.clone(), notifier);

        Self {
            store,
            ids: IdAllocator::new(config.id_strategy, config.id_start),
            availability,
            reservations,
            compensator,
            order_locks,
            events,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn availability(&self) -> &AvailabilityChecker<S> {
        &self.availability
    }

    pub fn reservations(&self) -> &ReservationEngine<S> {
        &self.reservations
    }

    pub fn events(&self) -> &EventPublisher<RentalOrderMessage> {
        &self.events
    }

    pub fn get_order(&self, order_id: OrderId) -> WorkflowResult<Order> {
        load_order(&self.store, order_id)
    }

    pub fn check_availability(&self, item_id: ItemId, pickup_point_id: PickupPointId) -> WorkflowResult<Item> {
        self.availability.check_availability(item_id, pickup_point_id)
    }

    /// Validate `request` and persist a new order in `NEW`.
    ///
    /// Does not look at the item, client or pickup point.
    pub fn create_order(&self, request: &CreateOrder) -> WorkflowResult<Order> {
        let draft = request.validate()?;
        self.insert_new(draft)
    }

    /// Move an order to `to`.
    ///
    /// Reaching `AWAITING_PAYMENT` enqueues one message for the downstream
    /// event channel.
    pub fn advance_order(&self, order_id: OrderId, to: OrderStatus) -> WorkflowResult<Order> {
        let order = self.order_locks.with_lock(order_id, || -> WorkflowResult<Order> {
            let mut order = load_order(&self.store, order_id)?;
            order.advance(to, Utc::now())?;
            Ok(self.store.update_fields::<Order>(
                order_id,
                &[("status", to.into()), ("updated_at", order.updated_at.into())],
            )?)
        })?;

        info!(order_id = %order.id, status = %order.status, "order advanced");

        if to == OrderStatus::AwaitingPayment
            && self.events.enqueue(RentalOrderMessage::from_order(&order, Utc::now()))
        {
            debug!(order_id = %order.id, event = RentalOrderMessage::EVENT_TYPE, "event queued");
        }
        Ok(order)
    }

    pub fn cancel_order(
        &self,
        order_id: OrderId,
        reason: CancelReason,
        details: Option<String>,
    ) -> WorkflowResult<Order> {
        self.compensator.cancel(order_id, reason, details)
    }

    /// Run the whole booking workflow for `request`.
    ///
    /// Fails before any mutation when the request is invalid, the client or
    /// pickup point is unknown, or the pickup point is closed. Once the order
    /// exists, any failure cancels it (releasing whatever was reserved) before
    /// the error is returned.
    pub fn place_order(&self, request: &CreateOrder) -> WorkflowResult<Order> {
        let draft = request.validate()?;
        self.require_client(draft.client_id)?;
        let point = self.require_pickup_point(draft.pickup_point_id)?;
        if !point.is_active {
            return Err(WorkflowError::PickupPointInactive(point.id));
        }

        let order = self.insert_new(draft)?;

        if let Err(err) = self.reservations.reserve_if_available(
            draft.item_id,
            draft.pickup_point_id,
            order.id,
            draft.rental_duration_hours,
        ) {
            self.compensate(order.id, &err);
            return Err(err);
        }

        self.advance_order(order.id, OrderStatus::AwaitingPayment)
            .inspect_err(|err| self.compensate(order.id, err))
    }

    fn compensate(&self, order_id: OrderId, cause: &WorkflowError) {
        let reason = cause.cancel_reason();
        warn!(order_id = %order_id, reason = %reason, error = %cause, "order workflow failed; compensating");

        if let Err(err) = self.compensator.cancel(order_id, reason, Some(cause.to_string())) {
            warn!(order_id = %order_id, error = %err, "compensation failed");
        }
    }

    fn insert_new(&self, draft: OrderDraft) -> WorkflowResult<Order> {
        for _ in 0..INSERT_ATTEMPTS {
            let id = self.ids.allocate::<Order, _>(&self.store)?;
            let order = Order::new(id, draft, Utc::now());

            match self.store.insert(order.clone()) {
                Ok(()) => {
                    info!(
                        order_id = %order.id,
                        client_id = %order.client_id,
                        item_id = %order.item_id,
                        pickup_point_id = %order.pickup_point_id,
                        hours = order.rental_duration_hours,
                        "order created"
                    );
                    return Ok(order);
                }
                Err(StoreError::DuplicateId { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(StoreError::IdsExhausted {
            table: Table::Orders,
            attempts: INSERT_ATTEMPTS,
        }
        .into())
    }

    fn require_client(&self, client_id: ClientId) -> WorkflowResult<Client> {
        self.store.get::<Client>(client_id).map_err(|e| {
            if e.is_not_found() {
                WorkflowError::ClientNotFound(client_id)
            } else {
                e.into()
            }
        })
    }

    fn require_pickup_point(&self, pickup_point_id: PickupPointId) -> WorkflowResult<PickupPoint> {
        self.store.get::<PickupPoint>(pickup_point_id).map_err(|e| {
            if e.is_not_found() {
                WorkflowError::PickupPointNotFound(pickup_point_id)
            } else {
                e.into()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rentpoint_events::{EventBus, InMemoryEventBus, RecordingNotifier, Subscription};
    use rentpoint_rental::HANDLING_BUFFER_MINUTES;

    use crate::publisher::PublisherHandle;
    use crate::seed::seed_demo;
    use crate::store::InMemoryEntityStore;

    type Store = Arc<InMemoryEntityStore>;

    struct Harness {
        service: OrderService<Store, Arc<RecordingNotifier>>,
        notifier: Arc<RecordingNotifier>,
        events: Subscription<RentalOrderMessage>,
        publisher: PublisherHandle,
    }

    fn harness() -> Harness {
        let store: Store = Arc::new(InMemoryEntityStore::new());
        seed_demo(&store, Utc::now()).unwrap();

        let bus = Arc::new(InMemoryEventBus::new());
        let events = bus.subscribe();
        let (publisher_tx, publisher) = EventPublisher::spawn("test-events", bus, 16).unwrap();
        let notifier = Arc::new(RecordingNotifier::new());
        let service = OrderService::new(store, &WorkflowConfig::default(), notifier.clone(), publisher_tx);

        Harness {
            service,
            notifier,
            events,
            publisher,
        }
    }

    #[test]
    fn create_order_persists_new_order() {
        let h = harness();
        let order = h.service.create_order(&CreateOrder::new(123, 456, 789, 4)).unwrap();

        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(order.id.get(), 1000);
        assert_eq!(h.service.get_order(order.id).unwrap(), order);
    }

    #[test]
    fn create_order_rejects_bad_hours_without_writing() {
        let h = harness();
        for hours in [0, 721] {
            let err = h.service.create_order(&CreateOrder::new(123, 456, 789, hours)).unwrap_err();
            assert!(matches!(err, WorkflowError::Validation(_)), "hours={hours}");
        }
        assert!(h.service.store().list::<Order>().unwrap().is_empty());
    }

    #[test]
    fn place_order_reserves_and_emits_one_event() {
        let h = harness();
        let before = Utc::now();

        let order = h.service.place_order(&CreateOrder::new(123, 456, 789, 48)).unwrap();

        assert_eq!(order.status, OrderStatus::AwaitingPayment);
        let item: Item = h.service.store().get(order.item_id).unwrap();
        assert!(item.is_held_by(order.id));
        let expected = before + Duration::hours(48) + Duration::minutes(HANDLING_BUFFER_MINUTES);
        assert!(item.reserved_until.unwrap() - expected < Duration::seconds(5));

        let msg = h.events.recv_timeout(std::time::Duration::from_secs(2)).unwrap();
        assert_eq!(msg.order_id, order.id);
        assert_eq!(msg.status, OrderStatus::AwaitingPayment);
        let stats = h.publisher.shutdown();
        assert_eq!(stats.published, 1);
        assert!(h.events.drain().is_empty());
    }

    #[test]
    fn place_order_at_wrong_location_cancels_and_notifies() {
        let h = harness();
        let before: Item = h.service.store().get(ItemId::new(458).unwrap()).unwrap();

        let err = h.service.place_order(&CreateOrder::new(123, 458, 789, 2)).unwrap_err();
        assert!(matches!(err, WorkflowError::ItemNotInLocation { .. }));

        let orders = h.service.store().list::<Order>().unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].status, OrderStatus::Cancelled);
        assert_eq!(orders[0].cancel_reason, Some(CancelReason::ItemNotInLocation));

        assert_eq!(h.service.store().get::<Item>(before.id).unwrap(), before);
        assert_eq!(h.notifier.count(), 1);
        assert_eq!(h.publisher.shutdown().enqueued, 0);
    }

    #[test]
    fn place_order_prechecks_fail_without_creating_an_order() {
        let h = harness();

        let err = h.service.place_order(&CreateOrder::new(999, 456, 789, 2)).unwrap_err();
        assert_eq!(err, WorkflowError::ClientNotFound(ClientId::new(999).unwrap()));

        let err = h.service.place_order(&CreateOrder::new(123, 456, 5, 2)).unwrap_err();
        assert_eq!(err, WorkflowError::PickupPointNotFound(PickupPointId::new(5).unwrap()));

        assert!(h.service.store().list::<Order>().unwrap().is_empty());
        assert_eq!(h.notifier.count(), 0);
    }

    #[test]
    fn held_item_is_rejected_with_item_not_available() {
        let h = harness();
        let err = h.service.place_order(&CreateOrder::new(124, 457, 789, 2)).unwrap_err();
        assert_eq!(err, WorkflowError::ItemNotAvailable(ItemId::new(457).unwrap()));

        let orders = h.service.store().list::<Order>().unwrap();
        assert_eq!(orders[0].cancel_reason, Some(CancelReason::ItemNotAvailable));
    }

    #[test]
    fn advance_follows_lifecycle_and_stops_at_terminal() {
        let h = harness();
        let order = h.service.place_order(&CreateOrder::new(123, 456, 789, 2)).unwrap();

        for status in [OrderStatus::AwaitingReceipt, OrderStatus::AwaitingReturn, OrderStatus::Returned] {
            let advanced = h.service.advance_order(order.id, status).unwrap();
            assert_eq!(advanced.status, status);
            assert!(advanced.updated_at >= advanced.created_at);
        }

        let err = h.service.advance_order(order.id, OrderStatus::AwaitingPayment).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition(_)));

        let err = h
            .service
            .advance_order(OrderId::new(9999).unwrap(), OrderStatus::AwaitingPayment)
            .unwrap_err();
        assert_eq!(err, WorkflowError::OrderNotFound(OrderId::new(9999).unwrap()));
    }

    #[test]
    fn cancel_frees_item_for_next_check() {
        let h = harness();
        let order = h.service.place_order(&CreateOrder::new(123, 456, 789, 2)).unwrap();
        let (item, point) = (order.item_id, order.pickup_point_id);
        assert!(h.service.check_availability(item, point).is_err());

        h.service
            .cancel_order(order.id, CancelReason::ClientRequest, None)
            .unwrap();

        assert!(h.service.check_availability(item, point).is_ok());
        let again = h.service.cancel_order(order.id, CancelReason::Other, None).unwrap();
        assert_eq!(again.cancel_reason, Some(CancelReason::ClientRequest));
        assert_eq!(h.notifier.count(), 1);
    }
}
