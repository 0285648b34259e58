use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use rentpoint_core::{DomainError, DomainResult, Entity, ItemId, OrderId, PickupPointId};

/// Fixed slack added on top of the rental window when a reservation is stamped,
/// covering pickup and drop-off at the locker.
pub const HANDLING_BUFFER_MINUTES: i64 = 15;

/// A rentable physical item held at a pickup point.
///
/// Invariants:
/// - `is_available_now == false` iff the item is held against some order
///   (`reserved_by` names that order).
/// - `reserved_until`, when stamped, lies strictly in the future.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub description: String,
    /// Price per hour in the smallest currency unit.
    pub hourly_price: u64,
    pub is_available_now: bool,
    pub current_pickup_point_id: PickupPointId,
    pub reserved_until: Option<DateTime<Utc>>,
    pub reserved_by: Option<OrderId>,
}

impl Item {
    pub fn is_located_at(&self, pickup_point_id: PickupPointId) -> bool {
        self.current_pickup_point_id == pickup_point_id
    }

    pub fn is_held_by(&self, order_id: OrderId) -> bool {
        !self.is_available_now && self.reserved_by == Some(order_id)
    }

    /// True when the item is held but its reservation window has elapsed.
    pub fn reservation_expired(&self, now: DateTime<Utc>) -> bool {
        !self.is_available_now && self.reserved_until.is_some_and(|until| until <= now)
    }

    /// Compute the expiry to stamp for a rental of `rental_hours` starting `now`.
    pub fn reservation_expiry(now: DateTime<Utc>, rental_hours: u32) -> DomainResult<DateTime<Utc>> {
        if rental_hours == 0 {
            return Err(DomainError::validation("rental hours must be positive"));
        }
        let window = Duration::hours(i64::from(rental_hours)) + Duration::minutes(HANDLING_BUFFER_MINUTES);
        now.checked_add_signed(window)
            .ok_or_else(|| DomainError::validation("reservation expiry out of range"))
    }
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> Item {
        Item {
            id: ItemId::new(456).unwrap(),
            description: "Makita drill".to_string(),
            hourly_price: 50,
            is_available_now: true,
            current_pickup_point_id: PickupPointId::new(789).unwrap(),
            reserved_until: None,
            reserved_by: None,
        }
    }

    #[test]
    fn expiry_includes_handling_buffer() {
        let now = Utc::now();
        let until = Item::reservation_expiry(now, 48).unwrap();
        assert_eq!(until - now, Duration::hours(48) + Duration::minutes(HANDLING_BUFFER_MINUTES));
        assert!(until > now);
    }

    #[test]
    fn zero_hours_is_rejected() {
        let err = Item::reservation_expiry(Utc::now(), 0).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn expired_only_when_held_and_elapsed() {
        let now = Utc::now();
        let mut it = item();
        assert!(!it.reservation_expired(now));

        it.is_available_now = false;
        it.reserved_until = Some(now - Duration::minutes(1));
        assert!(it.reservation_expired(now));

        it.reserved_until = Some(now + Duration::hours(1));
        assert!(!it.reservation_expired(now));
    }

    #[test]
    fn held_by_requires_matching_order() {
        let mut it = item();
        let order = OrderId::new(1000).unwrap();
        assert!(!it.is_held_by(order));

        it.is_available_now = false;
        it.reserved_by = Some(order);
        assert!(it.is_held_by(order));
        assert!(!it.is_held_by(OrderId::new(1001).unwrap()));
    }
}
