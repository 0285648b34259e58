//! Demo catalogue for dev deployments.

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use rentpoint_core::{ClientId, DomainError, ItemId, PickupPointId};
use rentpoint_rental::{Client, Item, PickupPoint};

use crate::store::{EntityStore, StoreError, StoreResult};

fn id<T: TryFrom<u64, Error = DomainError>>(raw: u64) -> StoreResult<T> {
    T::try_from(raw).map_err(|e| StoreError::Unavailable(e.to_string()))
}

/// Load three items, two clients and two pickup points.
///
/// Item 457 is seeded as already rented out for the next 24 hours. Item 458
/// sits at pickup point 123, the rest at 789.
pub fn seed_demo<S: EntityStore>(store: &S, now: DateTime<Utc>) -> StoreResult<()> {
    let items = [
        Item {
            id: id::<ItemId>(456)?,
            description: "Makita drill".to_string(),
            hourly_price: 50,
            is_available_now: true,
            current_pickup_point_id: id(789)?,
            reserved_until: None,
            reserved_by: None,
        },
        Item {
            id: id(457)?,
            description: "Bosch screwdriver".to_string(),
            hourly_price: 60,
            is_available_now: false,
            current_pickup_point_id: id(789)?,
            reserved_until: Some(now + Duration::hours(24)),
            reserved_by: None,
        },
        Item {
            id: id(458)?,
            description: "Xiaomi power bank".to_string(),
            hourly_price: 20,
            is_available_now: true,
            current_pickup_point_id: id(123)?,
            reserved_until: None,
            reserved_by: None,
        },
    ];

    let clients = [
        Client {
            id: id::<ClientId>(123)?,
            name: "Ivan Ivanov".to_string(),
            phone: "+79161234567".to_string(),
            email: "ivan@mail.ru".to_string(),
        },
        Client {
            id: id(124)?,
            name: "Petr Petrov".to_string(),
            phone: "+79167654321".to_string(),
            email: "petr@mail.ru".to_string(),
        },
    ];

    let points = [
        PickupPoint {
            id: id::<PickupPointId>(789)?,
            address: "1 Lenina St".to_string(),
            is_active: true,
        },
        PickupPoint {
            id: id(123)?,
            address: "15 Mira Ave".to_string(),
            is_active: true,
        },
    ];

    let counts = (items.len(), clients.len(), points.len());
    for item in items {
        store.insert(item)?;
    }
    for client in clients {
        store.insert(client)?;
    }
    for point in points {
        store.insert(point)?;
    }

    info!(items = counts.0, clients = counts.1, pickup_points = counts.2, "demo catalogue loaded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryEntityStore, Table};

    #[test]
    fn seeds_every_table_once() {
        let store = InMemoryEntityStore::new();
        seed_demo(&store, Utc::now()).unwrap();

        assert_eq!(store.count(Table::Items).unwrap(), 3);
        assert_eq!(store.count(Table::Clients).unwrap(), 2);
        assert_eq!(store.count(Table::PickupPoints).unwrap(), 2);
        assert_eq!(store.count(Table::Orders).unwrap(), 0);

        let err = seed_demo(&store, Utc::now()).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId { .. }));
    }
}
