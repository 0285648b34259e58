//! Identifier allocation.
//!
//! Ids are generated, probed against the store and regenerated on conflict,
//! with a bounded number of attempts. Uniqueness at insert time is enforced by
//! the store itself (`StoreError::DuplicateId`); callers that race on the same
//! id simply allocate again.

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;
use uuid::Uuid;

use rentpoint_core::EntityId;

use crate::store::{EntityStore, Record, StoreError, StoreResult, Table};

/// Default upper bound on generate-and-probe rounds per allocation.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 64;

/// Random ids stay within 53 bits so they survive a round trip through JSON
/// numbers in JavaScript clients.
const RANDOM_ID_MASK: u64 = (1 << 53) - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdStrategy {
    /// Monotonic per-table counter.
    #[default]
    Sequential,
    /// Collision-checked random ids.
    Random,
}

impl FromStr for IdStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" | "counter" => Ok(IdStrategy::Sequential),
            "random" => Ok(IdStrategy::Random),
            other => Err(format!("unknown id strategy: {other}")),
        }
    }
}

#[derive(Debug)]
pub struct IdAllocator {
    strategy: IdStrategy,
    counters: [AtomicU64; Table::ALL.len()],
    max_attempts: u32,
}

impl IdAllocator {
    pub fn new(strategy: IdStrategy, start: u64) -> Self {
        Self {
            strategy,
            counters: std::array::from_fn(|_| AtomicU64::new(start)),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Allocate an id absent from `R`'s table at the time of the probe.
    pub fn allocate<R, S>(&self, store: &S) -> StoreResult<R::Id>
    where
        R: Record,
        S: EntityStore,
    {
        for attempt in 1..=self.max_attempts {
            let raw = self.candidate(R::TABLE);
            let Some(id) = R::Id::from_raw(raw) else {
                continue;
            };
            if !store.exists::<R>(id)? {
                return Ok(id);
            }
            debug!(table = %R::TABLE, id = raw, attempt, "id already taken");
        }

        Err(StoreError::IdsExhausted {
            table: R::TABLE,
            attempts: self.max_attempts,
        })
    }

    fn candidate(&self, table: Table) -> u64 {
        match self.strategy {
            IdStrategy::Sequential => self.counters[table.index()].fetch_add(1, Ordering::SeqCst),
            IdStrategy::Random => (Uuid::new_v4().as_u128() as u64) & RANDOM_ID_MASK,
        }
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new(IdStrategy::Sequential, 1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryEntityStore;
    use chrono::Utc;
    use rentpoint_core::OrderId;
    use rentpoint_rental::{CreateOrder, Order};

    fn insert_order(store: &InMemoryEntityStore, id: u64) {
        let draft = CreateOrder::new(1, 1, 1, 1).validate().unwrap();
        store
            .insert(Order::new(OrderId::new(id).unwrap(), draft, Utc::now()))
            .unwrap();
    }

    #[test]
    fn sequential_starts_at_configured_value_and_skips_taken_ids() {
        let store = InMemoryEntityStore::new();
        insert_order(&store, 1000);
        insert_order(&store, 1001);

        let alloc = IdAllocator::default();
        let id = alloc.allocate::<Order, _>(&store).unwrap();
        assert_eq!(id.get(), 1002);
        let id = alloc.allocate::<Order, _>(&store).unwrap();
        assert_eq!(id.get(), 1003);
    }

    #[test]
    fn counters_are_per_table() {
        let store = InMemoryEntityStore::new();
        let alloc = IdAllocator::new(IdStrategy::Sequential, 5);
        assert_eq!(alloc.allocate::<Order, _>(&store).unwrap().get(), 5);
        assert_eq!(alloc.allocate::<rentpoint_rental::Item, _>(&store).unwrap().get(), 5);
    }

    #[test]
    fn gives_up_after_bounded_attempts() {
        let store = InMemoryEntityStore::new();
        for id in 1000..1010 {
            insert_order(&store, id);
        }

        let alloc = IdAllocator::default().with_max_attempts(3);
        let err = alloc.allocate::<Order, _>(&store).unwrap_err();
        assert_eq!(
            err,
            StoreError::IdsExhausted {
                table: Table::Orders,
                attempts: 3
            }
        );
    }

    #[test]
    fn random_ids_are_nonzero_and_bounded() {
        let store = InMemoryEntityStore::new();
        let alloc = IdAllocator::new(IdStrategy::Random, 0);
        for _ in 0..100 {
            let id = alloc.allocate::<Order, _>(&store).unwrap();
            assert!(id.get() > 0 && id.get() <= RANDOM_ID_MASK);
        }
    }

    #[test]
    fn strategy_parses_from_config_strings() {
        assert_eq!("sequential".parse::<IdStrategy>(), Ok(IdStrategy::Sequential));
        assert_eq!(" Random ".parse::<IdStrategy>(), Ok(IdStrategy::Random));
        assert!("uuid".parse::<IdStrategy>().is_err());
    }
}
