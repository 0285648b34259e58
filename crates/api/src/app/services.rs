//! Service wiring for the HTTP process.

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Context;
use chrono::Utc;
use tracing::info;

use rentpoint_events::{InMemoryEventBus, LogNotifier, RentalOrderMessage};
use rentpoint_infra::seed::seed_demo;
use rentpoint_infra::store::InMemoryEntityStore;
use rentpoint_infra::{EventPublisher, OrderService, PublisherHandle, WorkflowConfig};

pub type Store = Arc<InMemoryEntityStore>;
pub type Orders = OrderService<Store, LogNotifier>;

pub struct AppServices {
    pub orders: Orders,
    publisher: Mutex<Option<PublisherHandle>>,
}

impl std::fmt::Debug for AppServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppServices").finish_non_exhaustive()
    }
}

impl AppServices {
    /// Stop the event publisher after draining its queue. Idempotent.
    pub fn shutdown(&self) {
        let handle = self
            .publisher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            let stats = handle.shutdown();
            info!(
                enqueued = stats.enqueued,
                published = stats.published,
                failed = stats.failed,
                dropped = stats.dropped,
                "event publisher shut down"
            );
        }
    }
}

pub fn build_services(config: &WorkflowConfig) -> anyhow::Result<AppServices> {
    let store: Store = Arc::new(InMemoryEntityStore::new());
    if config.seed_demo {
        seed_demo(&store, Utc::now()).context("failed to seed demo catalogue")?;
    }

    let bus: Arc<InMemoryEventBus<RentalOrderMessage>> = Arc::new(InMemoryEventBus::new());
    let (events, publisher) = EventPublisher::spawn("rental-events", bus, config.event_queue_capacity)
        .context("failed to spawn event publisher")?;

    let orders = OrderService::new(store, config, LogNotifier, events);

    Ok(AppServices {
        orders,
        publisher: Mutex::new(Some(publisher)),
    })
}
