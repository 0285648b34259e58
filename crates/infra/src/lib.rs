//! Infrastructure layer: entity store, locking, the order workflow and its
//! outbound channels.
//!
//! - `store`: entity store abstraction + in-memory implementation
//! - `id_allocator`: collision-checked id generation
//! - `locks`: per-item / per-order mutual exclusion
//! - `availability` / `reservation`: the check-then-hold protocol
//! - `lifecycle`: order state machine and booking workflow
//! - `compensation`: cancellation and unwinding of failed bookings
//! - `publisher`: background worker feeding the event channel
//! - `config`: environment-driven configuration
//! - `seed`: demo catalogue

pub mod availability;
pub mod compensation;
pub mod config;
pub mod error;
pub mod id_allocator;
pub mod lifecycle;
pub mod locks;
pub mod publisher;
pub mod reservation;
pub mod seed;
pub mod store;


pub use availability::{AvailabilityChecker, ExpiryPolicy};
pub use compensation::Compensator;
pub use config::WorkflowConfig;
pub use error::{ErrorKind, WorkflowError, WorkflowResult};
pub use id_allocator::{IdAllocator, IdStrategy};
pub use lifecycle::OrderService;
pub use publisher::{EventPublisher, PublisherHandle, PublisherStats};
pub use reservation::ReservationEngine;
