//! Rental domain module.
//!
//! Business rules for rentable items, clients, pickup points and rental
//! orders, implemented as deterministic domain logic (no IO, no locking, no
//! storage). The infrastructure crate persists these types and sequences the
//! workflow around them.

pub mod client;
pub mod item;
pub mod order;
pub mod pickup_point;

pub use client::Client;
pub use item::{HANDLING_BUFFER_MINUTES, Item};
pub use order::{CancelReason, CreateOrder, OrderDraft, MAX_RENTAL_HOURS, MIN_RENTAL_HOURS, Order, OrderStatus};
pub use pickup_point::PickupPoint;
