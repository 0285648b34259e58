//! Outbound channels of the rental workflow.
//!
//! - `bus`: pub/sub abstraction for the downstream event channel
//!   (documents/payment services listen for payable orders)
//! - `in_memory_bus`: in-process bus for tests/dev
//! - `message`: wire messages published on the event channel
//! - `notification`: client-facing cancellation notices and notifiers

pub mod bus;
pub mod in_memory_bus;
pub mod message;
pub mod notification;

pub use bus::{EventBus, Subscription};
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use message::RentalOrderMessage;
pub use notification::{CancellationNotice, LogNotifier, Notifier, NotifyError, RecordingNotifier};
