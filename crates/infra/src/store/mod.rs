//! Entity store boundary.
//!
//! Holds the four tables the rental workflow works against and exposes
//! schema-checked lookups and atomic field updates. The store is an explicitly
//! constructed value passed to the workflow components; there is no global
//! table state.

pub mod in_memory;
pub mod schema;
pub mod r#trait;

pub use in_memory::InMemoryEntityStore;
pub use r#trait::{EntityStore, StoreError, StoreResult};
pub use schema::{FieldSpec, FieldType, FieldValue, ID_FIELD, Record, Row, Table};
