//! Entity trait: identity + continuity across state changes.

use crate::id::EntityId;

/// Entity marker + minimal interface.
///
/// Every row held by the entity store is an entity: it carries an immutable,
/// unique identifier and may otherwise change over time.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: EntityId;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}
