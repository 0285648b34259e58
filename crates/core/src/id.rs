//! Strongly-typed identifiers used across the domain.
//!
//! Identifiers are opaque positive integers. Zero is never a valid id; parsing
//! and `try_from` reject it.

use core::num::NonZeroU64;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Common behaviour of every entity identifier.
///
/// Lets generic infrastructure (store, id allocator) move between the typed id
/// and its raw integer form without knowing the concrete entity.
pub trait EntityId:
    Copy + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display + Send + Sync + 'static
{
    /// Raw integer value (always > 0).
    fn get(self) -> u64;

    /// Build an identifier from a raw value, rejecting zero.
    fn from_raw(raw: u64) -> Option<Self>;
}

/// Identifier of a rentable item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct ItemId(NonZeroU64);

/// Identifier of a registered client.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct ClientId(NonZeroU64);

/// Identifier of a pickup point (parcel locker).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct PickupPointId(NonZeroU64);

/// Identifier of a rental order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct OrderId(NonZeroU64);

macro_rules! impl_numeric_id {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Create an identifier from a raw value.
            ///
            /// Returns `DomainError::InvalidId` for zero.
            pub fn new(raw: u64) -> Result<Self, DomainError> {
                NonZeroU64::new(raw)
                    .map(Self)
                    .ok_or_else(|| DomainError::invalid_id(format!("{} must be positive", $name)))
            }

            pub fn get(self) -> u64 {
                self.0.get()
            }
        }

        impl EntityId for $t {
            fn get(self) -> u64 {
                self.0.get()
            }

            fn from_raw(raw: u64) -> Option<Self> {
                NonZeroU64::new(raw).map(Self)
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl TryFrom<u64> for $t {
            type Error = DomainError;

            fn try_from(value: u64) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<i64> for $t {
            type Error = DomainError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                let raw = u64::try_from(value)
                    .map_err(|_| DomainError::invalid_id(format!("{} must be positive", $name)))?;
                Self::new(raw)
            }
        }

        impl From<$t> for u64 {
            fn from(value: $t) -> Self {
                value.0.get()
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = u64::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Self::new(raw)
            }
        }
    };
}

impl_numeric_id!(ItemId, "ItemId");
impl_numeric_id!(ClientId, "ClientId");
impl_numeric_id!(PickupPointId, "PickupPointId");
impl_numeric_id!(OrderId, "OrderId");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_rejected() {
        assert!(matches!(ItemId::new(0), Err(DomainError::InvalidId(_))));
        assert!(OrderId::from_raw(0).is_none());
    }

    #[test]
    fn negative_is_rejected() {
        assert!(ClientId::try_from(-5i64).is_err());
        assert_eq!(ClientId::try_from(5i64).unwrap().get(), 5);
    }

    #[test]
    fn parses_from_str() {
        let id: PickupPointId = "789".parse().unwrap();
        assert_eq!(id.get(), 789);
        assert!("abc".parse::<PickupPointId>().is_err());
        assert!("0".parse::<PickupPointId>().is_err());
    }

    #[test]
    fn serializes_as_plain_integer() {
        let id = OrderId::new(1000).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "1000");

        let back: OrderId = serde_json::from_str("1000").unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<OrderId>("0").is_err());
    }
}
