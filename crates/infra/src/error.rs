//! Workflow error model.
//!
//! Every operation of the order workflow fails with a [`WorkflowError`]. The
//! HTTP adapter maps [`ErrorKind`] to status codes; the compensation path maps
//! the error to a [`CancelReason`].

use thiserror::Error;

use rentpoint_core::{ClientId, DomainError, ItemId, OrderId, PickupPointId};
use rentpoint_rental::CancelReason;

use crate::store::StoreError;

pub type WorkflowResult<T> = Result<T, WorkflowError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("client {0} not found")]
    ClientNotFound(ClientId),

    #[error("item {0} not found")]
    ItemNotFound(ItemId),

    #[error("pickup point {0} not found")]
    PickupPointNotFound(PickupPointId),

    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    #[error("item {item_id} is at pickup point {actual}, not {requested}")]
    ItemNotInLocation {
        item_id: ItemId,
        requested: PickupPointId,
        actual: PickupPointId,
    },

    #[error("item {0} is not available")]
    ItemNotAvailable(ItemId),

    #[error("pickup point {0} is not active")]
    PickupPointInactive(PickupPointId),

    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Coarse classification used for retry decisions and transport mapping.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Validation,
    InvalidTransition,
    Infrastructure,
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::Validation(_) => ErrorKind::Validation,
            WorkflowError::ClientNotFound(_)
            | WorkflowError::ItemNotFound(_)
            | WorkflowError::PickupPointNotFound(_)
            | WorkflowError::OrderNotFound(_) => ErrorKind::NotFound,
            WorkflowError::ItemNotInLocation { .. }
            | WorkflowError::ItemNotAvailable(_)
            | WorkflowError::PickupPointInactive(_) => ErrorKind::Conflict,
            WorkflowError::InvalidTransition(_) => ErrorKind::InvalidTransition,
            WorkflowError::Store(e) if e.is_not_found() => ErrorKind::NotFound,
            WorkflowError::Store(_) => ErrorKind::Infrastructure,
        }
    }

    /// Only infrastructure failures may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Infrastructure
    }

    /// Reason recorded when this error aborts an order that already exists.
    pub fn cancel_reason(&self) -> CancelReason {
        match self {
            WorkflowError::ItemNotFound(_) => CancelReason::ItemNotFound,
            WorkflowError::ItemNotAvailable(_) => CancelReason::ItemNotAvailable,
            WorkflowError::ItemNotInLocation { .. } => CancelReason::ItemNotInLocation,
            WorkflowError::PickupPointInactive(_) => CancelReason::PickupPointInactive,
            _ => CancelReason::Other,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            WorkflowError::Validation(_) => "validation_error",
            WorkflowError::ClientNotFound(_) => "client_not_found",
            WorkflowError::ItemNotFound(_) => "item_not_found",
            WorkflowError::PickupPointNotFound(_) => "pickup_point_not_found",
            WorkflowError::OrderNotFound(_) => "order_not_found",
            WorkflowError::ItemNotInLocation { .. } => "item_not_in_location",
            WorkflowError::ItemNotAvailable(_) => "item_not_available",
            WorkflowError::PickupPointInactive(_) => "pickup_point_inactive",
            WorkflowError::InvalidTransition(_) => "invalid_transition",
            WorkflowError::Store(StoreError::NotFound { .. }) => "not_found",
            WorkflowError::Store(_) => "store_unavailable",
        }
    }
}

impl From<DomainError> for WorkflowError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => WorkflowError::Validation(msg),
            DomainError::InvalidTransition(msg) => WorkflowError::InvalidTransition(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Table;

    #[test]
    fn conflicts_map_to_cancel_reasons() {
        let item = ItemId::new(456).unwrap();
        let err = WorkflowError::ItemNotInLocation {
            item_id: item,
            requested: PickupPointId::new(123).unwrap(),
            actual: PickupPointId::new(789).unwrap(),
        };
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.cancel_reason(), CancelReason::ItemNotInLocation);
        assert_eq!(
            WorkflowError::ItemNotAvailable(item).cancel_reason(),
            CancelReason::ItemNotAvailable
        );
    }

    #[test]
    fn store_failures_are_retryable_infrastructure() {
        let err = WorkflowError::from(StoreError::Unavailable("down".into()));
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        assert!(err.is_retryable());
        assert_eq!(err.cancel_reason(), CancelReason::Other);

        let err = WorkflowError::from(StoreError::IdsExhausted {
            table: Table::Orders,
            attempts: 3,
        });
        assert!(err.is_retryable());
    }

    #[test]
    fn domain_errors_keep_their_class() {
        let err = WorkflowError::from(DomainError::validation("bad hours"));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(!err.is_retryable());

        let err = WorkflowError::from(DomainError::invalid_transition("terminal"));
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    }
}
