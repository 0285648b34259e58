//! Client notification channel (cancellation SMS).
//!
//! Notices are sent synchronously from the cancellation path, after the order
//! state change is stored. Delivery is best-effort: a failing notifier is
//! logged by the caller and never undoes the cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use rentpoint_core::{ClientId, OrderId};
use rentpoint_rental::CancelReason;

/// What the client is told when their order is cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationNotice {
    pub client_id: ClientId,
    pub order_id: OrderId,
    pub reason: CancelReason,
    pub details: Option<String>,
    /// Human-readable message body.
    pub text: String,
    /// Phone number, or email when no phone is on file.
    pub contact: Option<String>,
}

impl CancellationNotice {
    pub fn new(
        client_id: ClientId,
        order_id: OrderId,
        reason: CancelReason,
        details: Option<String>,
        contact: Option<String>,
    ) -> Self {
        Self {
            client_id,
            order_id,
            reason,
            details,
            text: reason.client_message(order_id),
            contact,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("no contact details on file for client {0}")]
    NoContact(ClientId),

    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

/// Sends cancellation notices to clients.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &CancellationNotice) -> Result<(), NotifyError>;
}

impl<N> Notifier for Arc<N>
where
    N: Notifier + ?Sized,
{
    fn notify(&self, notice: &CancellationNotice) -> Result<(), NotifyError> {
        (**self).notify(notice)
    }
}

/// Notifier that writes the SMS it would send to the log.
///
/// Stand-in for the SMS gateway in dev deployments.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &CancellationNotice) -> Result<(), NotifyError> {
        let to = notice
            .contact
            .as_deref()
            .ok_or(NotifyError::NoContact(notice.client_id))?;

        info!(
            client_id = %notice.client_id,
            order_id = %notice.order_id,
            reason = %notice.reason,
            to,
            message = %notice.text,
            "cancellation sms sent"
        );
        Ok(())
    }
}

/// In-memory notifier that keeps every notice it receives.
///
/// Can be switched into a failing mode to exercise best-effort delivery.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<CancellationNotice>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every delivery fails (notices are still recorded).
    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.set_failing(true);
        notifier
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn notices(&self) -> Vec<CancellationNotice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self) -> usize {
        self.notices.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: &CancellationNotice) -> Result<(), NotifyError> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice.clone());

        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Delivery("sms gateway unavailable".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice(contact: Option<&str>) -> CancellationNotice {
        CancellationNotice::new(
            ClientId::new(123).unwrap(),
            OrderId::new(1000).unwrap(),
            CancelReason::ItemNotInLocation,
            None,
            contact.map(str::to_string),
        )
    }

    #[test]
    fn notice_text_follows_reason() {
        let n = notice(Some("+79161234567"));
        assert!(n.text.contains("1000"));
        assert!(n.text.contains("not at the selected pickup point"));
    }

    #[test]
    fn log_notifier_requires_contact() {
        assert!(LogNotifier.notify(&notice(Some("+79161234567"))).is_ok());
        assert_eq!(
            LogNotifier.notify(&notice(None)),
            Err(NotifyError::NoContact(ClientId::new(123).unwrap()))
        );
    }

    #[test]
    fn recording_notifier_records_even_when_failing() {
        let notifier = RecordingNotifier::failing();
        assert!(notifier.notify(&notice(Some("x"))).is_err());
        assert_eq!(notifier.count(), 1);

        notifier.set_failing(false);
        assert!(notifier.notify(&notice(Some("x"))).is_ok());
        assert_eq!(notifier.notices().len(), 2);
    }
}
