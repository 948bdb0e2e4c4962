//! Admin notification seam.

use crate::store::UserId;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Notification failed: {0}")]
pub struct NotifyError(pub String);

/// Best-effort operator notifications.
///
/// Failures must never abort the flow that triggered them: callers log
/// the error and move on.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user: UserId, text: &str) -> Result<(), NotifyError>;
}

/// Notifier that drops everything. Used when no admin id is configured.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _user: UserId, _text: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}
