//! Invitation notification contract.
//!
//! Delivery mechanics (email provider, templates, retries) live outside this
//! core. Issuing an invitation and delivering the notification are
//! decoupled: a delivery failure never rolls back the invitation.

use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Best-effort invitation notification sender.
pub trait InvitationNotifier: Send + Sync {
    fn notify(&self, email: &str, token: &str, organization_name: &str) -> Result<(), NotifyError>;
}

impl<N> InvitationNotifier for Arc<N>
where
    N: InvitationNotifier + ?Sized,
{
    fn notify(&self, email: &str, token: &str, organization_name: &str) -> Result<(), NotifyError> {
        (**self).notify(email, token, organization_name)
    }
}

/// Default wiring: log the notification instead of delivering it.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl InvitationNotifier for TracingNotifier {
    fn notify(&self, email: &str, token: &str, organization_name: &str) -> Result<(), NotifyError> {
        tracing::info!(
            email,
            token,
            organization = organization_name,
            "invitation issued"
        );
        Ok(())
    }
}
