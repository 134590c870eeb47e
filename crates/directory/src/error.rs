//! Caller-visible error taxonomy for the membership core.

use thiserror::Error;

use atrium_core::{DomainError, UserId};

use crate::policy::Capability;

/// Every failure a membership/invitation operation can surface.
///
/// These are stable kinds: calling UIs branch on them (e.g. offer
/// "resend invite" on `Expired`, never on `InsufficientPermission`).
/// Business failures are final and must not be retried; only `Storage`
/// covers transient infrastructure trouble.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("organization not found")]
    OrganizationNotFound,

    #[error("invitation not found")]
    InvitationNotFound,

    #[error("membership not found for user {0}")]
    MembershipNotFound(UserId),

    #[error("user not found")]
    UserNotFound,

    /// Caller has no active membership in the target organization. A removed
    /// member resolves to this too; membership history is not access.
    #[error("not a member of this organization")]
    NotAMember,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invitation has expired")]
    Expired,

    #[error("invitation was already accepted")]
    AlreadyAccepted,

    #[error("invitation is bound to a different email identity")]
    EmailMismatch,

    /// Token-lookup failure that deliberately does not distinguish
    /// missing from expired.
    #[error("invitation is invalid or expired")]
    InvalidOrExpired,

    #[error("insufficient permission: missing capability '{0}'")]
    InsufficientPermission(Capability),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<DomainError> for DirectoryError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => Self::Validation(msg),
            DomainError::InvariantViolation(msg) => Self::Validation(msg),
            DomainError::NotFound => Self::OrganizationNotFound,
            DomainError::Conflict(msg) => Self::Conflict(msg),
        }
    }
}
