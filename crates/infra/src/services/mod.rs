//! Tenant services: context resolution, invitations, memberships.
//!
//! Services are generic over the [`DirectoryStore`](crate::DirectoryStore)
//! backend and translate store-level errors into the caller-visible
//! taxonomy at this boundary. Business failures are final; only storage
//! trouble surfaces as `DirectoryError::Storage`.

pub mod invitations;
pub mod memberships;
pub mod resolver;

pub use invitations::InvitationService;
pub use memberships::MembershipService;
pub use resolver::resolve_tenant_context;

use atrium_directory::DirectoryError;

use crate::directory_store::StoreError;

/// Fallback mapping for store errors a service did not handle specifically.
pub(crate) fn store_failure(err: StoreError) -> DirectoryError {
    match err {
        StoreError::OrganizationMissing(_) => DirectoryError::OrganizationNotFound,
        StoreError::MembershipMissing(user_id) => DirectoryError::MembershipNotFound(user_id),
        StoreError::InvitationMissing => DirectoryError::InvitationNotFound,
        other => DirectoryError::Storage(other.to_string()),
    }
}
