//! Tenant context resolution.

use atrium_core::{OrgId, UserId};
use atrium_directory::{DirectoryError, TenantContext};

use crate::directory_store::DirectoryStore;

use super::store_failure;

/// Resolve the caller's tenant context for one explicitly named
/// organization.
///
/// Looks up the membership for `(caller_id, org_id)`. Absent row and
/// soft-removed row both resolve to `NotAMember`; removal revokes access
/// immediately even though the membership history is retained. There is no
/// implicit organization inference across memberships; callers name their
/// target, always.
pub async fn resolve_tenant_context<S: DirectoryStore>(
    store: &S,
    caller_id: UserId,
    org_id: OrgId,
) -> Result<TenantContext, DirectoryError> {
    let membership = store
        .membership(caller_id, org_id)
        .await
        .map_err(store_failure)?;

    match membership {
        Some(m) if m.is_active() => Ok(TenantContext::new(org_id, caller_id, m.role)),
        _ => Err(DirectoryError::NotAMember),
    }
}
