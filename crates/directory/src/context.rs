//! Tenant context: the per-request authorization boundary object.

use atrium_core::{OrgId, UserId};

use crate::membership::MemberRole;

/// Tenant context established once per request.
///
/// States *which organization* the caller is acting within and the role
/// granted there. Immutable; every tenant-scoped feature receives this and
/// must include `organization_id` in every query predicate. There is no
/// process-wide "current organization"; requests are concurrent and each
/// names its target explicitly.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TenantContext {
    organization_id: OrgId,
    caller_id: UserId,
    role: MemberRole,
}

impl TenantContext {
    pub fn new(organization_id: OrgId, caller_id: UserId, role: MemberRole) -> Self {
        Self {
            organization_id,
            caller_id,
            role,
        }
    }

    pub fn organization_id(&self) -> OrgId {
        self.organization_id
    }

    pub fn caller_id(&self) -> UserId {
        self.caller_id
    }

    pub fn role(&self) -> MemberRole {
        self.role
    }
}
