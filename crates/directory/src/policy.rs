//! Role → capability policy.
//!
//! One static table maps each role to the capabilities it grants; every
//! endpoint check is a declarative lookup against it. Adding a role or a
//! capability is a single-table edit here, never a per-endpoint change.
//!
//! The check is pure:
//! - No IO
//! - No panics
//! - Fails closed: a capability absent from the role's set is denied,
//!   including capability names this table has never heard of.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::context::TenantContext;
use crate::error::DirectoryError;
use crate::membership::MemberRole;

/// Capability identifier.
///
/// Capabilities are modeled as opaque strings (e.g. "records:write") so
/// downstream record features can name theirs without this crate changing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capability(Cow<'static, str>);

impl Capability {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Well-known capabilities granted by the table below.
pub mod caps {
    use super::Capability;

    pub const ORG_READ: Capability = Capability::from_static("org:read");
    pub const ORG_UPDATE: Capability = Capability::from_static("org:update");
    pub const ORG_DELETE: Capability = Capability::from_static("org:delete");

    pub const MEMBERS_READ: Capability = Capability::from_static("members:read");
    pub const MEMBERS_MANAGE_ROLES: Capability = Capability::from_static("members:manage-roles");
    pub const MEMBERS_REMOVE: Capability = Capability::from_static("members:remove");

    pub const INVITES_CREATE: Capability = Capability::from_static("invites:create");
    pub const INVITES_READ: Capability = Capability::from_static("invites:read");

    pub const AUDIT_READ: Capability = Capability::from_static("audit:read");

    /// Tenant-scoped record features (courses, students, schedules, ...).
    pub const RECORDS_READ: Capability = Capability::from_static("records:read");
    pub const RECORDS_WRITE: Capability = Capability::from_static("records:write");

    pub const BILLING_READ: Capability = Capability::from_static("billing:read");
    pub const BILLING_MANAGE: Capability = Capability::from_static("billing:manage");
}

use caps::*;

const MEMBER_CAPS: &[Capability] = &[ORG_READ, RECORDS_READ];

const OFFICE_STAFF_CAPS: &[Capability] = &[ORG_READ, RECORDS_READ, RECORDS_WRITE, INVITES_READ];

const ACCOUNTANT_CAPS: &[Capability] = &[
    ORG_READ,
    RECORDS_READ,
    BILLING_READ,
    BILLING_MANAGE,
    AUDIT_READ,
];

const MANAGER_CAPS: &[Capability] = &[
    ORG_READ,
    RECORDS_READ,
    RECORDS_WRITE,
    MEMBERS_READ,
    INVITES_READ,
    INVITES_CREATE,
];

const ADMIN_CAPS: &[Capability] = &[
    ORG_READ,
    ORG_UPDATE,
    RECORDS_READ,
    RECORDS_WRITE,
    MEMBERS_READ,
    MEMBERS_MANAGE_ROLES,
    MEMBERS_REMOVE,
    INVITES_READ,
    INVITES_CREATE,
    AUDIT_READ,
    BILLING_READ,
    BILLING_MANAGE,
];

const OWNER_CAPS: &[Capability] = &[
    ORG_READ,
    ORG_UPDATE,
    ORG_DELETE,
    RECORDS_READ,
    RECORDS_WRITE,
    MEMBERS_READ,
    MEMBERS_MANAGE_ROLES,
    MEMBERS_REMOVE,
    INVITES_READ,
    INVITES_CREATE,
    AUDIT_READ,
    BILLING_READ,
    BILLING_MANAGE,
];

/// The full capability set granted by a role.
///
/// Owner ⊇ Admin ⊇ Manager ⊇ Member; Accountant and OfficeStaff carry their
/// own slices on top of Member's.
pub fn role_capabilities(role: MemberRole) -> &'static [Capability] {
    match role {
        MemberRole::Owner => OWNER_CAPS,
        MemberRole::Admin => ADMIN_CAPS,
        MemberRole::Manager => MANAGER_CAPS,
        MemberRole::Member => MEMBER_CAPS,
        MemberRole::Accountant => ACCOUNTANT_CAPS,
        MemberRole::OfficeStaff => OFFICE_STAFF_CAPS,
    }
}

/// Check a resolved tenant context against a required capability.
///
/// Never downgrades: on denial the caller gets
/// `InsufficientPermission` naming the missing capability.
pub fn require_capability(
    ctx: &TenantContext,
    required: &Capability,
) -> Result<(), DirectoryError> {
    let granted = role_capabilities(ctx.role());
    if granted.iter().any(|c| c.as_str() == required.as_str()) {
        Ok(())
    } else {
        Err(DirectoryError::InsufficientPermission(required.clone()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use atrium_core::{OrgId, UserId};
    use proptest::prelude::*;

    fn ctx(role: MemberRole) -> TenantContext {
        TenantContext::new(OrgId::new(), UserId::new(), role)
    }

    fn contains_all(superset: &[Capability], subset: &[Capability]) -> bool {
        subset
            .iter()
            .all(|c| superset.iter().any(|s| s.as_str() == c.as_str()))
    }

    #[test]
    fn role_hierarchy_is_monotone() {
        assert!(contains_all(OWNER_CAPS, ADMIN_CAPS));
        assert!(contains_all(ADMIN_CAPS, MANAGER_CAPS));
        assert!(contains_all(MANAGER_CAPS, MEMBER_CAPS));
        assert!(contains_all(ACCOUNTANT_CAPS, MEMBER_CAPS));
        assert!(contains_all(OFFICE_STAFF_CAPS, MEMBER_CAPS));
    }

    #[test]
    fn owner_alone_may_delete_the_organization() {
        assert!(require_capability(&ctx(MemberRole::Owner), &ORG_DELETE).is_ok());
        for role in [
            MemberRole::Admin,
            MemberRole::Manager,
            MemberRole::Member,
            MemberRole::Accountant,
            MemberRole::OfficeStaff,
        ] {
            assert_eq!(
                require_capability(&ctx(role), &ORG_DELETE),
                Err(DirectoryError::InsufficientPermission(ORG_DELETE)),
            );
        }
    }

    #[test]
    fn member_cannot_manage_roles() {
        assert!(require_capability(&ctx(MemberRole::Member), &MEMBERS_MANAGE_ROLES).is_err());
        assert!(require_capability(&ctx(MemberRole::Admin), &MEMBERS_MANAGE_ROLES).is_ok());
    }

    #[test]
    fn unknown_capability_is_denied_for_every_role() {
        let unknown = Capability::new("reactor:scram");
        for role in [
            MemberRole::Owner,
            MemberRole::Admin,
            MemberRole::Manager,
            MemberRole::Member,
            MemberRole::Accountant,
            MemberRole::OfficeStaff,
        ] {
            assert!(require_capability(&ctx(role), &unknown).is_err());
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: any capability a role in the Owner/Admin/Manager/Member
        /// chain grants is also granted by every role above it.
        #[test]
        fn grants_never_shrink_up_the_chain(name in "[a-z]{1,12}:[a-z-]{1,16}") {
            let cap = Capability::new(name);
            let chain = [
                MemberRole::Member,
                MemberRole::Manager,
                MemberRole::Admin,
                MemberRole::Owner,
            ];
            let mut granted_below = false;
            for role in chain {
                let granted = require_capability(&ctx(role), &cap).is_ok();
                prop_assert!(granted || !granted_below);
                granted_below = granted;
            }
        }
    }
}
