//! Organization and membership management.

use chrono::{DateTime, Utc};

use atrium_core::UserId;
use atrium_directory::{
    AuditLogEntry, DirectoryError, MemberRole, Membership, Organization, OrganizationAttrs,
    OrganizationPatch, TenantContext, caps, require_capability,
};

use crate::directory_store::{DirectoryStore, StoreError};

use super::store_failure;

/// Organization lifecycle and member administration against a directory
/// store.
pub struct MembershipService<S> {
    store: S,
}

impl<S> MembershipService<S>
where
    S: DirectoryStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Create an organization with its creator as the Owner.
    ///
    /// Both rows commit together; an organization never exists without its
    /// owner membership.
    pub async fn create_organization(
        &self,
        creator_id: UserId,
        attrs: OrganizationAttrs,
        now: DateTime<Utc>,
    ) -> Result<Organization, DirectoryError> {
        let org = Organization::new(attrs, creator_id, now)?;
        let owner = Membership::new_owner(creator_id, org.id, now);

        match self.store.insert_organization_with_owner(&org, &owner).await {
            Ok(()) => Ok(org),
            Err(StoreError::DuplicateOrganizationName(name)) => Err(DirectoryError::Conflict(
                format!("organization name already in use: {name}"),
            )),
            Err(e) => Err(store_failure(e)),
        }
    }

    pub async fn get_organization(
        &self,
        ctx: &TenantContext,
    ) -> Result<Organization, DirectoryError> {
        require_capability(ctx, &caps::ORG_READ)?;
        self.store
            .organization(ctx.organization_id())
            .await
            .map_err(store_failure)?
            .ok_or(DirectoryError::OrganizationNotFound)
    }

    /// Apply a partial update to the organization.
    pub async fn update_organization(
        &self,
        ctx: &TenantContext,
        patch: OrganizationPatch,
    ) -> Result<Organization, DirectoryError> {
        require_capability(ctx, &caps::ORG_UPDATE)?;

        let mut org = self
            .store
            .organization(ctx.organization_id())
            .await
            .map_err(store_failure)?
            .ok_or(DirectoryError::OrganizationNotFound)?;

        org.apply_patch(patch)?;
        self.store
            .update_organization(&org)
            .await
            .map_err(store_failure)?;
        Ok(org)
    }

    /// Delete the organization; memberships, invitations and audit entries
    /// cascade.
    pub async fn delete_organization(&self, ctx: &TenantContext) -> Result<(), DirectoryError> {
        require_capability(ctx, &caps::ORG_DELETE)?;
        self.store
            .delete_organization(ctx.organization_id())
            .await
            .map_err(store_failure)
    }

    /// Apply a batch of role changes and record one audit entry, atomically.
    ///
    /// Strictly all-or-nothing: if any target does not exist as an active
    /// member, nothing is written and the error names the missing user.
    pub async fn bulk_update_roles(
        &self,
        ctx: &TenantContext,
        updates: Vec<(UserId, MemberRole)>,
        now: DateTime<Utc>,
    ) -> Result<AuditLogEntry, DirectoryError> {
        require_capability(ctx, &caps::MEMBERS_MANAGE_ROLES)?;

        if updates.is_empty() {
            return Err(DirectoryError::Validation("no role updates given".to_string()));
        }

        let audit = AuditLogEntry::role_change(ctx.organization_id(), ctx.caller_id(), &updates, now);
        match self
            .store
            .apply_role_updates(ctx.organization_id(), &updates, &audit)
            .await
        {
            Ok(()) => Ok(audit),
            Err(StoreError::MembershipMissing(user_id)) => {
                Err(DirectoryError::MembershipNotFound(user_id))
            }
            Err(e) => Err(store_failure(e)),
        }
    }

    /// Soft-remove a member: the row is retained with `Removed` status and
    /// access is revoked immediately.
    ///
    /// Removing an already-removed member is a no-op success. The only
    /// active Owner cannot be removed; an organization keeps an owner.
    pub async fn remove_member(
        &self,
        ctx: &TenantContext,
        target: UserId,
        now: DateTime<Utc>,
    ) -> Result<(), DirectoryError> {
        require_capability(ctx, &caps::MEMBERS_REMOVE)?;

        let org_id = ctx.organization_id();
        let mut membership = self
            .store
            .membership(target, org_id)
            .await
            .map_err(store_failure)?
            .ok_or(DirectoryError::MembershipNotFound(target))?;

        if !membership.is_active() {
            return Ok(());
        }

        if membership.role == MemberRole::Owner {
            let active_owners = self
                .store
                .memberships_of_org(org_id)
                .await
                .map_err(store_failure)?
                .iter()
                .filter(|m| m.is_active() && m.role == MemberRole::Owner)
                .count();
            if active_owners <= 1 {
                return Err(DirectoryError::Validation(
                    "cannot remove the only active owner".to_string(),
                ));
            }
        }

        membership.remove(now);
        self.store
            .update_membership(&membership)
            .await
            .map_err(store_failure)
    }

    /// Members of the caller's organization (active and removed; callers
    /// filter by status as needed).
    pub async fn list_members(&self, ctx: &TenantContext) -> Result<Vec<Membership>, DirectoryError> {
        require_capability(ctx, &caps::MEMBERS_READ)?;
        self.store
            .memberships_of_org(ctx.organization_id())
            .await
            .map_err(store_failure)
    }

    /// Organizations where the user holds an active membership, for
    /// org-switcher screens. Needs no tenant context: the caller asks about
    /// themselves.
    pub async fn organizations_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<(Organization, Membership)>, DirectoryError> {
        self.store
            .organizations_of_user(user_id)
            .await
            .map_err(store_failure)
    }

    /// The organization's role-change audit trail.
    pub async fn audit_log(&self, ctx: &TenantContext) -> Result<Vec<AuditLogEntry>, DirectoryError> {
        require_capability(ctx, &caps::AUDIT_READ)?;
        self.store
            .audit_log_of_org(ctx.organization_id())
            .await
            .map_err(store_failure)
    }
}
