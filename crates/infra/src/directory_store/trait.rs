use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use atrium_core::{InvitationId, OrgId, UserId};
use atrium_directory::{AuditLogEntry, Invitation, MemberRole, Membership, Organization};

/// Directory store operation error.
///
/// These are **infrastructure errors** (constraint violations, staleness,
/// storage trouble) as opposed to the caller-visible error taxonomy the
/// services translate them into.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("organization not found: {0}")]
    OrganizationMissing(OrgId),

    #[error("organization name already in use: {0}")]
    DuplicateOrganizationName(String),

    #[error("membership already exists for user {user_id} in organization {org_id}")]
    DuplicateMembership { user_id: UserId, org_id: OrgId },

    #[error("a pending invitation already exists for this email in organization {0}")]
    DuplicateInvitation(OrgId),

    #[error("invitation not found")]
    InvitationMissing,

    /// Optimistic check failed: the invitation is no longer pending
    /// (a concurrent request accepted it first).
    #[error("invitation is no longer pending")]
    InvitationStale,

    #[error("membership not found for user {0}")]
    MembershipMissing(UserId),

    #[error("storage failure: {0}")]
    Storage(String),
}

/// Durable CRUD over organizations, memberships, invitations and audit
/// entries, plus the compound operations that are this system's
/// transaction boundary.
///
/// ## Design Principles
///
/// - **No storage assumptions**: works with the in-memory implementation
///   (tests/dev) and the Postgres backend (production).
/// - **Tenant scoping**: every lookup is keyed by organization; no
///   operation can observe another organization's rows.
/// - **Atomic compound writes**: each compound method commits all of its
///   writes or none of them. No caller ever observes a half-applied state
///   (an organization without its owner, a role change without its audit
///   entry).
///
/// ## Uniqueness
///
/// Implementations must enforce:
/// - at most one membership row per `(user_id, org_id)`;
/// - at most one pending (unaccepted) invitation per `(email, org_id)`;
/// - invitation token uniqueness;
/// - organization name uniqueness at creation.
///
/// Concurrent writers racing on any of these constraints must leave
/// exactly one winner; the loser gets the corresponding `StoreError` and
/// can re-read the winner's row.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    // ── reads ────────────────────────────────────────────────────────────

    async fn organization(&self, org_id: OrgId) -> Result<Option<Organization>, StoreError>;

    /// Membership row for `(user_id, org_id)`, regardless of status.
    async fn membership(
        &self,
        user_id: UserId,
        org_id: OrgId,
    ) -> Result<Option<Membership>, StoreError>;

    async fn memberships_of_org(&self, org_id: OrgId) -> Result<Vec<Membership>, StoreError>;

    /// Organizations where the user holds an **active** membership.
    async fn organizations_of_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<(Organization, Membership)>, StoreError>;

    async fn invitation_by_token(&self, token: &str) -> Result<Option<Invitation>, StoreError>;

    /// The pending (unaccepted) invitation for `(email, org_id)`, if any.
    /// At most one exists; it may still turn out to be expired.
    async fn pending_invitation(
        &self,
        email: &str,
        org_id: OrgId,
    ) -> Result<Option<Invitation>, StoreError>;

    async fn invitations_of_org(&self, org_id: OrgId) -> Result<Vec<Invitation>, StoreError>;

    async fn audit_log_of_org(&self, org_id: OrgId) -> Result<Vec<AuditLogEntry>, StoreError>;

    // ── single-record writes ─────────────────────────────────────────────

    async fn update_organization(&self, org: &Organization) -> Result<(), StoreError>;

    async fn update_membership(&self, membership: &Membership) -> Result<(), StoreError>;

    // ── compound writes (atomic) ─────────────────────────────────────────

    /// Insert an organization together with its owner membership.
    ///
    /// Both rows commit or neither does; an organization must never exist
    /// without exactly one owner membership.
    async fn insert_organization_with_owner(
        &self,
        org: &Organization,
        owner: &Membership,
    ) -> Result<(), StoreError>;

    /// Insert a fresh invitation, deleting an expired predecessor in the
    /// same transaction.
    ///
    /// Fails `DuplicateInvitation` if another pending invitation for the
    /// same `(email, org_id)` exists (the caller lost a create race and
    /// should re-read the winner's row).
    async fn replace_invitation(
        &self,
        expired: Option<InvitationId>,
        fresh: &Invitation,
    ) -> Result<(), StoreError>;

    /// Consume a pending invitation: flip `accepted` and insert (or
    /// reactivate) the membership, atomically.
    ///
    /// The flip is optimistic: if the invitation is no longer pending the
    /// whole operation fails `InvitationStale` and the membership write is
    /// not applied. A soft-removed membership row for the same
    /// `(user_id, org_id)` is reactivated in place; a second row is never
    /// inserted.
    async fn accept_invitation(
        &self,
        invitation_id: InvitationId,
        member: &Membership,
    ) -> Result<(), StoreError>;

    /// Apply a batch of role updates and append its audit entry, atomically.
    ///
    /// Every target must exist as an **active** member before any write is
    /// applied; a missing target fails the whole batch with
    /// `MembershipMissing` and nothing is written.
    async fn apply_role_updates(
        &self,
        org_id: OrgId,
        updates: &[(UserId, MemberRole)],
        audit: &AuditLogEntry,
    ) -> Result<(), StoreError>;

    /// Delete an organization and cascade its memberships, invitations and
    /// audit entries.
    async fn delete_organization(&self, org_id: OrgId) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> DirectoryStore for Arc<S>
where
    S: DirectoryStore + ?Sized,
{
    async fn organization(&self, org_id: OrgId) -> Result<Option<Organization>, StoreError> {
        (**self).organization(org_id).await
    }

    async fn membership(
        &self,
        user_id: UserId,
        org_id: OrgId,
    ) -> Result<Option<Membership>, StoreError> {
        (**self).membership(user_id, org_id).await
    }

    async fn memberships_of_org(&self, org_id: OrgId) -> Result<Vec<Membership>, StoreError> {
        (**self).memberships_of_org(org_id).await
    }

    async fn organizations_of_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<(Organization, Membership)>, StoreError> {
        (**self).organizations_of_user(user_id).await
    }

    async fn invitation_by_token(&self, token: &str) -> Result<Option<Invitation>, StoreError> {
        (**self).invitation_by_token(token).await
    }

    async fn pending_invitation(
        &self,
        email: &str,
        org_id: OrgId,
    ) -> Result<Option<Invitation>, StoreError> {
        (**self).pending_invitation(email, org_id).await
    }

    async fn invitations_of_org(&self, org_id: OrgId) -> Result<Vec<Invitation>, StoreError> {
        (**self).invitations_of_org(org_id).await
    }

    async fn audit_log_of_org(&self, org_id: OrgId) -> Result<Vec<AuditLogEntry>, StoreError> {
        (**self).audit_log_of_org(org_id).await
    }

    async fn update_organization(&self, org: &Organization) -> Result<(), StoreError> {
        (**self).update_organization(org).await
    }

    async fn update_membership(&self, membership: &Membership) -> Result<(), StoreError> {
        (**self).update_membership(membership).await
    }

    async fn insert_organization_with_owner(
        &self,
        org: &Organization,
        owner: &Membership,
    ) -> Result<(), StoreError> {
        (**self).insert_organization_with_owner(org, owner).await
    }

    async fn replace_invitation(
        &self,
        expired: Option<InvitationId>,
        fresh: &Invitation,
    ) -> Result<(), StoreError> {
        (**self).replace_invitation(expired, fresh).await
    }

    async fn accept_invitation(
        &self,
        invitation_id: InvitationId,
        member: &Membership,
    ) -> Result<(), StoreError> {
        (**self).accept_invitation(invitation_id, member).await
    }

    async fn apply_role_updates(
        &self,
        org_id: OrgId,
        updates: &[(UserId, MemberRole)],
        audit: &AuditLogEntry,
    ) -> Result<(), StoreError> {
        (**self).apply_role_updates(org_id, updates, audit).await
    }

    async fn delete_organization(&self, org_id: OrgId) -> Result<(), StoreError> {
        (**self).delete_organization(org_id).await
    }
}
