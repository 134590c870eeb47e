//! Invitation lifecycle: issue, look up, accept.
//!
//! State machine: `Pending --accept--> Accepted` (terminal) and
//! `Pending --expire--> Expired` (terminal, detected lazily on read and
//! physically removed when a fresh invitation replaces the row). There is
//! no revoke transition.

use chrono::{DateTime, Utc};

use atrium_core::{OrgId, UserId};
use atrium_directory::{
    DirectoryError, Invitation, InvitationNotifier, MemberRole, Membership, TenantContext, caps,
    require_capability,
};

use crate::directory_store::{DirectoryStore, StoreError};

use super::store_failure;

/// Issues and consumes invitations against a directory store.
pub struct InvitationService<S, N> {
    store: S,
    notifier: N,
}

impl<S, N> InvitationService<S, N>
where
    S: DirectoryStore,
    N: InvitationNotifier,
{
    pub fn new(store: S, notifier: N) -> Self {
        Self { store, notifier }
    }

    /// Issue an invitation for `email` to join the caller's organization.
    ///
    /// Idempotent within the validity window: if a live invitation already
    /// exists for `(email, org)` it is returned unchanged: no duplicate
    /// row, though the notification may fire again. An expired predecessor
    /// is deleted in the same transaction that inserts the fresh row.
    pub async fn create(
        &self,
        ctx: &TenantContext,
        email: &str,
        role: Option<MemberRole>,
        now: DateTime<Utc>,
    ) -> Result<Invitation, DirectoryError> {
        require_capability(ctx, &caps::INVITES_CREATE)?;

        let org_id = ctx.organization_id();
        let org = self
            .store
            .organization(org_id)
            .await
            .map_err(store_failure)?
            .ok_or(DirectoryError::OrganizationNotFound)?;

        let mut expired_id = None;
        if let Some(existing) = self
            .store
            .pending_invitation(email.trim(), org_id)
            .await
            .map_err(store_failure)?
        {
            if existing.is_live(now) {
                self.send(&existing, &org.name);
                return Ok(existing);
            }
            expired_id = Some(existing.id);
        }

        let fresh = Invitation::issue(org_id, email, role, ctx.caller_id(), now)?;
        match self.store.replace_invitation(expired_id, &fresh).await {
            Ok(()) => {
                self.send(&fresh, &org.name);
                Ok(fresh)
            }
            // Lost a concurrent create race: surface the winner's row.
            Err(StoreError::DuplicateInvitation(_)) => self
                .store
                .pending_invitation(email.trim(), org_id)
                .await
                .map_err(store_failure)?
                .ok_or_else(|| {
                    DirectoryError::Conflict("invitation changed concurrently".to_string())
                }),
            Err(e) => Err(store_failure(e)),
        }
    }

    /// Accept an invitation by token and join its organization.
    ///
    /// The invitation is bound to the invited email identity and consumed
    /// exactly once; of two concurrent accepts, one wins and the other
    /// fails `AlreadyAccepted`. Returns the organization id so the caller
    /// can switch tenant context.
    pub async fn accept(
        &self,
        caller_id: UserId,
        caller_email: &str,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<OrgId, DirectoryError> {
        if caller_email.trim().is_empty() {
            return Err(DirectoryError::UserNotFound);
        }

        let invitation = self
            .store
            .invitation_by_token(token)
            .await
            .map_err(store_failure)?
            .ok_or(DirectoryError::InvitationNotFound)?;

        if invitation.is_expired(now) {
            return Err(DirectoryError::Expired);
        }
        if invitation.accepted {
            return Err(DirectoryError::AlreadyAccepted);
        }
        if !invitation.matches_email(caller_email) {
            return Err(DirectoryError::EmailMismatch);
        }

        let member = Membership::from_invitation(caller_id, &invitation, now);
        match self.store.accept_invitation(invitation.id, &member).await {
            Ok(()) => Ok(invitation.org_id),
            Err(StoreError::InvitationStale) => Err(DirectoryError::AlreadyAccepted),
            Err(StoreError::DuplicateMembership { .. }) => Err(DirectoryError::Conflict(
                "already an active member of this organization".to_string(),
            )),
            Err(e) => Err(store_failure(e)),
        }
    }

    /// Read-only token lookup for "view your invite" screens.
    ///
    /// Returns the invitation together with the organization name. Missing
    /// and expired tokens are indistinguishable (`InvalidOrExpired`); an
    /// accepted-but-unexpired token still resolves here, but acceptance
    /// itself will refuse it.
    pub async fn get_by_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<(Invitation, String), DirectoryError> {
        let invitation = self
            .store
            .invitation_by_token(token)
            .await
            .map_err(store_failure)?
            .ok_or(DirectoryError::InvalidOrExpired)?;

        if invitation.is_expired(now) {
            return Err(DirectoryError::InvalidOrExpired);
        }

        let org = self
            .store
            .organization(invitation.org_id)
            .await
            .map_err(store_failure)?
            .ok_or(DirectoryError::InvalidOrExpired)?;

        Ok((invitation, org.name))
    }

    /// Invitations of the caller's organization, for admin screens.
    pub async fn list_for_org(
        &self,
        ctx: &TenantContext,
    ) -> Result<Vec<Invitation>, DirectoryError> {
        require_capability(ctx, &caps::INVITES_READ)?;
        self.store
            .invitations_of_org(ctx.organization_id())
            .await
            .map_err(store_failure)
    }

    fn send(&self, invitation: &Invitation, org_name: &str) {
        if let Err(err) = self
            .notifier
            .notify(&invitation.email, &invitation.token, org_name)
        {
            tracing::warn!(
                email = %invitation.email,
                organization = %org_name,
                error = %err,
                "invitation notification failed"
            );
        }
    }
}
