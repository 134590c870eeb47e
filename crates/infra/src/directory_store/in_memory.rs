use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use atrium_core::{InvitationId, OrgId, UserId};
use atrium_directory::{AuditLogEntry, Invitation, MemberRole, Membership, Organization};

use super::r#trait::{DirectoryStore, StoreError};

#[derive(Debug, Default)]
struct DirectoryState {
    organizations: HashMap<OrgId, Organization>,
    memberships: HashMap<(UserId, OrgId), Membership>,
    invitations: HashMap<InvitationId, Invitation>,
    audit_log: Vec<AuditLogEntry>,
}

/// In-memory directory store.
///
/// Intended for tests/dev. Compound operations validate everything first,
/// then mutate under a single write guard, so readers never observe a
/// half-applied state.
#[derive(Debug, Default)]
pub struct InMemoryDirectoryStore {
    state: RwLock<DirectoryState>,
}

impl InMemoryDirectoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Storage("lock poisoned".to_string())
}

#[async_trait]
impl DirectoryStore for InMemoryDirectoryStore {
    async fn organization(&self, org_id: OrgId) -> Result<Option<Organization>, StoreError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state.organizations.get(&org_id).cloned())
    }

    async fn membership(
        &self,
        user_id: UserId,
        org_id: OrgId,
    ) -> Result<Option<Membership>, StoreError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state.memberships.get(&(user_id, org_id)).cloned())
    }

    async fn memberships_of_org(&self, org_id: OrgId) -> Result<Vec<Membership>, StoreError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state
            .memberships
            .values()
            .filter(|m| m.org_id == org_id)
            .cloned()
            .collect())
    }

    async fn organizations_of_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<(Organization, Membership)>, StoreError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state
            .memberships
            .values()
            .filter(|m| m.user_id == user_id && m.is_active())
            .filter_map(|m| {
                state
                    .organizations
                    .get(&m.org_id)
                    .map(|org| (org.clone(), m.clone()))
            })
            .collect())
    }

    async fn invitation_by_token(&self, token: &str) -> Result<Option<Invitation>, StoreError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state
            .invitations
            .values()
            .find(|i| i.token == token)
            .cloned())
    }

    async fn pending_invitation(
        &self,
        email: &str,
        org_id: OrgId,
    ) -> Result<Option<Invitation>, StoreError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state
            .invitations
            .values()
            .find(|i| i.org_id == org_id && !i.accepted && i.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn invitations_of_org(&self, org_id: OrgId) -> Result<Vec<Invitation>, StoreError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state
            .invitations
            .values()
            .filter(|i| i.org_id == org_id)
            .cloned()
            .collect())
    }

    async fn audit_log_of_org(&self, org_id: OrgId) -> Result<Vec<AuditLogEntry>, StoreError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state
            .audit_log
            .iter()
            .filter(|e| e.org_id == org_id)
            .cloned()
            .collect())
    }

    async fn update_organization(&self, org: &Organization) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        if !state.organizations.contains_key(&org.id) {
            return Err(StoreError::OrganizationMissing(org.id));
        }
        state.organizations.insert(org.id, org.clone());
        Ok(())
    }

    async fn update_membership(&self, membership: &Membership) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        let key = (membership.user_id, membership.org_id);
        if !state.memberships.contains_key(&key) {
            return Err(StoreError::MembershipMissing(membership.user_id));
        }
        state.memberships.insert(key, membership.clone());
        Ok(())
    }

    async fn insert_organization_with_owner(
        &self,
        org: &Organization,
        owner: &Membership,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;

        if state.organizations.values().any(|o| o.name == org.name) {
            return Err(StoreError::DuplicateOrganizationName(org.name.clone()));
        }
        let key = (owner.user_id, owner.org_id);
        if state.memberships.contains_key(&key) {
            return Err(StoreError::DuplicateMembership {
                user_id: owner.user_id,
                org_id: owner.org_id,
            });
        }

        state.organizations.insert(org.id, org.clone());
        state.memberships.insert(key, owner.clone());
        Ok(())
    }

    async fn replace_invitation(
        &self,
        expired: Option<InvitationId>,
        fresh: &Invitation,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;

        let pending_elsewhere = state.invitations.values().any(|i| {
            i.org_id == fresh.org_id
                && !i.accepted
                && i.email.eq_ignore_ascii_case(&fresh.email)
                && Some(i.id) != expired
        });
        if pending_elsewhere {
            return Err(StoreError::DuplicateInvitation(fresh.org_id));
        }
        if state.invitations.values().any(|i| i.token == fresh.token) {
            return Err(StoreError::Storage("invitation token collision".to_string()));
        }

        if let Some(expired_id) = expired {
            state.invitations.remove(&expired_id);
        }
        state.invitations.insert(fresh.id, fresh.clone());
        Ok(())
    }

    async fn accept_invitation(
        &self,
        invitation_id: InvitationId,
        member: &Membership,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;

        let invitation = state
            .invitations
            .get(&invitation_id)
            .ok_or(StoreError::InvitationMissing)?;
        if invitation.accepted {
            return Err(StoreError::InvitationStale);
        }

        let key = (member.user_id, member.org_id);
        if state
            .memberships
            .get(&key)
            .is_some_and(|existing| existing.is_active())
        {
            return Err(StoreError::DuplicateMembership {
                user_id: member.user_id,
                org_id: member.org_id,
            });
        }

        // Validation done; mutate under the same guard.
        match state.memberships.get_mut(&key) {
            Some(existing) => {
                existing.reactivate(member.role, member.invited_by, member.joined_at);
            }
            None => {
                state.memberships.insert(key, member.clone());
            }
        }
        if let Some(invitation) = state.invitations.get_mut(&invitation_id) {
            invitation.accepted = true;
        }
        Ok(())
    }

    async fn apply_role_updates(
        &self,
        org_id: OrgId,
        updates: &[(UserId, MemberRole)],
        audit: &AuditLogEntry,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;

        // Validate the whole batch before touching any row.
        for (user_id, _) in updates {
            let exists_active = state
                .memberships
                .get(&(*user_id, org_id))
                .is_some_and(|m| m.is_active());
            if !exists_active {
                return Err(StoreError::MembershipMissing(*user_id));
            }
        }

        for (user_id, role) in updates {
            if let Some(m) = state.memberships.get_mut(&(*user_id, org_id)) {
                m.role = *role;
            }
        }
        state.audit_log.push(audit.clone());
        Ok(())
    }

    async fn delete_organization(&self, org_id: OrgId) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;

        if state.organizations.remove(&org_id).is_none() {
            return Err(StoreError::OrganizationMissing(org_id));
        }
        state.memberships.retain(|(_, org), _| *org != org_id);
        state.invitations.retain(|_, i| i.org_id != org_id);
        state.audit_log.retain(|e| e.org_id != org_id);
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use atrium_directory::{OrganizationAttrs, OrgKind};

    fn org(name: &str, created_by: UserId) -> Organization {
        Organization::new(
            OrganizationAttrs {
                name: name.to_string(),
                description: None,
                logo_image: None,
                started_at: None,
                kind: OrgKind::School,
            },
            created_by,
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn duplicate_organization_name_writes_nothing() {
        let store = InMemoryDirectoryStore::new();
        let now = Utc::now();

        let creator_a = UserId::new();
        let first = org("Riverside School", creator_a);
        let owner_a = Membership::new_owner(creator_a, first.id, now);
        store
            .insert_organization_with_owner(&first, &owner_a)
            .await
            .unwrap();

        let creator_b = UserId::new();
        let second = org("Riverside School", creator_b);
        let owner_b = Membership::new_owner(creator_b, second.id, now);
        let err = store
            .insert_organization_with_owner(&second, &owner_b)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateOrganizationName(_)));

        assert!(store.organization(second.id).await.unwrap().is_none());
        assert!(store
            .membership(creator_b, second.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn accept_is_atomic_and_single_shot() {
        let store = InMemoryDirectoryStore::new();
        let now = Utc::now();

        let owner = UserId::new();
        let o = org("Riverside School", owner);
        store
            .insert_organization_with_owner(&o, &Membership::new_owner(owner, o.id, now))
            .await
            .unwrap();

        let invitation =
            Invitation::issue(o.id, "bob@example.com", None, owner, now).unwrap();
        store.replace_invitation(None, &invitation).await.unwrap();

        let bob = UserId::new();
        let member = Membership::from_invitation(bob, &invitation, now);
        store.accept_invitation(invitation.id, &member).await.unwrap();

        // Second consumption fails stale and must not create another row.
        let mallory = UserId::new();
        let dup = Membership::from_invitation(mallory, &invitation, now);
        let err = store
            .accept_invitation(invitation.id, &dup)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvitationStale));
        assert!(store.membership(mallory, o.id).await.unwrap().is_none());

        let stored = store
            .invitation_by_token(&invitation.token)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.accepted);
    }

    #[tokio::test]
    async fn accept_reactivates_a_removed_member_in_place() {
        let store = InMemoryDirectoryStore::new();
        let now = Utc::now();

        let owner = UserId::new();
        let o = org("Riverside School", owner);
        store
            .insert_organization_with_owner(&o, &Membership::new_owner(owner, o.id, now))
            .await
            .unwrap();

        let bob = UserId::new();
        let first = Invitation::issue(o.id, "bob@example.com", None, owner, now).unwrap();
        store.replace_invitation(None, &first).await.unwrap();
        store
            .accept_invitation(first.id, &Membership::from_invitation(bob, &first, now))
            .await
            .unwrap();

        let mut removed = store.membership(bob, o.id).await.unwrap().unwrap();
        removed.remove(now);
        store.update_membership(&removed).await.unwrap();

        let second = Invitation::issue(
            o.id,
            "bob@example.com",
            Some(MemberRole::Manager),
            owner,
            now,
        )
        .unwrap();
        store.replace_invitation(None, &second).await.unwrap();
        store
            .accept_invitation(second.id, &Membership::from_invitation(bob, &second, now))
            .await
            .unwrap();

        let rows: Vec<_> = store
            .memberships_of_org(o.id)
            .await
            .unwrap()
            .into_iter()
            .filter(|m| m.user_id == bob)
            .collect();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_active());
        assert_eq!(rows[0].role, MemberRole::Manager);
        assert!(rows[0].removed_at.is_none());
    }

    #[tokio::test]
    async fn replace_invitation_rejects_a_second_pending_row() {
        let store = InMemoryDirectoryStore::new();
        let now = Utc::now();

        let owner = UserId::new();
        let o = org("Riverside School", owner);
        store
            .insert_organization_with_owner(&o, &Membership::new_owner(owner, o.id, now))
            .await
            .unwrap();

        let first = Invitation::issue(o.id, "carol@example.com", None, owner, now).unwrap();
        store.replace_invitation(None, &first).await.unwrap();

        let second = Invitation::issue(o.id, "Carol@Example.com", None, owner, now).unwrap();
        let err = store.replace_invitation(None, &second).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateInvitation(_)));

        // Replacing the expired predecessor in the same operation is allowed.
        store
            .replace_invitation(Some(first.id), &second)
            .await
            .unwrap();
        let pending = store
            .pending_invitation("carol@example.com", o.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(pending.id, second.id);
    }

    #[tokio::test]
    async fn role_batch_with_missing_target_writes_nothing() {
        let store = InMemoryDirectoryStore::new();
        let now = Utc::now();

        let owner = UserId::new();
        let o = org("Riverside School", owner);
        store
            .insert_organization_with_owner(&o, &Membership::new_owner(owner, o.id, now))
            .await
            .unwrap();

        let u2 = UserId::new();
        let inv = Invitation::issue(o.id, "u2@example.com", None, owner, now).unwrap();
        store.replace_invitation(None, &inv).await.unwrap();
        store
            .accept_invitation(inv.id, &Membership::from_invitation(u2, &inv, now))
            .await
            .unwrap();

        let ghost = UserId::new();
        let updates = vec![(u2, MemberRole::Admin), (ghost, MemberRole::Manager)];
        let audit = AuditLogEntry::role_change(o.id, owner, &updates, now);
        let err = store
            .apply_role_updates(o.id, &updates, &audit)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MembershipMissing(id) if id == ghost));

        let u2_row = store.membership(u2, o.id).await.unwrap().unwrap();
        assert_eq!(u2_row.role, MemberRole::Member);
        assert!(store.audit_log_of_org(o.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_organization_cascades() {
        let store = InMemoryDirectoryStore::new();
        let now = Utc::now();

        let owner = UserId::new();
        let o = org("Riverside School", owner);
        store
            .insert_organization_with_owner(&o, &Membership::new_owner(owner, o.id, now))
            .await
            .unwrap();
        let inv = Invitation::issue(o.id, "bob@example.com", None, owner, now).unwrap();
        store.replace_invitation(None, &inv).await.unwrap();

        store.delete_organization(o.id).await.unwrap();

        assert!(store.organization(o.id).await.unwrap().is_none());
        assert!(store.membership(owner, o.id).await.unwrap().is_none());
        assert!(store
            .invitation_by_token(&inv.token)
            .await
            .unwrap()
            .is_none());
        assert!(matches!(
            store.delete_organization(o.id).await.unwrap_err(),
            StoreError::OrganizationMissing(_)
        ));
    }
}
