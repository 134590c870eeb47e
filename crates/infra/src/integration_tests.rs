//! Scenario tests for the full membership pipeline.
//!
//! Services → DirectoryStore (in-memory backend).
//!
//! Verifies:
//! - Atomic multi-record operations never leave half-applied state
//! - Invitation lifecycle (idempotent create, expiry, single accept)
//! - Soft removal revokes access immediately while retaining history
//! - Role batches are all-or-nothing and audited

use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};

use atrium_core::UserId;
use atrium_directory::{
    DirectoryError, InvitationNotifier, MemberRole, MemberStatus, NotifyError, OrgKind,
    Organization, OrganizationAttrs, TenantContext,
};

use crate::directory_store::{DirectoryStore, InMemoryDirectoryStore};
use crate::services::{InvitationService, MembershipService, resolve_tenant_context};

/// Records notifications; can be told to fail delivery.
#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, String, String)>>,
    fail: Mutex<bool>,
}

impl RecordingNotifier {
    fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

impl InvitationNotifier for RecordingNotifier {
    fn notify(&self, email: &str, token: &str, organization_name: &str) -> Result<(), NotifyError> {
        if *self.fail.lock().unwrap() {
            return Err(NotifyError("smtp unreachable".to_string()));
        }
        self.sent.lock().unwrap().push((
            email.to_string(),
            token.to_string(),
            organization_name.to_string(),
        ));
        Ok(())
    }
}

type Store = Arc<InMemoryDirectoryStore>;

struct Fixture {
    store: Store,
    memberships: MembershipService<Store>,
    invitations: InvitationService<Store, Arc<RecordingNotifier>>,
    notifier: Arc<RecordingNotifier>,
}

fn fixture() -> Fixture {
    let store: Store = Arc::new(InMemoryDirectoryStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    Fixture {
        memberships: MembershipService::new(store.clone()),
        invitations: InvitationService::new(store.clone(), notifier.clone()),
        store,
        notifier,
    }
}

fn attrs(name: &str) -> OrganizationAttrs {
    OrganizationAttrs {
        name: name.to_string(),
        description: None,
        logo_image: None,
        started_at: None,
        kind: OrgKind::School,
    }
}

async fn ctx_of(store: &Store, user: UserId, org: &Organization) -> TenantContext {
    resolve_tenant_context(store, user, org.id).await.unwrap()
}

#[tokio::test]
async fn create_organization_installs_its_owner() {
    let fx = fixture();
    let now = Utc::now();
    let u1 = UserId::new();

    let org = fx
        .memberships
        .create_organization(u1, attrs("Riverside School"), now)
        .await
        .unwrap();

    let owner = fx.store.membership(u1, org.id).await.unwrap().unwrap();
    assert_eq!(owner.role, MemberRole::Owner);
    assert_eq!(owner.status, MemberStatus::Active);

    let ctx = ctx_of(&fx.store, u1, &org).await;
    assert_eq!(ctx.role(), MemberRole::Owner);
}

#[tokio::test]
async fn duplicate_name_fails_whole_creation() {
    let fx = fixture();
    let now = Utc::now();

    fx.memberships
        .create_organization(UserId::new(), attrs("Riverside School"), now)
        .await
        .unwrap();

    let u2 = UserId::new();
    let err = fx
        .memberships
        .create_organization(u2, attrs("Riverside School"), now)
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::Conflict(_)));

    // The failed creation left no stray membership behind.
    assert!(fx
        .store
        .organizations_of_user(u2)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn riverside_invitation_flow() {
    let fx = fixture();
    let now = Utc::now();
    let u1 = UserId::new();

    let org = fx
        .memberships
        .create_organization(u1, attrs("Riverside School"), now)
        .await
        .unwrap();
    let ctx = ctx_of(&fx.store, u1, &org).await;

    let invitation = fx
        .invitations
        .create(&ctx, "bob@example.com", Some(MemberRole::Member), now)
        .await
        .unwrap();
    assert!(!invitation.accepted);
    assert_eq!(invitation.expires_at, now + Duration::days(7));
    assert_eq!(fx.notifier.sent_count(), 1);

    let bob = UserId::new();
    let joined_org = fx
        .invitations
        .accept(bob, "bob@example.com", &invitation.token, now)
        .await
        .unwrap();
    assert_eq!(joined_org, org.id);

    let membership = fx.store.membership(bob, org.id).await.unwrap().unwrap();
    assert_eq!(membership.role, MemberRole::Member);
    assert_eq!(membership.status, MemberStatus::Active);
    assert_eq!(membership.invited_by, Some(u1));

    // Replay is refused.
    let err = fx
        .invitations
        .accept(bob, "bob@example.com", &invitation.token, now)
        .await
        .unwrap_err();
    assert_eq!(err, DirectoryError::AlreadyAccepted);
}

#[tokio::test]
async fn create_invitation_is_idempotent_within_window() {
    let fx = fixture();
    let now = Utc::now();
    let u1 = UserId::new();

    let org = fx
        .memberships
        .create_organization(u1, attrs("Riverside School"), now)
        .await
        .unwrap();
    let ctx = ctx_of(&fx.store, u1, &org).await;

    let first = fx
        .invitations
        .create(&ctx, "carol@example.com", None, now)
        .await
        .unwrap();
    let second = fx
        .invitations
        .create(&ctx, "Carol@Example.com", None, now + Duration::days(1))
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.token, second.token);
    // The notification side effect may fire again; the row may not.
    assert_eq!(fx.notifier.sent_count(), 2);
    assert_eq!(fx.store.invitations_of_org(org.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn expired_invitation_is_replaced_with_a_fresh_token() {
    let fx = fixture();
    let now = Utc::now();
    let u1 = UserId::new();

    let org = fx
        .memberships
        .create_organization(u1, attrs("Riverside School"), now)
        .await
        .unwrap();
    let ctx = ctx_of(&fx.store, u1, &org).await;

    let stale = fx
        .invitations
        .create(&ctx, "carol@example.com", None, now)
        .await
        .unwrap();

    let later = now + Duration::days(8);
    let fresh = fx
        .invitations
        .create(&ctx, "carol@example.com", None, later)
        .await
        .unwrap();

    assert_ne!(stale.id, fresh.id);
    assert_ne!(stale.token, fresh.token);
    assert!(!fresh.accepted);

    // The expired row is gone; only the fresh one remains.
    let all = fx.store.invitations_of_org(org.id).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, fresh.id);
    assert!(fx
        .store
        .invitation_by_token(&stale.token)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn notification_failure_does_not_roll_back_the_invitation() {
    let fx = fixture();
    let now = Utc::now();
    let u1 = UserId::new();

    let org = fx
        .memberships
        .create_organization(u1, attrs("Riverside School"), now)
        .await
        .unwrap();
    let ctx = ctx_of(&fx.store, u1, &org).await;

    fx.notifier.set_failing(true);
    let invitation = fx
        .invitations
        .create(&ctx, "dave@example.com", None, now)
        .await
        .unwrap();

    assert!(fx
        .store
        .invitation_by_token(&invitation.token)
        .await
        .unwrap()
        .is_some());
    assert_eq!(fx.notifier.sent_count(), 0);
}

#[tokio::test]
async fn accept_requires_the_invited_identity() {
    let fx = fixture();
    let now = Utc::now();
    let u1 = UserId::new();

    let org = fx
        .memberships
        .create_organization(u1, attrs("Riverside School"), now)
        .await
        .unwrap();
    let ctx = ctx_of(&fx.store, u1, &org).await;

    let invitation = fx
        .invitations
        .create(&ctx, "bob@example.com", None, now)
        .await
        .unwrap();

    let eve = UserId::new();
    let err = fx
        .invitations
        .accept(eve, "eve@example.com", &invitation.token, now)
        .await
        .unwrap_err();
    assert_eq!(err, DirectoryError::EmailMismatch);

    let err = fx
        .invitations
        .accept(eve, "bob@example.com", &invitation.token, now + Duration::days(7))
        .await
        .unwrap_err();
    assert_eq!(err, DirectoryError::Expired);

    let err = fx
        .invitations
        .accept(eve, "", &invitation.token, now)
        .await
        .unwrap_err();
    assert_eq!(err, DirectoryError::UserNotFound);
}

#[tokio::test]
async fn concurrent_accepts_have_exactly_one_winner() {
    let fx = fixture();
    let now = Utc::now();
    let u1 = UserId::new();

    let org = fx
        .memberships
        .create_organization(u1, attrs("Riverside School"), now)
        .await
        .unwrap();
    let ctx = ctx_of(&fx.store, u1, &org).await;

    let invitation = fx
        .invitations
        .create(&ctx, "bob@example.com", None, now)
        .await
        .unwrap();

    let bob = UserId::new();
    let (a, b) = tokio::join!(
        fx.invitations
            .accept(bob, "bob@example.com", &invitation.token, now),
        fx.invitations
            .accept(bob, "bob@example.com", &invitation.token, now),
    );

    let outcomes = [a, b];
    let wins = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1);
    let loser = outcomes.iter().find(|r| r.is_err()).unwrap();
    assert!(matches!(
        loser.as_ref().unwrap_err(),
        DirectoryError::AlreadyAccepted | DirectoryError::Conflict(_)
    ));

    // Exactly one membership row exists for bob.
    let rows: Vec<_> = fx
        .store
        .memberships_of_org(org.id)
        .await
        .unwrap()
        .into_iter()
        .filter(|m| m.user_id == bob)
        .collect();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn token_lookup_is_view_only() {
    let fx = fixture();
    let now = Utc::now();
    let u1 = UserId::new();

    let org = fx
        .memberships
        .create_organization(u1, attrs("Riverside School"), now)
        .await
        .unwrap();
    let ctx = ctx_of(&fx.store, u1, &org).await;

    let invitation = fx
        .invitations
        .create(&ctx, "bob@example.com", None, now)
        .await
        .unwrap();

    let (found, org_name) = fx
        .invitations
        .get_by_token(&invitation.token, now)
        .await
        .unwrap();
    assert_eq!(found.id, invitation.id);
    assert_eq!(org_name, "Riverside School");

    // Accepted-but-unexpired tokens still resolve for display.
    let bob = UserId::new();
    fx.invitations
        .accept(bob, "bob@example.com", &invitation.token, now)
        .await
        .unwrap();
    assert!(fx
        .invitations
        .get_by_token(&invitation.token, now)
        .await
        .is_ok());

    // Expired and unknown tokens are indistinguishable.
    let err = fx
        .invitations
        .get_by_token(&invitation.token, now + Duration::days(7))
        .await
        .unwrap_err();
    assert_eq!(err, DirectoryError::InvalidOrExpired);
    let err = fx
        .invitations
        .get_by_token("deadbeef", now)
        .await
        .unwrap_err();
    assert_eq!(err, DirectoryError::InvalidOrExpired);
}

#[tokio::test]
async fn soft_removal_revokes_access_immediately() {
    let fx = fixture();
    let now = Utc::now();
    let u1 = UserId::new();

    let org = fx
        .memberships
        .create_organization(u1, attrs("Riverside School"), now)
        .await
        .unwrap();
    let ctx = ctx_of(&fx.store, u1, &org).await;

    let invitation = fx
        .invitations
        .create(&ctx, "bob@example.com", None, now)
        .await
        .unwrap();
    let bob = UserId::new();
    fx.invitations
        .accept(bob, "bob@example.com", &invitation.token, now)
        .await
        .unwrap();

    fx.memberships.remove_member(&ctx, bob, now).await.unwrap();

    // History retained, access revoked.
    let row = fx.store.membership(bob, org.id).await.unwrap().unwrap();
    assert_eq!(row.status, MemberStatus::Removed);
    assert!(row.removed_at.is_some());
    assert_eq!(
        resolve_tenant_context(&fx.store, bob, org.id).await.unwrap_err(),
        DirectoryError::NotAMember
    );

    // Removing again is a no-op success.
    fx.memberships.remove_member(&ctx, bob, now).await.unwrap();

    // A ghost target is an error.
    let err = fx
        .memberships
        .remove_member(&ctx, UserId::new(), now)
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::MembershipNotFound(_)));
}

#[tokio::test]
async fn the_only_owner_cannot_be_removed() {
    let fx = fixture();
    let now = Utc::now();
    let u1 = UserId::new();

    let org = fx
        .memberships
        .create_organization(u1, attrs("Riverside School"), now)
        .await
        .unwrap();
    let ctx = ctx_of(&fx.store, u1, &org).await;

    let err = fx.memberships.remove_member(&ctx, u1, now).await.unwrap_err();
    assert!(matches!(err, DirectoryError::Validation(_)));
    assert!(resolve_tenant_context(&fx.store, u1, org.id).await.is_ok());
}

#[tokio::test]
async fn bulk_role_update_is_all_or_nothing_and_audited() {
    let fx = fixture();
    let now = Utc::now();
    let u1 = UserId::new();

    let org = fx
        .memberships
        .create_organization(u1, attrs("Riverside School"), now)
        .await
        .unwrap();
    let ctx = ctx_of(&fx.store, u1, &org).await;

    let mut joined = Vec::new();
    for email in ["u2@example.com", "u3@example.com"] {
        let invitation = fx.invitations.create(&ctx, email, None, now).await.unwrap();
        let user = UserId::new();
        fx.invitations
            .accept(user, email, &invitation.token, now)
            .await
            .unwrap();
        joined.push(user);
    }
    let (u2, u3) = (joined[0], joined[1]);

    let audit = fx
        .memberships
        .bulk_update_roles(
            &ctx,
            vec![(u2, MemberRole::Admin), (u3, MemberRole::Manager)],
            now,
        )
        .await
        .unwrap();

    assert_eq!(
        fx.store.membership(u2, org.id).await.unwrap().unwrap().role,
        MemberRole::Admin
    );
    assert_eq!(
        fx.store.membership(u3, org.id).await.unwrap().unwrap().role,
        MemberRole::Manager
    );
    let log = fx.memberships.audit_log(&ctx).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].id, audit.id);
    assert!(log[0].message.contains(&format!("{u2} => ADMIN")));

    // A missing target fails the whole batch: u2 keeps the role it has.
    let ghost = UserId::new();
    let err = fx
        .memberships
        .bulk_update_roles(
            &ctx,
            vec![(u2, MemberRole::Member), (ghost, MemberRole::Manager)],
            now,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::MembershipNotFound(id) if id == ghost));
    assert_eq!(
        fx.store.membership(u2, org.id).await.unwrap().unwrap().role,
        MemberRole::Admin
    );
    assert_eq!(fx.memberships.audit_log(&ctx).await.unwrap().len(), 1);
}

#[tokio::test]
async fn capability_checks_gate_every_admin_operation() {
    let fx = fixture();
    let now = Utc::now();
    let u1 = UserId::new();

    let org = fx
        .memberships
        .create_organization(u1, attrs("Riverside School"), now)
        .await
        .unwrap();
    let owner_ctx = ctx_of(&fx.store, u1, &org).await;

    let invitation = fx
        .invitations
        .create(&owner_ctx, "bob@example.com", None, now)
        .await
        .unwrap();
    let bob = UserId::new();
    fx.invitations
        .accept(bob, "bob@example.com", &invitation.token, now)
        .await
        .unwrap();
    let member_ctx = ctx_of(&fx.store, bob, &org).await;

    assert!(matches!(
        fx.invitations
            .create(&member_ctx, "x@example.com", None, now)
            .await
            .unwrap_err(),
        DirectoryError::InsufficientPermission(_)
    ));
    assert!(matches!(
        fx.memberships
            .bulk_update_roles(&member_ctx, vec![(bob, MemberRole::Admin)], now)
            .await
            .unwrap_err(),
        DirectoryError::InsufficientPermission(_)
    ));
    assert!(matches!(
        fx.memberships.remove_member(&member_ctx, u1, now).await.unwrap_err(),
        DirectoryError::InsufficientPermission(_)
    ));
    assert!(matches!(
        fx.memberships.delete_organization(&member_ctx).await.unwrap_err(),
        DirectoryError::InsufficientPermission(_)
    ));
}

#[tokio::test]
async fn delete_organization_cascades_everything() {
    let fx = fixture();
    let now = Utc::now();
    let u1 = UserId::new();

    let org = fx
        .memberships
        .create_organization(u1, attrs("Riverside School"), now)
        .await
        .unwrap();
    let ctx = ctx_of(&fx.store, u1, &org).await;
    fx.invitations
        .create(&ctx, "bob@example.com", None, now)
        .await
        .unwrap();

    fx.memberships.delete_organization(&ctx).await.unwrap();

    assert!(fx.store.organization(org.id).await.unwrap().is_none());
    assert!(fx.store.memberships_of_org(org.id).await.unwrap().is_empty());
    assert!(fx.store.invitations_of_org(org.id).await.unwrap().is_empty());
    assert_eq!(
        resolve_tenant_context(&fx.store, u1, org.id).await.unwrap_err(),
        DirectoryError::NotAMember
    );
}
