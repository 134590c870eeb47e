//! Invitations: how new members join an organization.
//!
//! Lifecycle: an invitation is issued for an email address, stays *live*
//! until it is accepted or its validity window lapses, and is consumed by
//! exactly one acceptance. Expiry is detected lazily on read; an expired row
//! is physically removed when a fresh invitation replaces it.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use atrium_core::{DomainError, DomainResult, InvitationId, OrgId, UserId};

use crate::membership::MemberRole;

/// Validity window for a freshly issued invitation.
pub const INVITATION_VALIDITY_DAYS: i64 = 7;

/// An invitation for `email` to join `org_id` with `role`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: InvitationId,
    pub org_id: OrgId,
    /// Lowercased at issue time; acceptance is bound to this address.
    pub email: String,
    pub role: MemberRole,
    /// Unguessable bearer token identifying this invitation.
    pub token: String,
    pub invited_by: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Flips to `true` exactly once; never reset.
    pub accepted: bool,
}

impl Invitation {
    /// Issue a new invitation.
    ///
    /// Validates the email, lowercases it, generates a fresh token and sets
    /// the expiry to `now + INVITATION_VALIDITY_DAYS`.
    pub fn issue(
        org_id: OrgId,
        email: &str,
        role: Option<MemberRole>,
        invited_by: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::validation("invalid email format"));
        }

        Ok(Self {
            id: InvitationId::new(),
            org_id,
            email: email.to_lowercase(),
            role: role.unwrap_or(MemberRole::Member),
            token: generate_token(),
            invited_by,
            created_at: now,
            expires_at: now + Duration::days(INVITATION_VALIDITY_DAYS),
            accepted: false,
        })
    }

    /// An invitation at its expiry instant is already expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Live = still actionable: neither accepted nor expired.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        !self.accepted && !self.is_expired(now)
    }

    /// Acceptance is bound to the invited email identity, case-insensitively.
    pub fn matches_email(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email.trim())
    }
}

/// 32 bytes from the OS RNG, hex-encoded.
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(now: DateTime<Utc>) -> Invitation {
        Invitation::issue(OrgId::new(), "Bob@Example.com", None, UserId::new(), now).unwrap()
    }

    #[test]
    fn issue_defaults_and_normalizes() {
        let now = Utc::now();
        let inv = issue(now);
        assert_eq!(inv.role, MemberRole::Member);
        assert_eq!(inv.email, "bob@example.com");
        assert!(!inv.accepted);
        assert_eq!(inv.expires_at, now + Duration::days(INVITATION_VALIDITY_DAYS));
    }

    #[test]
    fn issue_rejects_malformed_email() {
        let now = Utc::now();
        assert!(Invitation::issue(OrgId::new(), "", None, UserId::new(), now).is_err());
        assert!(Invitation::issue(OrgId::new(), "not-an-email", None, UserId::new(), now).is_err());
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let now = Utc::now();
        let inv = issue(now);
        assert!(!inv.is_expired(now));
        assert!(inv.is_live(now));
        let at_expiry = inv.expires_at;
        assert!(inv.is_expired(at_expiry));
        assert!(!inv.is_live(at_expiry));
    }

    #[test]
    fn accepted_invitation_is_not_live() {
        let now = Utc::now();
        let mut inv = issue(now);
        inv.accepted = true;
        assert!(!inv.is_live(now));
        assert!(!inv.is_expired(now));
    }

    #[test]
    fn email_binding_is_case_insensitive() {
        let inv = issue(Utc::now());
        assert!(inv.matches_email("BOB@example.COM"));
        assert!(inv.matches_email("  bob@example.com "));
        assert!(!inv.matches_email("eve@example.com"));
    }

    #[test]
    fn tokens_are_long_and_distinct() {
        let now = Utc::now();
        let a = issue(now);
        let b = issue(now);
        assert_eq!(a.token.len(), 64);
        assert_ne!(a.token, b.token);
    }
}
