//! Membership: the caller ↔ organization relationship.
//!
//! # Invariants
//! - At most one membership row exists per `(user_id, org_id)` pair.
//! - Removal is a soft operation: the row is retained with `Removed` status
//!   and access is revoked immediately.

use chrono::{DateTime, Utc};
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use atrium_core::{DomainError, OrgId, UserId};

use crate::invitation::Invitation;

// ─────────────────────────────────────────────────────────────────────────────
// Role
// ─────────────────────────────────────────────────────────────────────────────

/// Role granted to a member within one organization.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    Owner,
    Admin,
    Manager,
    Member,
    Accountant,
    OfficeStaff,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Owner => "OWNER",
            MemberRole::Admin => "ADMIN",
            MemberRole::Manager => "MANAGER",
            MemberRole::Member => "MEMBER",
            MemberRole::Accountant => "ACCOUNTANT",
            MemberRole::OfficeStaff => "OFFICE_STAFF",
        }
    }
}

impl core::fmt::Display for MemberRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OWNER" => Ok(MemberRole::Owner),
            "ADMIN" => Ok(MemberRole::Admin),
            "MANAGER" => Ok(MemberRole::Manager),
            "MEMBER" => Ok(MemberRole::Member),
            "ACCOUNTANT" => Ok(MemberRole::Accountant),
            "OFFICE_STAFF" => Ok(MemberRole::OfficeStaff),
            other => Err(DomainError::validation(format!("unknown role: {other}"))),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Status
// ─────────────────────────────────────────────────────────────────────────────

/// Membership status.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberStatus {
    /// Member can act within the organization.
    #[default]
    Active,
    /// Soft-removed: history retained, access revoked.
    Removed,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Active => "ACTIVE",
            MemberStatus::Removed => "REMOVED",
        }
    }
}

impl core::fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(MemberStatus::Active),
            "REMOVED" => Ok(MemberStatus::Removed),
            other => Err(DomainError::validation(format!("unknown status: {other}"))),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Membership
// ─────────────────────────────────────────────────────────────────────────────

/// A user's membership in one organization.
///
/// Identity is the composite `(user_id, org_id)`; there is no surrogate id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub user_id: UserId,
    pub org_id: OrgId,
    pub role: MemberRole,
    pub status: MemberStatus,
    pub joined_at: DateTime<Utc>,
    pub invited_by: Option<UserId>,
    pub removed_at: Option<DateTime<Utc>>,
}

impl Membership {
    /// The owner membership created together with its organization.
    pub fn new_owner(user_id: UserId, org_id: OrgId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            org_id,
            role: MemberRole::Owner,
            status: MemberStatus::Active,
            joined_at: now,
            invited_by: None,
            removed_at: None,
        }
    }

    /// A membership created by accepting an invitation.
    pub fn from_invitation(user_id: UserId, invitation: &Invitation, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            org_id: invitation.org_id,
            role: invitation.role,
            status: MemberStatus::Active,
            joined_at: now,
            invited_by: Some(invitation.invited_by),
            removed_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }

    /// Soft-remove: retains the row, revokes access.
    pub fn remove(&mut self, now: DateTime<Utc>) {
        self.status = MemberStatus::Removed;
        self.removed_at = Some(now);
    }

    /// Reactivate a soft-removed membership (re-accepted invitation).
    ///
    /// The existing row is reused; a second row for the same
    /// `(user_id, org_id)` must never be inserted.
    pub fn reactivate(&mut self, role: MemberRole, invited_by: Option<UserId>, now: DateTime<Utc>) {
        self.role = role;
        self.status = MemberStatus::Active;
        self.joined_at = now;
        self.invited_by = invited_by;
        self.removed_at = None;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
