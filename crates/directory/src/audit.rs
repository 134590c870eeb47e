//! Append-only audit trail for membership role changes.

use chrono::{DateTime, Utc};
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use atrium_core::{AuditEntryId, DomainError, OrgId, UserId};

use crate::membership::MemberRole;

/// What a given audit entry records.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditKind {
    RoleChange,
}

impl AuditKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditKind::RoleChange => "ROLE_CHANGE",
        }
    }
}

impl core::fmt::Display for AuditKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ROLE_CHANGE" => Ok(AuditKind::RoleChange),
            other => Err(DomainError::validation(format!("unknown audit kind: {other}"))),
        }
    }
}

/// One audit record, owned by the organization it describes.
///
/// Written only as a side effect of a role-change batch, inside the same
/// transaction as the role writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: AuditEntryId,
    pub org_id: OrgId,
    pub name: String,
    /// Human-readable summary: `"<user_id> => <role>"` per change, joined.
    pub message: String,
    pub updated_by: UserId,
    pub kind: AuditKind,
    pub recorded_at: DateTime<Utc>,
}

impl AuditLogEntry {
    /// Summarize one bulk role update.
    pub fn role_change(
        org_id: OrgId,
        updated_by: UserId,
        updates: &[(UserId, MemberRole)],
        now: DateTime<Utc>,
    ) -> Self {
        let message = updates
            .iter()
            .map(|(user_id, role)| format!("{user_id} => {role}"))
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            id: AuditEntryId::new(),
            org_id,
            name: "member role update".to_string(),
            message,
            updated_by,
            kind: AuditKind::RoleChange,
            recorded_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_change_summarizes_every_update() {
        let a = UserId::new();
        let b = UserId::new();
        let entry = AuditLogEntry::role_change(
            OrgId::new(),
            UserId::new(),
            &[(a, MemberRole::Admin), (b, MemberRole::Manager)],
            Utc::now(),
        );

        assert_eq!(entry.kind, AuditKind::RoleChange);
        assert_eq!(entry.message, format!("{a} => ADMIN, {b} => MANAGER"));
    }
}
