//! Request/response DTOs and JSON mapping helpers.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use atrium_directory::{
    AuditLogEntry, Invitation, MemberRole, Membership, Organization, OrganizationAttrs,
    OrganizationPatch, OrgKind,
};

#[derive(Debug, Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: String,
    pub description: Option<String>,
    pub logo_image: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub kind: OrgKind,
}

impl CreateOrganizationRequest {
    pub fn into_attrs(self) -> OrganizationAttrs {
        OrganizationAttrs {
            name: self.name,
            description: self.description,
            logo_image: self.logo_image,
            started_at: self.started_at,
            kind: self.kind,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrganizationRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub logo_image: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub kind: Option<OrgKind>,
}

impl UpdateOrganizationRequest {
    pub fn into_patch(self) -> OrganizationPatch {
        OrganizationPatch {
            name: self.name,
            description: self.description,
            logo_image: self.logo_image,
            started_at: self.started_at,
            kind: self.kind,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateInvitationRequest {
    pub email: String,
    pub role: Option<MemberRole>,
}

#[derive(Debug, Deserialize)]
pub struct BulkRoleUpdateRequest {
    /// user id → new role.
    pub updates: HashMap<Uuid, MemberRole>,
}

pub fn organization_to_json(org: &Organization) -> serde_json::Value {
    json!({
        "id": org.id.to_string(),
        "name": org.name,
        "description": org.description,
        "logo_image": org.logo_image,
        "started_at": org.started_at,
        "kind": org.kind.as_str(),
        "created_by": org.created_by.to_string(),
        "created_at": org.created_at,
    })
}

pub fn membership_to_json(m: &Membership) -> serde_json::Value {
    json!({
        "user_id": m.user_id.to_string(),
        "organization_id": m.org_id.to_string(),
        "role": m.role.as_str(),
        "status": m.status.as_str(),
        "joined_at": m.joined_at,
        "invited_by": m.invited_by.map(|id| id.to_string()),
        "removed_at": m.removed_at,
    })
}

/// Admin-facing view; the bearer token stays out of listings.
pub fn invitation_to_json(i: &Invitation) -> serde_json::Value {
    json!({
        "id": i.id.to_string(),
        "organization_id": i.org_id.to_string(),
        "email": i.email,
        "role": i.role.as_str(),
        "invited_by": i.invited_by.to_string(),
        "created_at": i.created_at,
        "expires_at": i.expires_at,
        "accepted": i.accepted,
    })
}

pub fn audit_entry_to_json(e: &AuditLogEntry) -> serde_json::Value {
    json!({
        "id": e.id.to_string(),
        "organization_id": e.org_id.to_string(),
        "name": e.name,
        "message": e.message,
        "updated_by": e.updated_by.to_string(),
        "kind": e.kind.as_str(),
        "recorded_at": e.recorded_at,
    })
}
