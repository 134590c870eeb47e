//! Organization: the top-level tenant entity.

use chrono::{DateTime, Utc};
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use atrium_core::{DomainError, DomainResult, OrgId, UserId};

const MAX_NAME_LEN: usize = 120;

/// What kind of organization this tenant is.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrgKind {
    School,
    TrainingCenter,
    Corporate,
    Church,
    #[default]
    Other,
}

impl OrgKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrgKind::School => "SCHOOL",
            OrgKind::TrainingCenter => "TRAINING_CENTER",
            OrgKind::Corporate => "CORPORATE",
            OrgKind::Church => "CHURCH",
            OrgKind::Other => "OTHER",
        }
    }
}

impl core::fmt::Display for OrgKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrgKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SCHOOL" => Ok(OrgKind::School),
            "TRAINING_CENTER" => Ok(OrgKind::TrainingCenter),
            "CORPORATE" => Ok(OrgKind::Corporate),
            "CHURCH" => Ok(OrgKind::Church),
            "OTHER" => Ok(OrgKind::Other),
            other => Err(DomainError::validation(format!("unknown organization kind: {other}"))),
        }
    }
}

/// A tenant. Owns its memberships, invitations and audit entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrgId,
    pub name: String,
    pub description: Option<String>,
    pub logo_image: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub kind: OrgKind,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

/// Attributes for creating an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationAttrs {
    pub name: String,
    pub description: Option<String>,
    pub logo_image: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub kind: OrgKind,
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub logo_image: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub kind: Option<OrgKind>,
}

impl Organization {
    /// Validate attributes and construct the organization.
    pub fn new(attrs: OrganizationAttrs, created_by: UserId, now: DateTime<Utc>) -> DomainResult<Self> {
        let name = attrs.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("organization name cannot be empty"));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(DomainError::validation(format!(
                "organization name exceeds {MAX_NAME_LEN} characters"
            )));
        }

        Ok(Self {
            id: OrgId::new(),
            name,
            description: attrs.description,
            logo_image: attrs.logo_image,
            started_at: attrs.started_at,
            kind: attrs.kind,
            created_by,
            created_at: now,
        })
    }

    /// Apply a partial update. Name changes go through the same validation
    /// as creation.
    pub fn apply_patch(&mut self, patch: OrganizationPatch) -> DomainResult<()> {
        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(DomainError::validation("organization name cannot be empty"));
            }
            if name.len() > MAX_NAME_LEN {
                return Err(DomainError::validation(format!(
                    "organization name exceeds {MAX_NAME_LEN} characters"
                )));
            }
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(logo_image) = patch.logo_image {
            self.logo_image = Some(logo_image);
        }
        if let Some(started_at) = patch.started_at {
            self.started_at = Some(started_at);
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        Ok(())
    }
}
