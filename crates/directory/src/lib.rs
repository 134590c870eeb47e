//! `atrium-directory` — tenant membership domain (zero IO).
//!
//! Organizations, memberships, invitations and the audit trail for role
//! changes, plus the capability policy every tenant-scoped request passes
//! through. This crate is intentionally decoupled from HTTP and storage.

pub mod audit;
pub mod claims;
pub mod context;
pub mod error;
pub mod invitation;
pub mod membership;
pub mod notify;
pub mod organization;
pub mod policy;

pub use audit::{AuditKind, AuditLogEntry};
pub use claims::{
    Hs256SessionVerifier, SessionClaims, SessionError, SessionVerifier, TokenValidationError,
    encode_session_token, validate_claims,
};
pub use context::TenantContext;
pub use error::DirectoryError;
pub use invitation::{INVITATION_VALIDITY_DAYS, Invitation};
pub use membership::{MemberRole, MemberStatus, Membership};
pub use notify::{InvitationNotifier, NotifyError, TracingNotifier};
pub use organization::{Organization, OrganizationAttrs, OrganizationPatch, OrgKind};
pub use policy::{Capability, caps, require_capability, role_capabilities};
