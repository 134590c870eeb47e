//! Postgres-backed directory store.
//!
//! Persists the directory entities in PostgreSQL with tenant scoping and
//! every uniqueness constraint enforced at the database level. Each
//! compound operation runs inside one transaction.
//!
//! ## Expected Schema
//!
//! ```sql
//! CREATE TABLE organizations (
//!     id          UUID PRIMARY KEY,
//!     name        TEXT NOT NULL UNIQUE,
//!     description TEXT,
//!     logo_image  TEXT,
//!     started_at  TIMESTAMPTZ,
//!     kind        TEXT NOT NULL,
//!     created_by  UUID NOT NULL,
//!     created_at  TIMESTAMPTZ NOT NULL
//! );
//!
//! CREATE TABLE memberships (
//!     user_id    UUID NOT NULL,
//!     org_id     UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
//!     role       TEXT NOT NULL,
//!     status     TEXT NOT NULL,
//!     joined_at  TIMESTAMPTZ NOT NULL,
//!     invited_by UUID,
//!     removed_at TIMESTAMPTZ,
//!     PRIMARY KEY (user_id, org_id)
//! );
//!
//! CREATE TABLE invitations (
//!     id         UUID PRIMARY KEY,
//!     org_id     UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
//!     email      TEXT NOT NULL,
//!     role       TEXT NOT NULL,
//!     token      TEXT NOT NULL UNIQUE,
//!     invited_by UUID NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL,
//!     expires_at TIMESTAMPTZ NOT NULL,
//!     accepted   BOOLEAN NOT NULL DEFAULT FALSE
//! );
//! CREATE UNIQUE INDEX invitations_pending_email_org_idx
//!     ON invitations (org_id, lower(email)) WHERE NOT accepted;
//!
//! CREATE TABLE audit_log (
//!     id          UUID PRIMARY KEY,
//!     org_id      UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
//!     name        TEXT NOT NULL,
//!     message     TEXT NOT NULL,
//!     updated_by  UUID NOT NULL,
//!     kind        TEXT NOT NULL,
//!     recorded_at TIMESTAMPTZ NOT NULL
//! );
//! ```
//!
//! ## Error Mapping
//!
//! | PostgreSQL error | Constraint | StoreError |
//! |------------------|------------|------------|
//! | `23505` | `organizations_name_key` | `DuplicateOrganizationName` |
//! | `23505` | `memberships_pkey` | `DuplicateMembership` |
//! | `23505` | `invitations_pending_email_org_idx` | `DuplicateInvitation` |
//! | `23505` | `invitations_token_key` | `Storage` (token collision) |
//! | other | any | `Storage` |

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use atrium_core::{AuditEntryId, InvitationId, OrgId, UserId};
use atrium_directory::{AuditLogEntry, Invitation, MemberRole, Membership, Organization};

use super::r#trait::{DirectoryStore, StoreError};

/// Postgres-backed directory store.
///
/// `Send + Sync`; the SQLx pool handles connection management across
/// threads. Uniqueness races are resolved by the database constraints;
/// the loser of a concurrent insert observes the mapped `StoreError` and
/// can re-read the winner's row.
#[derive(Debug, Clone)]
pub struct PostgresDirectoryStore {
    pool: PgPool,
}

impl PostgresDirectoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DirectoryStore for PostgresDirectoryStore {
    #[instrument(skip(self), fields(org_id = %org_id))]
    async fn organization(&self, org_id: OrgId) -> Result<Option<Organization>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, description, logo_image, started_at, kind, created_by, created_at \
             FROM organizations WHERE id = $1",
        )
        .bind(org_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("organization", e))?;

        row.map(|r| OrganizationRow::from_row(&r).map_err(row_error)?.into_domain())
            .transpose()
    }

    #[instrument(skip(self), fields(user_id = %user_id, org_id = %org_id))]
    async fn membership(
        &self,
        user_id: UserId,
        org_id: OrgId,
    ) -> Result<Option<Membership>, StoreError> {
        let row = sqlx::query(
            "SELECT user_id, org_id, role, status, joined_at, invited_by, removed_at \
             FROM memberships WHERE user_id = $1 AND org_id = $2",
        )
        .bind(user_id.as_uuid())
        .bind(org_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("membership", e))?;

        row.map(|r| MembershipRow::from_row(&r).map_err(row_error)?.into_domain())
            .transpose()
    }

    #[instrument(skip(self), fields(org_id = %org_id))]
    async fn memberships_of_org(&self, org_id: OrgId) -> Result<Vec<Membership>, StoreError> {
        let rows = sqlx::query(
            "SELECT user_id, org_id, role, status, joined_at, invited_by, removed_at \
             FROM memberships WHERE org_id = $1 ORDER BY joined_at",
        )
        .bind(org_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("memberships_of_org", e))?;

        rows.iter()
            .map(|r| MembershipRow::from_row(r).map_err(row_error)?.into_domain())
            .collect()
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn organizations_of_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<(Organization, Membership)>, StoreError> {
        let rows = sqlx::query(
            "SELECT o.id, o.name, o.description, o.logo_image, o.started_at, o.kind, \
                    o.created_by, o.created_at, \
                    m.user_id, m.org_id, m.role, m.status, m.joined_at, m.invited_by, m.removed_at \
             FROM memberships m \
             JOIN organizations o ON o.id = m.org_id \
             WHERE m.user_id = $1 AND m.status = 'ACTIVE' \
             ORDER BY m.joined_at",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("organizations_of_user", e))?;

        rows.iter()
            .map(|r| {
                let org = OrganizationRow::from_row(r).map_err(row_error)?.into_domain()?;
                let membership = MembershipRow::from_row(r).map_err(row_error)?.into_domain()?;
                Ok((org, membership))
            })
            .collect()
    }

    #[instrument(skip(self, token))]
    async fn invitation_by_token(&self, token: &str) -> Result<Option<Invitation>, StoreError> {
        let row = sqlx::query(
            "SELECT id, org_id, email, role, token, invited_by, created_at, expires_at, accepted \
             FROM invitations WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("invitation_by_token", e))?;

        row.map(|r| InvitationRow::from_row(&r).map_err(row_error)?.into_domain())
            .transpose()
    }

    #[instrument(skip(self, email), fields(org_id = %org_id))]
    async fn pending_invitation(
        &self,
        email: &str,
        org_id: OrgId,
    ) -> Result<Option<Invitation>, StoreError> {
        let row = sqlx::query(
            "SELECT id, org_id, email, role, token, invited_by, created_at, expires_at, accepted \
             FROM invitations \
             WHERE org_id = $1 AND NOT accepted AND lower(email) = lower($2)",
        )
        .bind(org_id.as_uuid())
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("pending_invitation", e))?;

        row.map(|r| InvitationRow::from_row(&r).map_err(row_error)?.into_domain())
            .transpose()
    }

    #[instrument(skip(self), fields(org_id = %org_id))]
    async fn invitations_of_org(&self, org_id: OrgId) -> Result<Vec<Invitation>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, org_id, email, role, token, invited_by, created_at, expires_at, accepted \
             FROM invitations WHERE org_id = $1 ORDER BY created_at",
        )
        .bind(org_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("invitations_of_org", e))?;

        rows.iter()
            .map(|r| InvitationRow::from_row(r).map_err(row_error)?.into_domain())
            .collect()
    }

    #[instrument(skip(self), fields(org_id = %org_id))]
    async fn audit_log_of_org(&self, org_id: OrgId) -> Result<Vec<AuditLogEntry>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, org_id, name, message, updated_by, kind, recorded_at \
             FROM audit_log WHERE org_id = $1 ORDER BY recorded_at",
        )
        .bind(org_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("audit_log_of_org", e))?;

        rows.iter()
            .map(|r| AuditRow::from_row(r).map_err(row_error)?.into_domain())
            .collect()
    }

    #[instrument(skip(self, org), fields(org_id = %org.id))]
    async fn update_organization(&self, org: &Organization) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE organizations \
             SET name = $2, description = $3, logo_image = $4, started_at = $5, kind = $6 \
             WHERE id = $1",
        )
        .bind(org.id.as_uuid())
        .bind(&org.name)
        .bind(&org.description)
        .bind(&org.logo_image)
        .bind(org.started_at)
        .bind(org.kind.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_organization", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::OrganizationMissing(org.id));
        }
        Ok(())
    }

    #[instrument(skip(self, membership), fields(user_id = %membership.user_id, org_id = %membership.org_id))]
    async fn update_membership(&self, membership: &Membership) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE memberships \
             SET role = $3, status = $4, joined_at = $5, invited_by = $6, removed_at = $7 \
             WHERE user_id = $1 AND org_id = $2",
        )
        .bind(membership.user_id.as_uuid())
        .bind(membership.org_id.as_uuid())
        .bind(membership.role.as_str())
        .bind(membership.status.as_str())
        .bind(membership.joined_at)
        .bind(membership.invited_by.map(|id| *id.as_uuid()))
        .bind(membership.removed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_membership", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::MembershipMissing(membership.user_id));
        }
        Ok(())
    }

    #[instrument(skip(self, org, owner), fields(org_id = %org.id, owner_id = %owner.user_id))]
    async fn insert_organization_with_owner(
        &self,
        org: &Organization,
        owner: &Membership,
    ) -> Result<(), StoreError> {
        let mut tx = begin(&self.pool).await?;

        sqlx::query(
            "INSERT INTO organizations \
             (id, name, description, logo_image, started_at, kind, created_by, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(org.id.as_uuid())
        .bind(&org.name)
        .bind(&org.description)
        .bind(&org.logo_image)
        .bind(org.started_at)
        .bind(org.kind.as_str())
        .bind(org.created_by.as_uuid())
        .bind(org.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateOrganizationName(org.name.clone())
            } else {
                map_sqlx_error("insert_organization", e)
            }
        })?;

        insert_membership(&mut tx, owner).await?;

        commit(tx).await
    }

    #[instrument(skip(self, fresh), fields(org_id = %fresh.org_id))]
    async fn replace_invitation(
        &self,
        expired: Option<InvitationId>,
        fresh: &Invitation,
    ) -> Result<(), StoreError> {
        let mut tx = begin(&self.pool).await?;

        if let Some(expired_id) = expired {
            sqlx::query("DELETE FROM invitations WHERE id = $1 AND NOT accepted")
                .bind(expired_id.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("delete_expired_invitation", e))?;
        }

        sqlx::query(
            "INSERT INTO invitations \
             (id, org_id, email, role, token, invited_by, created_at, expires_at, accepted) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(fresh.id.as_uuid())
        .bind(fresh.org_id.as_uuid())
        .bind(&fresh.email)
        .bind(fresh.role.as_str())
        .bind(&fresh.token)
        .bind(fresh.invited_by.as_uuid())
        .bind(fresh.created_at)
        .bind(fresh.expires_at)
        .bind(fresh.accepted)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            let constraint = unique_violation_constraint(&e).map(str::to_string);
            match constraint.as_deref() {
                Some("invitations_token_key") => {
                    StoreError::Storage("invitation token collision".to_string())
                }
                Some(_) => StoreError::DuplicateInvitation(fresh.org_id),
                None => map_sqlx_error("insert_invitation", e),
            }
        })?;

        commit(tx).await
    }

    #[instrument(skip(self, member), fields(invitation_id = %invitation_id, user_id = %member.user_id))]
    async fn accept_invitation(
        &self,
        invitation_id: InvitationId,
        member: &Membership,
    ) -> Result<(), StoreError> {
        let mut tx = begin(&self.pool).await?;

        // Optimistic flip: only a still-pending invitation is consumed.
        let flipped = sqlx::query(
            "UPDATE invitations SET accepted = TRUE WHERE id = $1 AND NOT accepted",
        )
        .bind(invitation_id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("flip_invitation", e))?;

        if flipped.rows_affected() == 0 {
            let exists = sqlx::query("SELECT 1 FROM invitations WHERE id = $1")
                .bind(invitation_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("check_invitation", e))?
                .is_some();
            rollback(tx).await?;
            return Err(if exists {
                StoreError::InvitationStale
            } else {
                StoreError::InvitationMissing
            });
        }

        let existing = sqlx::query(
            "SELECT status FROM memberships WHERE user_id = $1 AND org_id = $2 FOR UPDATE",
        )
        .bind(member.user_id.as_uuid())
        .bind(member.org_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("check_membership", e))?;

        match existing {
            Some(row) => {
                let status: String = row
                    .try_get("status")
                    .map_err(|e| StoreError::Storage(format!("failed to read status: {e}")))?;
                if status == "ACTIVE" {
                    rollback(tx).await?;
                    return Err(StoreError::DuplicateMembership {
                        user_id: member.user_id,
                        org_id: member.org_id,
                    });
                }
                // Soft-removed row: reactivate in place.
                sqlx::query(
                    "UPDATE memberships \
                     SET role = $3, status = 'ACTIVE', joined_at = $4, invited_by = $5, \
                         removed_at = NULL \
                     WHERE user_id = $1 AND org_id = $2",
                )
                .bind(member.user_id.as_uuid())
                .bind(member.org_id.as_uuid())
                .bind(member.role.as_str())
                .bind(member.joined_at)
                .bind(member.invited_by.map(|id| *id.as_uuid()))
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("reactivate_membership", e))?;
            }
            None => {
                insert_membership(&mut tx, member).await?;
            }
        }

        commit(tx).await
    }

    #[instrument(skip(self, updates, audit), fields(org_id = %org_id, update_count = updates.len()))]
    async fn apply_role_updates(
        &self,
        org_id: OrgId,
        updates: &[(UserId, MemberRole)],
        audit: &AuditLogEntry,
    ) -> Result<(), StoreError> {
        let mut tx = begin(&self.pool).await?;

        // Validate the whole batch before writing any row.
        for (user_id, _) in updates {
            let exists = sqlx::query(
                "SELECT 1 FROM memberships \
                 WHERE user_id = $1 AND org_id = $2 AND status = 'ACTIVE' FOR UPDATE",
            )
            .bind(user_id.as_uuid())
            .bind(org_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("check_role_target", e))?
            .is_some();

            if !exists {
                rollback(tx).await?;
                return Err(StoreError::MembershipMissing(*user_id));
            }
        }

        for (user_id, role) in updates {
            sqlx::query("UPDATE memberships SET role = $3 WHERE user_id = $1 AND org_id = $2")
                .bind(user_id.as_uuid())
                .bind(org_id.as_uuid())
                .bind(role.as_str())
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("update_role", e))?;
        }

        sqlx::query(
            "INSERT INTO audit_log (id, org_id, name, message, updated_by, kind, recorded_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(audit.id.as_uuid())
        .bind(audit.org_id.as_uuid())
        .bind(&audit.name)
        .bind(&audit.message)
        .bind(audit.updated_by.as_uuid())
        .bind(audit.kind.as_str())
        .bind(audit.recorded_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_audit_entry", e))?;

        commit(tx).await
    }

    #[instrument(skip(self), fields(org_id = %org_id))]
    async fn delete_organization(&self, org_id: OrgId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(org_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_organization", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::OrganizationMissing(org_id));
        }
        Ok(())
    }
}

async fn begin(pool: &PgPool) -> Result<Transaction<'static, Postgres>, StoreError> {
    pool.begin()
        .await
        .map_err(|e| map_sqlx_error("begin_transaction", e))
}

async fn commit(tx: Transaction<'static, Postgres>) -> Result<(), StoreError> {
    tx.commit()
        .await
        .map_err(|e| map_sqlx_error("commit_transaction", e))
}

async fn rollback(tx: Transaction<'static, Postgres>) -> Result<(), StoreError> {
    tx.rollback()
        .await
        .map_err(|e| map_sqlx_error("rollback", e))
}

async fn insert_membership(
    tx: &mut Transaction<'static, Postgres>,
    membership: &Membership,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO memberships \
         (user_id, org_id, role, status, joined_at, invited_by, removed_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(membership.user_id.as_uuid())
    .bind(membership.org_id.as_uuid())
    .bind(membership.role.as_str())
    .bind(membership.status.as_str())
    .bind(membership.joined_at)
    .bind(membership.invited_by.map(|id| *id.as_uuid()))
    .bind(membership.removed_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            StoreError::DuplicateMembership {
                user_id: membership.user_id,
                org_id: membership.org_id,
            }
        } else {
            map_sqlx_error("insert_membership", e)
        }
    })?;
    Ok(())
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => StoreError::Storage(format!(
            "database error in {}: {}",
            operation,
            db_err.message()
        )),
        sqlx::Error::PoolClosed => {
            StoreError::Storage(format!("connection pool closed in {operation}"))
        }
        other => StoreError::Storage(format!("sqlx error in {operation}: {other}")),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    unique_violation_constraint(err).is_some() || matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// The violated constraint's name, for a unique violation.
fn unique_violation_constraint(err: &sqlx::Error) -> Option<&str> {
    if let sqlx::Error::Database(db_err) = err {
        if db_err.code().as_deref() == Some("23505") {
            return db_err.constraint();
        }
    }
    None
}

fn row_error(err: sqlx::Error) -> StoreError {
    StoreError::Storage(format!("failed to deserialize row: {err}"))
}

// SQLx row types

#[derive(Debug)]
struct OrganizationRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    logo_image: Option<String>,
    started_at: Option<DateTime<Utc>>,
    kind: String,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, sqlx::postgres::PgRow> for OrganizationRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            logo_image: row.try_get("logo_image")?,
            started_at: row.try_get("started_at")?,
            kind: row.try_get("kind")?,
            created_by: row.try_get("created_by")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl OrganizationRow {
    fn into_domain(self) -> Result<Organization, StoreError> {
        Ok(Organization {
            id: OrgId::from_uuid(self.id),
            name: self.name,
            description: self.description,
            logo_image: self.logo_image,
            started_at: self.started_at,
            kind: parse_enum("kind", &self.kind)?,
            created_by: UserId::from_uuid(self.created_by),
            created_at: self.created_at,
        })
    }
}

#[derive(Debug)]
struct MembershipRow {
    user_id: Uuid,
    org_id: Uuid,
    role: String,
    status: String,
    joined_at: DateTime<Utc>,
    invited_by: Option<Uuid>,
    removed_at: Option<DateTime<Utc>>,
}

impl<'r> FromRow<'r, sqlx::postgres::PgRow> for MembershipRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            user_id: row.try_get("user_id")?,
            org_id: row.try_get("org_id")?,
            role: row.try_get("role")?,
            status: row.try_get("status")?,
            joined_at: row.try_get("joined_at")?,
            invited_by: row.try_get("invited_by")?,
            removed_at: row.try_get("removed_at")?,
        })
    }
}

impl MembershipRow {
    fn into_domain(self) -> Result<Membership, StoreError> {
        Ok(Membership {
            user_id: UserId::from_uuid(self.user_id),
            org_id: OrgId::from_uuid(self.org_id),
            role: parse_enum("role", &self.role)?,
            status: parse_enum("status", &self.status)?,
            joined_at: self.joined_at,
            invited_by: self.invited_by.map(UserId::from_uuid),
            removed_at: self.removed_at,
        })
    }
}

#[derive(Debug)]
struct InvitationRow {
    id: Uuid,
    org_id: Uuid,
    email: String,
    role: String,
    token: String,
    invited_by: Uuid,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    accepted: bool,
}

impl<'r> FromRow<'r, sqlx::postgres::PgRow> for InvitationRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            org_id: row.try_get("org_id")?,
            email: row.try_get("email")?,
            role: row.try_get("role")?,
            token: row.try_get("token")?,
            invited_by: row.try_get("invited_by")?,
            created_at: row.try_get("created_at")?,
            expires_at: row.try_get("expires_at")?,
            accepted: row.try_get("accepted")?,
        })
    }
}

impl InvitationRow {
    fn into_domain(self) -> Result<Invitation, StoreError> {
        Ok(Invitation {
            id: InvitationId::from_uuid(self.id),
            org_id: OrgId::from_uuid(self.org_id),
            email: self.email,
            role: parse_enum("role", &self.role)?,
            token: self.token,
            invited_by: UserId::from_uuid(self.invited_by),
            created_at: self.created_at,
            expires_at: self.expires_at,
            accepted: self.accepted,
        })
    }
}

#[derive(Debug)]
struct AuditRow {
    id: Uuid,
    org_id: Uuid,
    name: String,
    message: String,
    updated_by: Uuid,
    kind: String,
    recorded_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, sqlx::postgres::PgRow> for AuditRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            org_id: row.try_get("org_id")?,
            name: row.try_get("name")?,
            message: row.try_get("message")?,
            updated_by: row.try_get("updated_by")?,
            kind: row.try_get("kind")?,
            recorded_at: row.try_get("recorded_at")?,
        })
    }
}

impl AuditRow {
    fn into_domain(self) -> Result<AuditLogEntry, StoreError> {
        Ok(AuditLogEntry {
            id: AuditEntryId::from_uuid(self.id),
            org_id: OrgId::from_uuid(self.org_id),
            name: self.name,
            message: self.message,
            updated_by: UserId::from_uuid(self.updated_by),
            kind: parse_enum("kind", &self.kind)?,
            recorded_at: self.recorded_at,
        })
    }
}

fn parse_enum<T: core::str::FromStr>(column: &str, value: &str) -> Result<T, StoreError>
where
    T::Err: core::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| StoreError::Storage(format!("invalid {column} value '{value}': {e}")))
}
