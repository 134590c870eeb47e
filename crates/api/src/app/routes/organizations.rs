//! Organization-scoped routes: org lifecycle, members, invitations, audit.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use chrono::Utc;

use atrium_core::UserId;
use atrium_directory::caps;

use crate::app::routes::common;
use crate::app::{dto, errors, services::AppServices};
use crate::context::CallerIdentity;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_organization))
        .route(
            "/:org_id",
            get(get_organization)
                .patch(update_organization)
                .delete(delete_organization),
        )
        .route("/:org_id/members", get(list_members))
        .route("/:org_id/members/roles", put(bulk_update_roles))
        .route("/:org_id/members/:user_id", delete(remove_member))
        .route(
            "/:org_id/invitations",
            post(create_invitation).get(list_invitations),
        )
        .route("/:org_id/audit", get(audit_log))
}

/// POST /orgs - any authenticated caller may create an organization and
/// becomes its owner.
pub async fn create_organization(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerIdentity>,
    Json(body): Json<dto::CreateOrganizationRequest>,
) -> axum::response::Response {
    match services
        .memberships
        .create_organization(caller.user_id(), body.into_attrs(), Utc::now())
        .await
    {
        Ok(org) => (StatusCode::CREATED, Json(dto::organization_to_json(&org))).into_response(),
        Err(e) => errors::directory_error_to_response(e),
    }
}

pub async fn get_organization(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerIdentity>,
    Path(org_id): Path<String>,
) -> axum::response::Response {
    let ctx = match common::scope(&services, &caller, &org_id, &caps::ORG_READ).await {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };

    match services.memberships.get_organization(&ctx).await {
        Ok(org) => (StatusCode::OK, Json(dto::organization_to_json(&org))).into_response(),
        Err(e) => errors::directory_error_to_response(e),
    }
}

pub async fn update_organization(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerIdentity>,
    Path(org_id): Path<String>,
    Json(body): Json<dto::UpdateOrganizationRequest>,
) -> axum::response::Response {
    let ctx = match common::scope(&services, &caller, &org_id, &caps::ORG_UPDATE).await {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };

    match services
        .memberships
        .update_organization(&ctx, body.into_patch())
        .await
    {
        Ok(org) => (StatusCode::OK, Json(dto::organization_to_json(&org))).into_response(),
        Err(e) => errors::directory_error_to_response(e),
    }
}

pub async fn delete_organization(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerIdentity>,
    Path(org_id): Path<String>,
) -> axum::response::Response {
    let ctx = match common::scope(&services, &caller, &org_id, &caps::ORG_DELETE).await {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };

    match services.memberships.delete_organization(&ctx).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::directory_error_to_response(e),
    }
}

pub async fn list_members(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerIdentity>,
    Path(org_id): Path<String>,
) -> axum::response::Response {
    let ctx = match common::scope(&services, &caller, &org_id, &caps::MEMBERS_READ).await {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };

    match services.memberships.list_members(&ctx).await {
        Ok(members) => {
            let items: Vec<_> = members.iter().map(dto::membership_to_json).collect();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::directory_error_to_response(e),
    }
}

/// PUT /orgs/:org_id/members/roles - all-or-nothing role batch + audit
/// entry.
pub async fn bulk_update_roles(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerIdentity>,
    Path(org_id): Path<String>,
    Json(body): Json<dto::BulkRoleUpdateRequest>,
) -> axum::response::Response {
    let ctx = match common::scope(&services, &caller, &org_id, &caps::MEMBERS_MANAGE_ROLES).await {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };

    let updates: Vec<_> = body
        .updates
        .into_iter()
        .map(|(user_id, role)| (UserId::from_uuid(user_id), role))
        .collect();

    match services
        .memberships
        .bulk_update_roles(&ctx, updates, Utc::now())
        .await
    {
        Ok(audit) => (StatusCode::OK, Json(dto::audit_entry_to_json(&audit))).into_response(),
        Err(e) => errors::directory_error_to_response(e),
    }
}

pub async fn remove_member(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerIdentity>,
    Path((org_id, user_id)): Path<(String, String)>,
) -> axum::response::Response {
    let ctx = match common::scope(&services, &caller, &org_id, &caps::MEMBERS_REMOVE).await {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };

    let target = match user_id.parse::<UserId>() {
        Ok(id) => id,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid user id");
        }
    };

    match services.memberships.remove_member(&ctx, target, Utc::now()).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::directory_error_to_response(e),
    }
}

pub async fn create_invitation(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerIdentity>,
    Path(org_id): Path<String>,
    Json(body): Json<dto::CreateInvitationRequest>,
) -> axum::response::Response {
    let ctx = match common::scope(&services, &caller, &org_id, &caps::INVITES_CREATE).await {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };

    match services
        .invitations
        .create(&ctx, &body.email, body.role, Utc::now())
        .await
    {
        Ok(invitation) => {
            // The creator gets the token back; listings never include it.
            let mut payload = dto::invitation_to_json(&invitation);
            payload["token"] = serde_json::Value::String(invitation.token.clone());
            (StatusCode::CREATED, Json(payload)).into_response()
        }
        Err(e) => errors::directory_error_to_response(e),
    }
}

pub async fn list_invitations(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerIdentity>,
    Path(org_id): Path<String>,
) -> axum::response::Response {
    let ctx = match common::scope(&services, &caller, &org_id, &caps::INVITES_READ).await {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };

    match services.invitations.list_for_org(&ctx).await {
        Ok(invitations) => {
            let items: Vec<_> = invitations.iter().map(dto::invitation_to_json).collect();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::directory_error_to_response(e),
    }
}

pub async fn audit_log(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerIdentity>,
    Path(org_id): Path<String>,
) -> axum::response::Response {
    let ctx = match common::scope(&services, &caller, &org_id, &caps::AUDIT_READ).await {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };

    match services.memberships.audit_log(&ctx).await {
        Ok(entries) => {
            let items: Vec<_> = entries.iter().map(dto::audit_entry_to_json).collect();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::directory_error_to_response(e),
    }
}
