use std::sync::Arc;

use axum::http::StatusCode;

use atrium_core::OrgId;
use atrium_directory::{Capability, TenantContext, require_capability};
use atrium_infra::services::resolve_tenant_context;

use crate::app::{errors, services::AppServices};
use crate::context::CallerIdentity;

/// Parse the `:org_id` path segment.
pub fn parse_org_id(raw: &str) -> Result<OrgId, axum::response::Response> {
    raw.parse::<OrgId>().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid organization id")
    })
}

/// Resolve the caller's tenant context for the named organization and
/// check the required capability.
///
/// Every tenant-scoped handler goes through this before touching any
/// organization-scoped record.
pub async fn scope(
    services: &Arc<AppServices>,
    caller: &CallerIdentity,
    raw_org_id: &str,
    required: &Capability,
) -> Result<TenantContext, axum::response::Response> {
    let org_id = parse_org_id(raw_org_id)?;

    let ctx = resolve_tenant_context(&services.store, caller.user_id(), org_id)
        .await
        .map_err(errors::directory_error_to_response)?;

    require_capability(&ctx, required).map_err(errors::directory_error_to_response)?;

    Ok(ctx)
}
