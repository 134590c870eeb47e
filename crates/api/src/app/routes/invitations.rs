//! Token-addressed invitation routes.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use crate::app::{dto, errors, services::AppServices};
use crate::context::CallerIdentity;

/// Token-bearer lookup; no session required.
pub fn public_router() -> Router {
    Router::new().route("/invitations/:token", get(get_by_token))
}

/// Acceptance requires the invited identity's session.
pub fn router() -> Router {
    Router::new().route("/invitations/:token/accept", post(accept))
}

/// GET /invitations/:token - "view your invite" display data.
pub async fn get_by_token(
    Extension(services): Extension<Arc<AppServices>>,
    Path(token): Path<String>,
) -> axum::response::Response {
    match services.invitations.get_by_token(&token, Utc::now()).await {
        Ok((invitation, organization_name)) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "invitation": dto::invitation_to_json(&invitation),
                "organization_name": organization_name,
            })),
        )
            .into_response(),
        Err(e) => errors::directory_error_to_response(e),
    }
}

/// POST /invitations/:token/accept - join the organization and return its
/// id so the caller can switch tenant context.
pub async fn accept(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerIdentity>,
    Path(token): Path<String>,
) -> axum::response::Response {
    match services
        .invitations
        .accept(caller.user_id(), caller.email(), &token, Utc::now())
        .await
    {
        Ok(org_id) => (
            StatusCode::OK,
            Json(serde_json::json!({ "organization_id": org_id.to_string() })),
        )
            .into_response(),
        Err(e) => errors::directory_error_to_response(e),
    }
}
