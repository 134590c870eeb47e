//! Caller-scoped routes.

use std::sync::Arc;

use axum::{
    Json, Router, extract::Extension, http::StatusCode, response::IntoResponse, routing::get,
};

use crate::app::{dto, errors, services::AppServices};
use crate::context::CallerIdentity;

pub fn router() -> Router {
    Router::new().route("/orgs", get(my_organizations))
}

/// GET /me/orgs - organizations the caller actively belongs to, for
/// org-switcher screens.
pub async fn my_organizations(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerIdentity>,
) -> axum::response::Response {
    match services
        .memberships
        .organizations_for_user(caller.user_id())
        .await
    {
        Ok(entries) => {
            let items: Vec<_> = entries
                .iter()
                .map(|(org, membership)| {
                    serde_json::json!({
                        "organization": dto::organization_to_json(org),
                        "role": membership.role.as_str(),
                    })
                })
                .collect();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::directory_error_to_response(e),
    }
}
