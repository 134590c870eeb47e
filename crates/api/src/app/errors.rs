use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use atrium_directory::DirectoryError;

/// One mapping from the error taxonomy to HTTP, used by every handler.
///
/// Kinds stay stable so calling UIs can branch on them (e.g. offer
/// "resend invite" on `expired`, never on `forbidden`).
pub fn directory_error_to_response(err: DirectoryError) -> axum::response::Response {
    match err {
        DirectoryError::OrganizationNotFound => {
            json_error(StatusCode::NOT_FOUND, "organization_not_found", err.to_string())
        }
        DirectoryError::InvitationNotFound => {
            json_error(StatusCode::NOT_FOUND, "invitation_not_found", err.to_string())
        }
        DirectoryError::MembershipNotFound(_) => {
            json_error(StatusCode::NOT_FOUND, "membership_not_found", err.to_string())
        }
        DirectoryError::UserNotFound => {
            json_error(StatusCode::NOT_FOUND, "user_not_found", err.to_string())
        }
        // Membership absence and removal look identical from outside; we
        // don't reveal whether the organization exists.
        DirectoryError::NotAMember => {
            json_error(StatusCode::NOT_FOUND, "not_a_member", err.to_string())
        }
        DirectoryError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DirectoryError::Expired => json_error(StatusCode::GONE, "expired", err.to_string()),
        DirectoryError::AlreadyAccepted => {
            json_error(StatusCode::CONFLICT, "already_accepted", err.to_string())
        }
        DirectoryError::EmailMismatch => {
            json_error(StatusCode::FORBIDDEN, "email_mismatch", err.to_string())
        }
        DirectoryError::InvalidOrExpired => {
            json_error(StatusCode::NOT_FOUND, "invalid_or_expired", err.to_string())
        }
        DirectoryError::InsufficientPermission(_) => {
            json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string())
        }
        DirectoryError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        DirectoryError::Storage(msg) => {
            tracing::error!("storage failure: {msg}");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                "storage failure",
            )
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
