use axum::Router;

pub mod common;
pub mod invitations;
pub mod me;
pub mod organizations;
pub mod system;

/// Routes behind the auth middleware.
pub fn router() -> Router {
    Router::new()
        .nest("/orgs", organizations::router())
        .nest("/me", me::router())
        .merge(invitations::router())
}
