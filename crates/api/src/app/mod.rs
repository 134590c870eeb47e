//! HTTP API application wiring (Axum router + service wiring).
//!
//! Folder layout:
//! - `services.rs`: infrastructure wiring (directory store backend, services)
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use atrium_directory::{Hs256SessionVerifier, SessionVerifier};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(session_secret: String) -> Router {
    let verifier = Arc::new(Hs256SessionVerifier::new(session_secret.as_bytes()));
    let services = Arc::new(services::build_services().await);
    build_app_with(verifier, services)
}

/// Router assembly with explicit wiring (tests inject their own backend).
pub fn build_app_with(
    verifier: Arc<dyn SessionVerifier>,
    services: Arc<services::AppServices>,
) -> Router {
    let auth_state = middleware::AuthState { verifier };

    // Protected routes: require a verified session.
    let protected = routes::router()
        .layer(Extension(services.clone()))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    // Public surface: liveness + token-bearer invitation lookup.
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::invitations::public_router().layer(Extension(services)))
        .merge(protected)
        .layer(ServiceBuilder::new())
}
