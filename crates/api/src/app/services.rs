//! Infrastructure wiring for the HTTP app.

use std::sync::Arc;

use atrium_directory::TracingNotifier;
use atrium_infra::directory_store::{
    DirectoryStore, InMemoryDirectoryStore, PostgresDirectoryStore,
};
use atrium_infra::services::{InvitationService, MembershipService};

/// Type-erased store handle shared by every service.
pub type SharedStore = Arc<dyn DirectoryStore>;

pub struct AppServices {
    pub store: SharedStore,
    pub memberships: MembershipService<SharedStore>,
    pub invitations: InvitationService<SharedStore, TracingNotifier>,
}

impl AppServices {
    pub fn with_store(store: SharedStore) -> Self {
        Self {
            memberships: MembershipService::new(store.clone()),
            invitations: InvitationService::new(store.clone(), TracingNotifier),
            store,
        }
    }
}

/// Pick the storage backend from the environment.
///
/// `DATABASE_URL` set → Postgres; otherwise the in-memory backend
/// (dev/test).
pub async fn build_services() -> AppServices {
    match std::env::var("DATABASE_URL") {
        Ok(url) => match sqlx::PgPool::connect(&url).await {
            Ok(pool) => {
                tracing::info!("directory store: postgres");
                AppServices::with_store(Arc::new(PostgresDirectoryStore::new(pool)))
            }
            Err(e) => {
                tracing::warn!("postgres unavailable ({e}); falling back to in-memory store");
                AppServices::with_store(Arc::new(InMemoryDirectoryStore::new()))
            }
        },
        Err(_) => {
            tracing::info!("directory store: in-memory");
            AppServices::with_store(Arc::new(InMemoryDirectoryStore::new()))
        }
    }
}
