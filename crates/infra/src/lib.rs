//! `atrium-infra` — storage backends and tenant services.
//!
//! The [`directory_store`] module defines the durable store contract for the
//! four directory entities and ships an in-memory backend (tests/dev) and a
//! Postgres backend (production). The [`services`] module holds the
//! tenant-context resolver and the invitation/membership services that
//! every transport exposes.

pub mod directory_store;
pub mod services;

#[cfg(test)]
mod integration_tests;

pub use directory_store::{DirectoryStore, InMemoryDirectoryStore, PostgresDirectoryStore, StoreError};
pub use services::{InvitationService, MembershipService, resolve_tenant_context};
