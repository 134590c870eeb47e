use atrium_core::UserId;

/// Authenticated caller identity for a request.
///
/// Established by the auth middleware from verified session claims. The
/// target organization is *not* part of this: every tenant-scoped route
/// names its organization explicitly and resolves a
/// [`TenantContext`](atrium_directory::TenantContext) per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    user_id: UserId,
    email: String,
}

impl CallerIdentity {
    pub fn new(user_id: UserId, email: String) -> Self {
        Self { user_id, email }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}
