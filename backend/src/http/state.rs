//! Application state for the HTTP server.

use std::sync::Arc;

use crate::auth::{AuthProvider, AuthService};
use crate::db::repository::FullRepository;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for backend operations
    pub repository: Arc<dyn FullRepository>,
    /// Rate-limited auth front
    pub auth: AuthService,
}

impl AppState {
    /// Create a new application state with the given repository and auth
    /// provider.
    pub fn new(repository: Arc<dyn FullRepository>, auth_provider: Arc<dyn AuthProvider>) -> Self {
        Self {
            repository,
            auth: AuthService::new(auth_provider),
        }
    }

    pub fn with_auth(repository: Arc<dyn FullRepository>, auth: AuthService) -> Self {
        Self { repository, auth }
    }
}
