//! Clients, policies and their reference tables.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{
    Client, ClientId, ClientInput, Company, CompanyId, Policy, PolicyId, PolicyInput, Producer,
};

/// Repository trait for the brokerage portfolio (clients and policies).
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait PortfolioRepository: Send + Sync {
    // ==================== Health & Connection ====================

    /// Check if the backend is reachable.
    ///
    /// # Returns
    /// - `Ok(true)` if the backend is healthy
    /// - `Ok(false)` if it answered but reported itself unhealthy
    /// - `Err(RepositoryError)` if the check could not be performed
    async fn health_check(&self) -> RepositoryResult<bool>;

    // ==================== Clients ====================

    /// List all clients visible to the current user, ordered by name.
    async fn list_clients(&self) -> RepositoryResult<Vec<Client>>;

    /// Retrieve a single client.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the client doesn't exist
    async fn get_client(&self, id: ClientId) -> RepositoryResult<Client>;

    async fn create_client(&self, input: &ClientInput) -> RepositoryResult<Client>;

    /// Replace the editable fields of an existing client.
    async fn update_client(&self, client: &Client) -> RepositoryResult<Client>;

    async fn delete_client(&self, id: ClientId) -> RepositoryResult<()>;

    // ==================== Policies ====================

    /// List all policies, newest first, with the insurer name resolved.
    async fn list_policies(&self) -> RepositoryResult<Vec<Policy>>;

    /// Retrieve a single policy.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the policy doesn't exist
    async fn get_policy(&self, id: PolicyId) -> RepositoryResult<Policy>;

    /// Insert a policy.
    ///
    /// A duplicate policy number for the same insurer is rejected with code
    /// `23505`.
    async fn create_policy(&self, input: &PolicyInput) -> RepositoryResult<Policy>;

    async fn update_policy(&self, policy: &Policy) -> RepositoryResult<Policy>;

    async fn delete_policy(&self, id: PolicyId) -> RepositoryResult<()>;

    // ==================== Reference data ====================

    async fn list_companies(&self) -> RepositoryResult<Vec<Company>>;

    async fn create_company(&self, name: &str) -> RepositoryResult<Company>;

    /// Resolve a company name, if the id is known.
    async fn company_name(&self, id: CompanyId) -> RepositoryResult<Option<String>> {
        Ok(self
            .list_companies()
            .await?
            .into_iter()
            .find(|c| c.id == id)
            .map(|c| c.name))
    }

    async fn list_producers(&self) -> RepositoryResult<Vec<Producer>>;
}
