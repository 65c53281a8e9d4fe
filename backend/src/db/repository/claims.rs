use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{Claim, ClaimActivity, ClaimId, ClaimInput, ClaimUpdate};

/// Claims (`sinistros`) and their activity timeline.
#[async_trait]
pub trait ClaimRepository: Send + Sync {
    async fn list_claims(&self) -> RepositoryResult<Vec<Claim>>;

    async fn get_claim(&self, id: ClaimId) -> RepositoryResult<Claim>;

    /// Insert a claim and its `Criação` activity.
    async fn create_claim(&self, input: &ClaimInput) -> RepositoryResult<Claim>;

    async fn update_claim(&self, id: ClaimId, update: &ClaimUpdate) -> RepositoryResult<Claim>;

    async fn delete_claim(&self, id: ClaimId) -> RepositoryResult<()>;

    /// Activities for a claim, oldest first.
    async fn list_claim_activities(&self, id: ClaimId) -> RepositoryResult<Vec<ClaimActivity>>;

    async fn add_claim_activity(&self, activity: &ClaimActivity) -> RepositoryResult<ClaimActivity>;
}
