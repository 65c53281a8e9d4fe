use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{Deal, DealId, DealInput, Pipeline, PipelineId, Stage, StageId, StageInput};

/// CRM kanban: pipelines, stages and deals.
#[async_trait]
pub trait CrmRepository: Send + Sync {
    async fn list_pipelines(&self) -> RepositoryResult<Vec<Pipeline>>;

    async fn create_pipeline(&self, name: &str, is_default: bool) -> RepositoryResult<Pipeline>;

    /// Stages ordered by position, optionally restricted to one pipeline.
    async fn list_stages(&self, pipeline_id: Option<PipelineId>) -> RepositoryResult<Vec<Stage>>;

    async fn create_stage(&self, input: &StageInput) -> RepositoryResult<Stage>;

    async fn list_deals(&self) -> RepositoryResult<Vec<Deal>>;

    /// Insert a deal at the end of its stage.
    async fn create_deal(&self, input: &DealInput) -> RepositoryResult<Deal>;

    /// Move a deal to `stage_id` at `position`, renumbering both stages.
    async fn move_deal(
        &self,
        id: DealId,
        stage_id: StageId,
        position: usize,
    ) -> RepositoryResult<Deal>;

    async fn delete_deal(&self, id: DealId) -> RepositoryResult<()>;
}
