use async_trait::async_trait;
use chrono::Utc;

use super::{missing_reference, not_found, LocalRepository};
use crate::db::repository::{CrmRepository, ErrorContext, RepositoryError, RepositoryResult};
use crate::models::*;
use crate::services::crm::reposition_deal;

#[async_trait]
impl CrmRepository for LocalRepository {
    async fn list_pipelines(&self) -> RepositoryResult<Vec<Pipeline>> {
        self.check_health()?;
        let mut pipelines: Vec<Pipeline> = self.data.read().pipelines.values().cloned().collect();
        pipelines.sort_by_key(|p| p.position);
        Ok(pipelines)
    }

    async fn create_pipeline(&self, name: &str, is_default: bool) -> RepositoryResult<Pipeline> {
        self.check_health()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(RepositoryError::validation_with_context(
                "Pipeline name is required",
                ErrorContext::new("create_pipeline").with_code("23502"),
            ));
        }
        let mut data = self.data.write();
        // First pipeline is always the default one.
        let is_default = is_default || data.pipelines.is_empty();
        if is_default {
            for pipeline in data.pipelines.values_mut() {
                pipeline.is_default = false;
            }
        }
        let pipeline = Pipeline {
            id: PipelineId::new(),
            name: name.to_string(),
            is_default,
            position: data.pipelines.len() as i32,
        };
        data.pipelines.insert(pipeline.id, pipeline.clone());
        Ok(pipeline)
    }

    async fn list_stages(&self, pipeline_id: Option<PipelineId>) -> RepositoryResult<Vec<Stage>> {
        self.check_health()?;
        let mut stages: Vec<Stage> = self
            .data
            .read()
            .stages
            .values()
            .filter(|s| pipeline_id.is_none_or(|p| s.pipeline_id == Some(p)))
            .cloned()
            .collect();
        stages.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.name.cmp(&b.name)));
        Ok(stages)
    }

    async fn create_stage(&self, input: &StageInput) -> RepositoryResult<Stage> {
        self.check_health()?;
        let mut data = self.data.write();
        if let Some(pipeline_id) = input.pipeline_id {
            if !data.pipelines.contains_key(&pipeline_id) {
                return Err(missing_reference("pipeline", pipeline_id));
            }
        }
        let position = input.position.unwrap_or_else(|| {
            data.stages
                .values()
                .filter(|s| s.pipeline_id == input.pipeline_id)
                .count() as i32
        });
        let stage = Stage {
            id: StageId::new(),
            pipeline_id: input.pipeline_id,
            name: input.name.trim().to_string(),
            color: input.color.clone(),
            position,
        };
        data.stages.insert(stage.id, stage.clone());
        Ok(stage)
    }

    async fn list_deals(&self) -> RepositoryResult<Vec<Deal>> {
        self.check_health()?;
        let mut deals: Vec<Deal> = self.data.read().deals.values().cloned().collect();
        deals.sort_by(|a, b| {
            a.stage_id
                .to_string()
                .cmp(&b.stage_id.to_string())
                .then(a.position.cmp(&b.position))
        });
        Ok(deals)
    }

    async fn create_deal(&self, input: &DealInput) -> RepositoryResult<Deal> {
        self.check_health()?;
        let mut data = self.data.write();
        if !data.stages.contains_key(&input.stage_id) {
            return Err(missing_reference("crm_stage", input.stage_id));
        }
        let position = data
            .deals
            .values()
            .filter(|d| d.stage_id == input.stage_id)
            .count() as i32;
        let deal = input.clone().into_deal(position);
        data.deals.insert(deal.id, deal.clone());
        Ok(deal)
    }

    async fn move_deal(
        &self,
        id: DealId,
        stage_id: StageId,
        position: usize,
    ) -> RepositoryResult<Deal> {
        self.check_health()?;
        let mut data = self.data.write();
        if !data.stages.contains_key(&stage_id) {
            return Err(missing_reference("crm_stage", stage_id));
        }
        let mut deals: Vec<Deal> = data.deals.values().cloned().collect();
        let moved = reposition_deal(&mut deals, id, stage_id, position)
            .ok_or_else(|| not_found("crm_deal", id))?;

        let now = Utc::now();
        for mut deal in deals {
            if let Some(current) = data.deals.get(&deal.id) {
                if current.stage_id != deal.stage_id || current.position != deal.position {
                    deal.updated_at = now;
                }
            }
            data.deals.insert(deal.id, deal);
        }
        Ok(data.deals.get(&moved.id).cloned().unwrap_or(moved))
    }

    async fn delete_deal(&self, id: DealId) -> RepositoryResult<()> {
        self.check_health()?;
        self.data
            .write()
            .deals
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("crm_deal", id))
    }
}
