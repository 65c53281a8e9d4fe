//! Plain table access.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};

use super::{Order, QueryBuilder, RestRepository};
use crate::db::repository::{
    AgendaRepository, ClaimRepository, CrmRepository, FinanceRepository, PortfolioRepository,
    RepositoryResult,
};
use crate::models::*;
use crate::services::crm::reposition_deal;

const CLIENTS: &str = "clientes";
const POLICIES: &str = "apolices";
const COMPANIES: &str = "companies";
const PRODUCERS: &str = "producers";
const TRANSACTIONS: &str = "transactions";
const TRANSACTION_TYPES: &str = "transaction_types";
const RECURRING_CONFIGS: &str = "financial_recurring_configs";
const CLAIMS: &str = "sinistros";
const CLAIMS_VIEW: &str = "sinistros_complete";
const CLAIM_ACTIVITIES: &str = "sinistro_activities";
const APPOINTMENTS: &str = "appointments";
const PIPELINES: &str = "crm_pipelines";
const STAGES: &str = "crm_stages";
const DEALS: &str = "crm_deals";

#[async_trait]
impl PortfolioRepository for RestRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        let probe = QueryBuilder::new().select("id").limit(1);
        match self.select::<Value>(CLIENTS, &probe).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_retryable() => {
                log::warn!("Backend health check failed: {}", e);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn list_clients(&self) -> RepositoryResult<Vec<Client>> {
        self.select(CLIENTS, &QueryBuilder::new().order("name", Order::Asc))
            .await
    }

    async fn get_client(&self, id: ClientId) -> RepositoryResult<Client> {
        self.select_one(CLIENTS, QueryBuilder::new().eq("id", id))
            .await
    }

    async fn create_client(&self, input: &ClientInput) -> RepositoryResult<Client> {
        self.insert(CLIENTS, input).await
    }

    async fn update_client(&self, client: &Client) -> RepositoryResult<Client> {
        self.update_by_id(CLIENTS, client.id, client).await
    }

    async fn delete_client(&self, id: ClientId) -> RepositoryResult<()> {
        self.delete_by_id(CLIENTS, id).await
    }

    async fn list_policies(&self) -> RepositoryResult<Vec<Policy>> {
        let query = QueryBuilder::new().order("created_at", Order::Desc);
        let (mut policies, companies) = futures::try_join!(
            self.select::<Policy>(POLICIES, &query),
            self.list_companies()
        )?;
        for policy in &mut policies {
            policy.insurance_company_name = policy
                .insurance_company
                .and_then(|id| companies.iter().find(|c| c.id == id))
                .map(|c| c.name.clone());
        }
        Ok(policies)
    }

    async fn get_policy(&self, id: PolicyId) -> RepositoryResult<Policy> {
        let mut policy: Policy = self
            .select_one(POLICIES, QueryBuilder::new().eq("id", id))
            .await?;
        if let Some(company) = policy.insurance_company {
            policy.insurance_company_name = self.company_name(company).await?;
        }
        Ok(policy)
    }

    async fn create_policy(&self, input: &PolicyInput) -> RepositoryResult<Policy> {
        self.insert(POLICIES, input).await
    }

    async fn update_policy(&self, policy: &Policy) -> RepositoryResult<Policy> {
        let mut updated: Policy = self
            .update_by_id(POLICIES, policy.id, &PolicyUpdate::from(policy))
            .await?;
        updated.insurance_company_name = policy.insurance_company_name.clone();
        Ok(updated)
    }

    async fn delete_policy(&self, id: PolicyId) -> RepositoryResult<()> {
        self.delete_by_id(POLICIES, id).await
    }

    async fn list_companies(&self) -> RepositoryResult<Vec<Company>> {
        self.select(COMPANIES, &QueryBuilder::new().order("name", Order::Asc))
            .await
    }

    async fn create_company(&self, name: &str) -> RepositoryResult<Company> {
        self.insert(COMPANIES, &json!({ "name": name.trim() })).await
    }

    async fn list_producers(&self) -> RepositoryResult<Vec<Producer>> {
        self.select(PRODUCERS, &QueryBuilder::new().order("name", Order::Asc))
            .await
    }
}

#[async_trait]
impl FinanceRepository for RestRepository {
    async fn list_transactions(&self) -> RepositoryResult<Vec<Transaction>> {
        self.select(
            TRANSACTIONS,
            &QueryBuilder::new()
                .order("date", Order::Desc)
                .order("created_at", Order::Desc),
        )
        .await
    }

    async fn create_transaction(&self, input: &TransactionInput) -> RepositoryResult<Transaction> {
        self.insert(TRANSACTIONS, input).await
    }

    async fn find_income_for_policy(
        &self,
        policy_id: PolicyId,
    ) -> RepositoryResult<Option<Transaction>> {
        let query = QueryBuilder::new()
            .eq("policy_id", policy_id)
            .in_list("nature", &["RECEITA", "GANHO"])
            .limit(1);
        Ok(self
            .select::<Transaction>(TRANSACTIONS, &query)
            .await?
            .into_iter()
            .next())
    }

    async fn list_transaction_types(&self) -> RepositoryResult<Vec<TransactionType>> {
        self.select(
            TRANSACTION_TYPES,
            &QueryBuilder::new().order("name", Order::Asc),
        )
        .await
    }

    async fn create_transaction_type(
        &self,
        name: &str,
        nature: TransactionNature,
    ) -> RepositoryResult<TransactionType> {
        self.insert(TRANSACTION_TYPES, &json!({ "name": name, "nature": nature }))
            .await
    }

    async fn list_recurring_configs(&self) -> RepositoryResult<Vec<RecurringConfig>> {
        self.select(
            RECURRING_CONFIGS,
            &QueryBuilder::new().order("name", Order::Asc),
        )
        .await
    }

    async fn create_recurring_config(
        &self,
        input: &RecurringConfigInput,
    ) -> RepositoryResult<RecurringConfig> {
        self.insert(RECURRING_CONFIGS, input).await
    }

    async fn update_recurring_config(
        &self,
        config: &RecurringConfig,
    ) -> RepositoryResult<RecurringConfig> {
        self.update_by_id(RECURRING_CONFIGS, config.id, config).await
    }

    async fn delete_recurring_config(&self, id: RecurringConfigId) -> RepositoryResult<()> {
        self.delete_by_id(RECURRING_CONFIGS, id).await
    }

    async fn mark_recurring_realized(
        &self,
        id: RecurringConfigId,
        date: NaiveDate,
    ) -> RepositoryResult<RecurringConfig> {
        let config: RecurringConfig = self
            .select_one(RECURRING_CONFIGS, QueryBuilder::new().eq("id", id))
            .await?;
        if config.last_generated_date.is_some_and(|d| d >= date) {
            return Ok(config);
        }
        self.update_by_id(
            RECURRING_CONFIGS,
            id,
            &json!({ "last_generated_date": date }),
        )
        .await
    }
}

#[async_trait]
impl ClaimRepository for RestRepository {
    async fn list_claims(&self) -> RepositoryResult<Vec<Claim>> {
        self.select(
            CLAIMS_VIEW,
            &QueryBuilder::new().order("created_at", Order::Desc),
        )
        .await
    }

    async fn get_claim(&self, id: ClaimId) -> RepositoryResult<Claim> {
        self.select_one(CLAIMS_VIEW, QueryBuilder::new().eq("id", id))
            .await
    }

    async fn create_claim(&self, input: &ClaimInput) -> RepositoryResult<Claim> {
        let claim: Claim = self
            .insert(CLAIMS, &input.clone().into_claim(Utc::now().date_naive()))
            .await?;
        self.add_claim_activity(&ClaimActivity::new(
            claim.id,
            ActivityType::Created,
            "Sinistro registrado",
        ))
        .await?;
        Ok(claim)
    }

    async fn update_claim(&self, id: ClaimId, update: &ClaimUpdate) -> RepositoryResult<Claim> {
        let mut body = serde_json::to_value(update)?;
        if let Value::Object(map) = &mut body {
            map.insert("updated_at".to_string(), json!(Utc::now()));
        }
        self.update_by_id(CLAIMS, id, &body).await
    }

    async fn delete_claim(&self, id: ClaimId) -> RepositoryResult<()> {
        self.delete_by_id(CLAIMS, id).await
    }

    async fn list_claim_activities(&self, id: ClaimId) -> RepositoryResult<Vec<ClaimActivity>> {
        self.select(
            CLAIM_ACTIVITIES,
            &QueryBuilder::new()
                .eq("claim_id", id)
                .order("created_at", Order::Asc),
        )
        .await
    }

    async fn add_claim_activity(&self, activity: &ClaimActivity) -> RepositoryResult<ClaimActivity> {
        self.insert(CLAIM_ACTIVITIES, activity).await
    }
}

#[async_trait]
impl AgendaRepository for RestRepository {
    async fn list_appointments(&self) -> RepositoryResult<Vec<Appointment>> {
        self.select(
            APPOINTMENTS,
            &QueryBuilder::new()
                .order("date", Order::Asc)
                .order("time", Order::Asc),
        )
        .await
    }

    async fn create_appointment(&self, input: &AppointmentInput) -> RepositoryResult<Appointment> {
        self.insert(APPOINTMENTS, input).await
    }

    async fn update_appointment(&self, appointment: &Appointment) -> RepositoryResult<Appointment> {
        self.update_by_id(APPOINTMENTS, appointment.id, appointment)
            .await
    }

    async fn delete_appointment(&self, id: AppointmentId) -> RepositoryResult<()> {
        self.delete_by_id(APPOINTMENTS, id).await
    }
}

#[async_trait]
impl CrmRepository for RestRepository {
    async fn list_pipelines(&self) -> RepositoryResult<Vec<Pipeline>> {
        self.select(
            PIPELINES,
            &QueryBuilder::new().order("position", Order::Asc),
        )
        .await
    }

    async fn create_pipeline(&self, name: &str, is_default: bool) -> RepositoryResult<Pipeline> {
        let existing = self.list_pipelines().await?;
        let is_default = is_default || existing.is_empty();
        if is_default {
            self.update::<_, Value>(
                PIPELINES,
                &QueryBuilder::new().eq("is_default", true),
                &json!({ "is_default": false }),
            )
            .await?;
        }
        self.insert(
            PIPELINES,
            &json!({
                "name": name.trim(),
                "is_default": is_default,
                "position": existing.len(),
            }),
        )
        .await
    }

    async fn list_stages(&self, pipeline_id: Option<PipelineId>) -> RepositoryResult<Vec<Stage>> {
        let mut query = QueryBuilder::new();
        if let Some(pipeline_id) = pipeline_id {
            query = query.eq("pipeline_id", pipeline_id);
        }
        self.select(STAGES, &query.order("position", Order::Asc))
            .await
    }

    async fn create_stage(&self, input: &StageInput) -> RepositoryResult<Stage> {
        let position = match input.position {
            Some(p) => p,
            None => self.list_stages(input.pipeline_id).await?.len() as i32,
        };
        self.insert(
            STAGES,
            &json!({
                "pipeline_id": input.pipeline_id,
                "name": input.name.trim(),
                "color": input.color,
                "position": position,
            }),
        )
        .await
    }

    async fn list_deals(&self) -> RepositoryResult<Vec<Deal>> {
        self.select(
            DEALS,
            &QueryBuilder::new()
                .order("stage_id", Order::Asc)
                .order("position", Order::Asc),
        )
        .await
    }

    async fn create_deal(&self, input: &DealInput) -> RepositoryResult<Deal> {
        let in_stage: Vec<Value> = self
            .select(
                DEALS,
                &QueryBuilder::new().select("id").eq("stage_id", input.stage_id),
            )
            .await?;
        let deal = input.clone().into_deal(in_stage.len() as i32);
        self.insert(DEALS, &deal).await
    }

    async fn move_deal(
        &self,
        id: DealId,
        stage_id: StageId,
        position: usize,
    ) -> RepositoryResult<Deal> {
        let current: Deal = self
            .select_one(DEALS, QueryBuilder::new().eq("id", id))
            .await?;
        let mut affected: Vec<Deal> = self
            .select(
                DEALS,
                &QueryBuilder::new().in_list("stage_id", &[current.stage_id, stage_id]),
            )
            .await?;
        let before = affected.clone();
        let moved = reposition_deal(&mut affected, id, stage_id, position).ok_or_else(|| {
            crate::db::repository::RepositoryError::not_found(format!("crm_deals {} not found", id))
        })?;

        let now = Utc::now();
        for deal in &affected {
            let unchanged = before
                .iter()
                .any(|b| b.id == deal.id && b.stage_id == deal.stage_id && b.position == deal.position);
            if unchanged {
                continue;
            }
            self.update::<_, Value>(
                DEALS,
                &QueryBuilder::new().eq("id", deal.id),
                &json!({
                    "stage_id": deal.stage_id,
                    "position": deal.position,
                    "updated_at": now,
                }),
            )
            .await?;
        }
        Ok(Deal {
            updated_at: now,
            ..moved
        })
    }

    async fn delete_deal(&self, id: DealId) -> RepositoryResult<()> {
        self.delete_by_id(DEALS, id).await
    }
}
