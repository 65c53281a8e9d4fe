use async_trait::async_trait;
use chrono::NaiveDate;

use super::{not_found, LocalRepository};
use crate::db::repository::{ErrorContext, FinanceRepository, RepositoryError, RepositoryResult};
use crate::models::*;

#[async_trait]
impl FinanceRepository for LocalRepository {
    async fn list_transactions(&self) -> RepositoryResult<Vec<Transaction>> {
        self.check_health()?;
        let mut txs: Vec<Transaction> = self.data.read().transactions.values().cloned().collect();
        txs.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        Ok(txs)
    }

    async fn create_transaction(&self, input: &TransactionInput) -> RepositoryResult<Transaction> {
        self.check_health()?;
        let mut data = self.data.write();
        if let Some(type_id) = input.type_id {
            if !data.transaction_types.contains_key(&type_id) {
                return Err(super::missing_reference("transaction_type", type_id));
            }
        }
        let tx = input.clone().into_transaction();
        data.transactions.insert(tx.id, tx.clone());
        Ok(tx)
    }

    async fn find_income_for_policy(
        &self,
        policy_id: PolicyId,
    ) -> RepositoryResult<Option<Transaction>> {
        self.check_health()?;
        Ok(self
            .data
            .read()
            .transactions
            .values()
            .find(|t| t.policy_id == Some(policy_id) && t.is_income())
            .cloned())
    }

    async fn list_transaction_types(&self) -> RepositoryResult<Vec<TransactionType>> {
        self.check_health()?;
        let mut types: Vec<TransactionType> =
            self.data.read().transaction_types.values().cloned().collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(types)
    }

    async fn create_transaction_type(
        &self,
        name: &str,
        nature: TransactionNature,
    ) -> RepositoryResult<TransactionType> {
        self.check_health()?;
        let mut data = self.data.write();
        if data
            .transaction_types
            .values()
            .any(|t| t.name.eq_ignore_ascii_case(name) && t.nature == nature)
        {
            return Err(RepositoryError::validation_with_context(
                format!("duplicate key value: transaction_type={}", name),
                ErrorContext::new("create_transaction_type").with_code("23505"),
            ));
        }
        let tt = TransactionType {
            id: TransactionTypeId::new(),
            name: name.to_string(),
            nature,
        };
        data.transaction_types.insert(tt.id, tt.clone());
        Ok(tt)
    }

    async fn list_recurring_configs(&self) -> RepositoryResult<Vec<RecurringConfig>> {
        self.check_health()?;
        let mut configs: Vec<RecurringConfig> =
            self.data.read().recurring_configs.values().cloned().collect();
        configs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(configs)
    }

    async fn create_recurring_config(
        &self,
        input: &RecurringConfigInput,
    ) -> RepositoryResult<RecurringConfig> {
        self.check_health()?;
        let config = input.clone().into_config();
        self.data
            .write()
            .recurring_configs
            .insert(config.id, config.clone());
        Ok(config)
    }

    async fn update_recurring_config(
        &self,
        config: &RecurringConfig,
    ) -> RepositoryResult<RecurringConfig> {
        self.check_health()?;
        let mut data = self.data.write();
        let slot = data
            .recurring_configs
            .get_mut(&config.id)
            .ok_or_else(|| not_found("recurring_config", config.id))?;
        *slot = config.clone();
        Ok(config.clone())
    }

    async fn delete_recurring_config(&self, id: RecurringConfigId) -> RepositoryResult<()> {
        self.check_health()?;
        self.data
            .write()
            .recurring_configs
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("recurring_config", id))
    }

    async fn mark_recurring_realized(
        &self,
        id: RecurringConfigId,
        date: NaiveDate,
    ) -> RepositoryResult<RecurringConfig> {
        self.check_health()?;
        let mut data = self.data.write();
        let config = data
            .recurring_configs
            .get_mut(&id)
            .ok_or_else(|| not_found("recurring_config", id))?;
        if config.last_generated_date.map_or(true, |d| d < date) {
            config.last_generated_date = Some(date);
        }
        Ok(config.clone())
    }
}
