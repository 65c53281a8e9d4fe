//! Legacy financial tables: `transactions`, `transaction_types` and
//! `financial_recurring_configs`.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::error::RepositoryResult;
use crate::models::{
    PolicyId, RecurringConfig, RecurringConfigId, RecurringConfigInput, Transaction,
    TransactionInput, TransactionNature, TransactionType,
};

#[async_trait]
pub trait FinanceRepository: Send + Sync {
    /// List all transactions ordered by date, newest first.
    async fn list_transactions(&self) -> RepositoryResult<Vec<Transaction>>;

    async fn create_transaction(&self, input: &TransactionInput) -> RepositoryResult<Transaction>;

    /// Find the income transaction already generated for a policy, if any.
    ///
    /// Used to keep commission generation idempotent.
    async fn find_income_for_policy(
        &self,
        policy_id: PolicyId,
    ) -> RepositoryResult<Option<Transaction>>;

    async fn list_transaction_types(&self) -> RepositoryResult<Vec<TransactionType>>;

    async fn create_transaction_type(
        &self,
        name: &str,
        nature: TransactionNature,
    ) -> RepositoryResult<TransactionType>;

    // ==================== Recurring configurations ====================

    async fn list_recurring_configs(&self) -> RepositoryResult<Vec<RecurringConfig>>;

    async fn create_recurring_config(
        &self,
        input: &RecurringConfigInput,
    ) -> RepositoryResult<RecurringConfig>;

    async fn update_recurring_config(
        &self,
        config: &RecurringConfig,
    ) -> RepositoryResult<RecurringConfig>;

    async fn delete_recurring_config(&self, id: RecurringConfigId) -> RepositoryResult<()>;

    /// Record that the occurrence due on `date` was realized.
    async fn mark_recurring_realized(
        &self,
        id: RecurringConfigId,
        date: NaiveDate,
    ) -> RepositoryResult<RecurringConfig>;
}
