//! Double-entry ledger contracts.
//!
//! Each method maps to one backend procedure (named in the method docs). The
//! procedures own the bookkeeping rules; implementations only marshal
//! arguments and results.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::error::RepositoryResult;
use crate::models::{
    AccountBalance, AccountId, AccountInput, BulkImportResult, BulkMovementRow, CashFlowGranularity,
    CashFlowPoint, CommissionRegistration, CommissionRegistrationResult, DreRow, FinancialAccount,
    LedgerTransactionId, MovementInput, ReverseResult, SettleResult, SummaryComparison,
    TransactionWithEntries,
};

/// Direction filter for `get_recent_financial_transactions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Revenue,
    Expense,
}

#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Chart of accounts, active and archived.
    async fn list_accounts(&self) -> RepositoryResult<Vec<FinancialAccount>>;

    /// `ensure_default_financial_accounts`: create the system accounts when
    /// missing. Idempotent.
    async fn ensure_default_accounts(&self) -> RepositoryResult<Vec<FinancialAccount>>;

    async fn create_account(&self, input: &AccountInput) -> RepositoryResult<FinancialAccount>;

    /// `archive_financial_account`. System accounts cannot be archived.
    async fn archive_account(&self, id: AccountId) -> RepositoryResult<bool>;

    /// `create_financial_movement`: post a balanced set of entries.
    ///
    /// # Returns
    /// * `Ok(LedgerTransactionId)` - Id of the new transaction header
    /// * `Err(RepositoryError::ValidationError)` - Unbalanced entries or unusable accounts
    async fn create_financial_movement(
        &self,
        movement: &MovementInput,
    ) -> RepositoryResult<LedgerTransactionId>;

    /// `get_recent_financial_transactions`
    async fn get_recent_transactions(
        &self,
        limit: usize,
        offset: usize,
        kind: Option<MovementKind>,
    ) -> RepositoryResult<Vec<TransactionWithEntries>>;

    /// `void_financial_transaction`: create a reversal for a posted movement.
    ///
    /// A failed reversal is reported through `ReverseResult::success`, not as
    /// an error.
    async fn void_transaction(
        &self,
        id: LedgerTransactionId,
        reason: &str,
    ) -> RepositoryResult<ReverseResult>;

    /// `get_account_balances`
    async fn get_account_balances(&self) -> RepositoryResult<Vec<AccountBalance>>;

    /// `get_financial_summary` for the inclusive period.
    async fn get_financial_summary(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<SummaryComparison>;

    /// `get_cash_flow_data`
    async fn get_cash_flow(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        granularity: CashFlowGranularity,
    ) -> RepositoryResult<Vec<CashFlowPoint>>;

    /// `get_dre_data`
    async fn get_dre(&self, year: i32) -> RepositoryResult<Vec<DreRow>>;

    /// `settle_commission_transaction`: confirm a pending receivable into a
    /// bank account.
    async fn settle_commission(
        &self,
        id: LedgerTransactionId,
        bank_account_id: AccountId,
    ) -> RepositoryResult<SettleResult>;

    /// `register_policy_commission`. Idempotent per policy.
    async fn register_policy_commission(
        &self,
        registration: &CommissionRegistration,
    ) -> RepositoryResult<CommissionRegistrationResult>;

    /// `bulk_create_financial_movements`: one movement per row against a
    /// single asset account. Row failures are collected, not raised.
    async fn bulk_create_movements(
        &self,
        asset_account_id: AccountId,
        rows: &[BulkMovementRow],
    ) -> RepositoryResult<BulkImportResult>;
}
