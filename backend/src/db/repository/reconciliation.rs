use async_trait::async_trait;
use chrono::NaiveDate;

use super::error::RepositoryResult;
use crate::models::{
    BankAccountId, BankStatementEntry, KpisComparison, LedgerTransactionId, MatchSuggestion,
    StatementEntryId, StatementEntryInput, StatementImportResult,
};

/// Bank statement import and matching against the ledger.
#[async_trait]
pub trait ReconciliationRepository: Send + Sync {
    /// `import_bank_statement_batch`.
    ///
    /// Re-importing the same batch fails with code `23505`.
    async fn import_statement(
        &self,
        bank_account_id: BankAccountId,
        file_name: &str,
        entries: &[StatementEntryInput],
    ) -> RepositoryResult<StatementImportResult>;

    async fn list_statement_entries(
        &self,
        bank_account_id: Option<BankAccountId>,
    ) -> RepositoryResult<Vec<BankStatementEntry>>;

    /// `suggest_reconciliation_matches`
    async fn suggest_matches(
        &self,
        bank_account_id: Option<BankAccountId>,
    ) -> RepositoryResult<Vec<MatchSuggestion>>;

    /// `reconcile_transactions`: link a statement entry to a ledger movement.
    async fn reconcile(
        &self,
        statement_entry_id: StatementEntryId,
        transaction_id: LedgerTransactionId,
    ) -> RepositoryResult<bool>;

    /// `unreconcile_transaction`
    async fn unreconcile(&self, statement_entry_id: StatementEntryId) -> RepositoryResult<bool>;

    /// `ignore_statement_entry`
    async fn ignore_entry(
        &self,
        statement_entry_id: StatementEntryId,
        notes: Option<&str>,
    ) -> RepositoryResult<bool>;

    /// `get_reconciliation_kpis`
    async fn get_reconciliation_kpis(
        &self,
        bank_account_id: Option<BankAccountId>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> RepositoryResult<KpisComparison>;
}
