//! Ledger and reconciliation procedures.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{success_flag, Order, QueryBuilder, RestRepository};
use crate::db::repository::{
    LedgerRepository, MovementKind, ReconciliationRepository, RepositoryError, RepositoryResult,
};
use crate::models::*;
use crate::services::{ledger as ledger_payloads, reconciliation as reconciliation_payloads};

const ACCOUNTS: &str = "financial_accounts";
const STATEMENT_ENTRIES: &str = "bank_statement_entries";

/// Date and amount tolerances sent to `suggest_reconciliation_matches`.
const TOLERANCE_DAYS: i64 = 5;
const TOLERANCE_AMOUNT: f64 = 0.01;

#[async_trait]
impl LedgerRepository for RestRepository {
    async fn list_accounts(&self) -> RepositoryResult<Vec<FinancialAccount>> {
        self.select(
            ACCOUNTS,
            &QueryBuilder::new()
                .order("code", Order::Asc)
                .order("name", Order::Asc),
        )
        .await
    }

    async fn ensure_default_accounts(&self) -> RepositoryResult<Vec<FinancialAccount>> {
        self.rpc_value("ensure_default_financial_accounts", &json!({}))
            .await?;
        self.list_accounts().await
    }

    async fn create_account(&self, input: &AccountInput) -> RepositoryResult<FinancialAccount> {
        self.insert(ACCOUNTS, input).await
    }

    async fn archive_account(&self, id: AccountId) -> RepositoryResult<bool> {
        let value = self
            .rpc_value("archive_financial_account", &json!({ "p_account_id": id }))
            .await?;
        Ok(success_flag(&value))
    }

    async fn create_financial_movement(
        &self,
        movement: &MovementInput,
    ) -> RepositoryResult<LedgerTransactionId> {
        let args = json!({
            "p_description": movement.description,
            "p_transaction_date": movement.transaction_date,
            "p_movements": movement.entries,
            "p_reference_number": movement.reference_number,
            "p_related_entity_type": movement.related_entity_type,
            "p_related_entity_id": movement.related_entity_id,
            "p_bank_account_id": movement.bank_account_id,
            "p_is_confirmed": movement.is_confirmed,
        });
        self.rpc("create_financial_movement", &args).await
    }

    async fn get_recent_transactions(
        &self,
        limit: usize,
        offset: usize,
        kind: Option<MovementKind>,
    ) -> RepositoryResult<Vec<TransactionWithEntries>> {
        let args = json!({ "p_limit": limit, "p_offset": offset, "p_type": kind });
        self.rpc("get_recent_financial_transactions", &args).await
    }

    async fn void_transaction(
        &self,
        id: LedgerTransactionId,
        reason: &str,
    ) -> RepositoryResult<ReverseResult> {
        let args = json!({ "p_transaction_id": id, "p_reason": reason });
        let mut result: ReverseResult = self.rpc("void_financial_transaction", &args).await?;
        if result.original_id.is_none() {
            result.original_id = Some(id);
        }
        Ok(result)
    }

    async fn get_account_balances(&self) -> RepositoryResult<Vec<AccountBalance>> {
        self.rpc("get_account_balances", &json!({})).await
    }

    async fn get_financial_summary(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<SummaryComparison> {
        let value = self
            .rpc_value(
                "get_financial_summary",
                &json!({ "p_start_date": start, "p_end_date": end }),
            )
            .await?;
        Ok(ledger_payloads::summary_from_json(&value)?)
    }

    async fn get_cash_flow(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        granularity: CashFlowGranularity,
    ) -> RepositoryResult<Vec<CashFlowPoint>> {
        let args = json!({
            "p_start_date": start,
            "p_end_date": end,
            "p_granularity": granularity,
        });
        self.rpc("get_cash_flow_data", &args).await
    }

    async fn get_dre(&self, year: i32) -> RepositoryResult<Vec<DreRow>> {
        let value = self
            .rpc_value("get_dre_data", &json!({ "p_year": year }))
            .await?;
        Ok(ledger_payloads::dre_rows_from_json(&value)?)
    }

    async fn settle_commission(
        &self,
        id: LedgerTransactionId,
        bank_account_id: AccountId,
    ) -> RepositoryResult<SettleResult> {
        let args = json!({ "p_transaction_id": id, "p_bank_account_id": bank_account_id });
        self.rpc("settle_commission_transaction", &args).await
    }

    async fn register_policy_commission(
        &self,
        registration: &CommissionRegistration,
    ) -> RepositoryResult<CommissionRegistrationResult> {
        let args = json!({
            "p_policy_id": registration.policy_id,
            "p_client_name": registration.client_name,
            "p_ramo_name": registration.ramo_name,
            "p_policy_number": registration.policy_number,
            "p_commission_amount": registration.commission_amount,
            "p_transaction_date": registration.transaction_date,
            "p_status": "pending",
        });
        self.rpc("register_policy_commission", &args).await
    }

    async fn bulk_create_movements(
        &self,
        asset_account_id: AccountId,
        rows: &[BulkMovementRow],
    ) -> RepositoryResult<BulkImportResult> {
        let transactions: Vec<Value> = rows
            .iter()
            .map(|row| {
                json!({
                    "description": row.description,
                    "transaction_date": row.transaction_date,
                    "amount": row.amount,
                    "asset_account_id": asset_account_id,
                    "category_account_id": row.category_account_id,
                    "reference_number": row.reference_number,
                    "memo": row.memo,
                })
            })
            .collect();
        self.rpc(
            "bulk_create_financial_movements",
            &json!({ "p_transactions": transactions }),
        )
        .await
    }
}

#[derive(Deserialize)]
struct MatchedRef {
    #[serde(default)]
    matched_transaction_id: Option<LedgerTransactionId>,
}

#[async_trait]
impl ReconciliationRepository for RestRepository {
    async fn import_statement(
        &self,
        bank_account_id: BankAccountId,
        file_name: &str,
        entries: &[StatementEntryInput],
    ) -> RepositoryResult<StatementImportResult> {
        let total: f64 = entries.iter().map(|e| e.amount).sum();
        let file_name = if file_name.trim().is_empty() {
            "manual_import"
        } else {
            file_name
        };
        let args = json!({
            "p_bank_account_id": bank_account_id,
            "p_file_name": file_name,
            "p_total_amount": total,
            "p_entries": entries,
        });
        self.rpc("import_bank_statement_batch", &args).await
    }

    async fn list_statement_entries(
        &self,
        bank_account_id: Option<BankAccountId>,
    ) -> RepositoryResult<Vec<BankStatementEntry>> {
        let mut query = QueryBuilder::new();
        if let Some(bank) = bank_account_id {
            query = query.eq("bank_account_id", bank);
        }
        self.select(
            STATEMENT_ENTRIES,
            &query.order("transaction_date", Order::Desc),
        )
        .await
    }

    async fn suggest_matches(
        &self,
        bank_account_id: Option<BankAccountId>,
    ) -> RepositoryResult<Vec<MatchSuggestion>> {
        let args = json!({
            "p_bank_account_id": bank_account_id,
            "p_tolerance_days": TOLERANCE_DAYS,
            "p_tolerance_amount": TOLERANCE_AMOUNT,
        });
        self.rpc("suggest_reconciliation_matches", &args).await
    }

    async fn reconcile(
        &self,
        statement_entry_id: StatementEntryId,
        transaction_id: LedgerTransactionId,
    ) -> RepositoryResult<bool> {
        let args = json!({
            "p_statement_entry_id": statement_entry_id,
            "p_system_transaction_id": transaction_id,
        });
        let value = self.rpc_value("reconcile_transactions", &args).await?;
        Ok(success_flag(&value))
    }

    async fn unreconcile(&self, statement_entry_id: StatementEntryId) -> RepositoryResult<bool> {
        // The procedure is keyed by the ledger side of the match.
        let entry: MatchedRef = self
            .select_one(
                STATEMENT_ENTRIES,
                QueryBuilder::new()
                    .select("matched_transaction_id")
                    .eq("id", statement_entry_id),
            )
            .await?;
        let Some(transaction_id) = entry.matched_transaction_id else {
            return Ok(false);
        };
        self.rpc_value(
            "unreconcile_transaction",
            &json!({ "p_transaction_id": transaction_id }),
        )
        .await?;
        Ok(true)
    }

    async fn ignore_entry(
        &self,
        statement_entry_id: StatementEntryId,
        notes: Option<&str>,
    ) -> RepositoryResult<bool> {
        let args = json!({ "p_statement_entry_id": statement_entry_id, "p_notes": notes });
        let value = self.rpc_value("ignore_statement_entry", &args).await?;
        Ok(success_flag(&value))
    }

    async fn get_reconciliation_kpis(
        &self,
        bank_account_id: Option<BankAccountId>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> RepositoryResult<KpisComparison> {
        let args = json!({
            "p_bank_account_id": bank_account_id,
            "p_start_date": start,
            "p_end_date": end,
            "p_search_term": Value::Null,
        });
        let value = self.rpc_value("get_reconciliation_kpis", &args).await?;
        reconciliation_payloads::kpis_from_json(&value).map_err(|e| {
            RepositoryError::from(e).with_operation("get_reconciliation_kpis")
        })
    }
}
