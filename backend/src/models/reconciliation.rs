//! Bank statement entries and the records exchanged with the reconciliation
//! procedures.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::ledger::LedgerTransactionId;
use crate::define_id_type;

define_id_type!(BankAccountId);
define_id_type!(StatementEntryId);
define_id_type!(ImportBatchId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationStatus {
    #[default]
    Pending,
    Matched,
    ManualMatch,
    Ignored,
    Divergent,
}

impl ReconciliationStatus {
    pub fn is_reconciled(&self) -> bool {
        matches!(self, Self::Matched | Self::ManualMatch)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankStatementEntry {
    pub id: StatementEntryId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_account_id: Option<BankAccountId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_batch_id: Option<ImportBatchId>,
    pub transaction_date: NaiveDate,
    pub description: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_number: Option<String>,
    #[serde(default)]
    pub reconciliation_status: ReconciliationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_transaction_id: Option<LedgerTransactionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One parsed statement line before import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementEntryInput {
    pub transaction_date: NaiveDate,
    pub description: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementImportResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<ImportBatchId>,
    #[serde(default)]
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSuggestion {
    pub statement_entry_id: StatementEntryId,
    pub system_transaction_id: LedgerTransactionId,
    pub statement_description: String,
    pub system_description: String,
    pub statement_amount: f64,
    pub system_amount: f64,
    /// Absolute day distance between the two dates.
    pub date_diff: i64,
    pub amount_diff: f64,
    /// 0.0..=1.0
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationKpis {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub reconciled_count: u64,
    #[serde(default)]
    pub pending_count: u64,
    #[serde(default)]
    pub ignored_count: u64,
    #[serde(default)]
    pub total_amount: f64,
    #[serde(default)]
    pub reconciled_amount: f64,
    #[serde(default)]
    pub pending_amount: f64,
    #[serde(default)]
    pub reconciled_revenue: f64,
    #[serde(default)]
    pub reconciled_expense: f64,
    #[serde(default)]
    pub pending_revenue: f64,
    #[serde(default)]
    pub pending_expense: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpisComparison {
    pub current: ReconciliationKpis,
    pub previous: ReconciliationKpis,
}
