//! Double-entry ledger records.
//!
//! Every [`FinancialTransaction`] groups two or more [`LedgerEntry`] rows whose
//! amounts sum to zero. Sign convention:
//!
//! ```text
//!   amount > 0  => DEBIT   (increases asset/expense, decreases liability/equity/revenue)
//!   amount < 0  => CREDIT  (decreases asset/expense, increases liability/equity/revenue)
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::define_id_type;

define_id_type!(AccountId);
define_id_type!(LedgerTransactionId);
define_id_type!(LedgerEntryId);

/// Tolerance used when checking that entries sum to zero.
pub const BALANCE_TOLERANCE: f64 = 0.01;

pub const RECEIVABLE_ACCOUNT: &str = "Comissões a Receber";
pub const COMMISSION_REVENUE_ACCOUNT: &str = "Receita de Comissões";

/// System chart of accounts: (code, name, type).
pub const DEFAULT_ACCOUNTS: &[(&str, &str, AccountType)] = &[
    ("1.1.01", "Caixa", AccountType::Asset),
    ("1.1.02", "Banco", AccountType::Asset),
    ("1.1.03", RECEIVABLE_ACCOUNT, AccountType::Asset),
    ("2.1.01", "Contas a Pagar", AccountType::Liability),
    ("3.1.01", "Capital Social", AccountType::Equity),
    ("4.1.01", COMMISSION_REVENUE_ACCOUNT, AccountType::Revenue),
    ("4.1.02", "Outras Receitas", AccountType::Revenue),
    ("5.1.01", "Despesas Administrativas", AccountType::Expense),
    ("5.1.02", "Marketing", AccountType::Expense),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

impl AccountType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Asset => "Ativo",
            Self::Liability => "Passivo",
            Self::Equity => "Patrimônio Líquido",
            Self::Revenue => "Receita",
            Self::Expense => "Despesa",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Active,
    Archived,
}

/// Entry in the chart of accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialAccount {
    pub id: AccountId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<AccountId>,
    #[serde(default)]
    pub is_system: bool,
    #[serde(default)]
    pub status: AccountStatus,
}

impl FinancialAccount {
    pub fn is_archived(&self) -> bool {
        self.status == AccountStatus::Archived
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInput {
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    #[serde(default)]
    pub parent_id: Option<AccountId>,
}

/// One leg of a movement before it is posted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntryInput {
    pub account_id: AccountId,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl LedgerEntryInput {
    pub fn new(account_id: AccountId, amount: f64) -> Self {
        Self {
            account_id,
            amount,
            memo: None,
        }
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

/// Payload for `create_financial_movement`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementInput {
    pub description: String,
    pub transaction_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_entity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Bank ledger account that receives the counterpart leg of a
    /// confirmed movement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_account_id: Option<AccountId>,
    #[serde(default = "default_confirmed")]
    pub is_confirmed: bool,
    pub entries: Vec<LedgerEntryInput>,
}

impl MovementInput {
    /// A confirmed movement with a bank account is completed by the backend,
    /// which posts the balancing leg against the bank.
    pub fn has_bank_counterpart(&self) -> bool {
        self.is_confirmed && self.bank_account_id.is_some()
    }
}

fn default_confirmed() -> bool {
    true
}

/// Header of a posted movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialTransaction {
    pub id: LedgerTransactionId,
    pub description: String,
    pub transaction_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_entity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_void: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub void_reason: Option<String>,
    #[serde(default = "default_confirmed")]
    pub is_confirmed: bool,
    #[serde(default)]
    pub reconciled: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub transaction_id: LedgerTransactionId,
    pub account_id: AccountId,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

/// A movement header with its entries, as listed by `get_recent_financial_transactions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionWithEntries {
    #[serde(flatten)]
    pub transaction: FinancialTransaction,
    #[serde(default)]
    pub entries: Vec<LedgerEntry>,
}

impl TransactionWithEntries {
    /// Sum of the debit legs, i.e. the movement's face value.
    pub fn total_amount(&self) -> f64 {
        self.entries
            .iter()
            .filter(|e| e.amount > 0.0)
            .map(|e| e.amount)
            .sum()
    }
}

/// Account joined with its computed balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountBalance {
    #[serde(flatten)]
    pub account: FinancialAccount,
    pub balance: f64,
    pub entry_count: u64,
}

/// Period KPIs returned by `get_financial_summary`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    #[serde(default)]
    pub total_income: f64,
    #[serde(default)]
    pub total_expense: f64,
    #[serde(default)]
    pub net_result: f64,
    #[serde(default)]
    pub pending_income: f64,
    #[serde(default)]
    pub pending_expense: f64,
    #[serde(default)]
    pub transaction_count: u64,
    #[serde(default)]
    pub cash_balance: f64,
}

/// Summary for the selected period and the one before it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryComparison {
    pub current: FinancialSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<FinancialSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowPoint {
    pub period: String,
    pub income: f64,
    pub expense: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CashFlowGranularity {
    Day,
    Month,
}

/// One line of the income statement (DRE), monthly columns plus total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DreRow {
    pub category: String,
    pub account_type: AccountType,
    /// Twelve monthly amounts, January first.
    pub months: [f64; 12],
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReverseResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reversal_id: Option<LedgerTransactionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_id: Option<LedgerTransactionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reversed_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Parameters of `register_policy_commission`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionRegistration {
    pub policy_id: super::PolicyId,
    pub client_name: String,
    pub ramo_name: String,
    pub policy_number: String,
    pub commission_amount: f64,
    /// Expected receipt date.
    pub transaction_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionRegistrationResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<LedgerTransactionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettleResult {
    pub success: bool,
    #[serde(default)]
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// One row of a bulk import into a single asset account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkMovementRow {
    pub description: String,
    pub transaction_date: NaiveDate,
    /// Positive for money in, negative for money out.
    pub amount: f64,
    pub category_account_id: AccountId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkImportError {
    pub index: usize,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkImportResult {
    pub success_count: usize,
    pub error_count: usize,
    pub total_processed: usize,
    pub errors: Vec<BulkImportError>,
}

/// Sum of entry amounts.
pub fn entries_total(entries: &[LedgerEntryInput]) -> f64 {
    entries.iter().map(|e| e.amount).sum()
}

/// A movement is balanced when it has at least two legs summing to zero.
pub fn is_balanced(entries: &[LedgerEntryInput]) -> bool {
    entries.len() >= 2 && entries_total(entries).abs() <= BALANCE_TOLERANCE
}
