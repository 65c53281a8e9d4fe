//! Data Transfer Objects for the HTTP API.
//!
//! Records and computed views already derive Serialize/Deserialize and are
//! returned as they are; this module only adds request bodies, query
//! strings and the list envelopes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::auth::{AuthUser, Session};
use crate::db::repository::MovementKind;
use crate::models::{
    AccountId, BankAccountId, Claim, ClaimStatus, Client, Company, CompanyId, LedgerTransactionId,
    MatchSuggestion, PipelineId, Policy, StageId, StatementEntryId, StatementEntryInput,
    Transaction,
};
use crate::services::agenda::{FocusItem, ScheduleGap, WeeklyStats};
use crate::services::claims::ClaimStats;
use crate::services::ledger::MovementRequest;
use crate::services::periods::TransactionPeriod;
use crate::services::policy_filter::{SortDirection, SortKey};
use crate::services::policy_kpis::PolicyKpis;
use crate::services::transaction_metrics::TransactionMetrics;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

// ==================== Portfolio ====================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientListQuery {
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientListResponse {
    pub clients: Vec<Client>,
    pub total: usize,
}

/// Sort part of the policy list query string.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PolicySortQuery {
    pub sort_key: SortKey,
    pub sort_direction: SortDirection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyListResponse {
    pub policies: Vec<Policy>,
    pub total: usize,
    /// KPIs over the filtered list.
    pub kpis: PolicyKpis,
    /// Filter options; `id` is the `insuranceCompany` filter value.
    pub insurance_companies: Vec<Company>,
}

// ==================== Finance ====================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TransactionListQuery {
    pub period: TransactionPeriod,
    pub company_id: Option<CompanyId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionListResponse {
    pub transactions: Vec<Transaction>,
    pub metrics: TransactionMetrics,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecentMovementsQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub kind: Option<MovementKind>,
}

fn default_limit() -> usize {
    20
}

/// Revenue or expense form submission.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMovementRequest {
    pub kind: MovementKind,
    #[serde(flatten)]
    pub movement: MovementRequest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMovementResponse {
    pub id: LedgerTransactionId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoidRequest {
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SettleRequest {
    pub bank_account_id: AccountId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PeriodQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

// ==================== Claims ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimListResponse {
    pub claims: Vec<Claim>,
    pub total: usize,
    pub stats: ClaimStats,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClaimStatusRequest {
    pub status: ClaimStatus,
}

// ==================== Agenda & CRM ====================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FocusQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FocusResponse {
    pub focus: Vec<FocusItem>,
    pub weekly: WeeklyStats,
    pub gaps: Vec<ScheduleGap>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineQuery {
    pub pipeline_id: Option<PipelineId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoveDealRequest {
    pub stage_id: StageId,
    pub position: usize,
}

// ==================== Reconciliation ====================

#[derive(Debug, Clone, Deserialize)]
pub struct ImportStatementRequest {
    pub bank_account_id: BankAccountId,
    pub file_name: String,
    pub entries: Vec<StatementEntryInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SuggestionQuery {
    pub bank_account_id: Option<BankAccountId>,
    pub min_confidence: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionResponse {
    pub suggestions: Vec<MatchSuggestion>,
    pub total: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReconcileRequest {
    pub statement_entry_id: StatementEntryId,
    pub transaction_id: LedgerTransactionId,
}

/// Outcome of a procedure that only reports success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

// ==================== Auth ====================

#[derive(Debug, Clone, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpResponse {
    pub user: AuthUser,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<Session>,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    #[serde(default)]
    pub redirect_to: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
