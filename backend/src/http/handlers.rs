//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! repository workflows in `db::services` or to the pure computations in
//! `services`.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use chrono::{Local, NaiveDate, Utc};

use super::dto::{
    ClaimListResponse, ClaimStatusRequest, ClientListQuery, ClientListResponse,
    CreateMovementRequest, CreateMovementResponse, FocusQuery, FocusResponse, HealthResponse,
    ImportStatementRequest, MessageResponse, MoveDealRequest, PeriodQuery, PipelineQuery,
    PolicyListResponse, PolicySortQuery, ReconcileRequest, RecentMovementsQuery,
    ResetPasswordRequest, SettleRequest, SignInRequest, SignUpRequest, SignUpResponse,
    SuccessResponse, SuggestionQuery, SuggestionResponse, TransactionListQuery,
    TransactionListResponse, VoidRequest,
};
use super::error::AppError;
use super::state::AppState;
use crate::auth::Session;
use crate::db::repository::MovementKind;
use crate::db::services as db_services;
use crate::db::PolicyActivation;
use crate::models::{
    AccountBalance, AccountInput, Appointment, AppointmentInput, Claim, ClaimActivity, ClaimId,
    ClaimInput, Client, ClientId, ClientInput, Deal, DealId, DealInput, FinancialAccount,
    LedgerTransactionId, Policy, PolicyId, PolicyInput, ReverseResult, SettleResult,
    StatementImportResult, SummaryComparison, TransactionWithEntries,
};
use crate::services::agenda::{immediate_focus, schedule_gaps, weekly_stats, DEFAULT_FOCUS_LIMIT};
use crate::services::claims::{claim_stats, filter_claims, ClaimFilters};
use crate::services::crm::{pipeline_summary, StageSummary};
use crate::services::dashboard::{load_dashboard, Dashboard};
use crate::services::policy_filter::{
    filter_and_sort, unique_insurance_companies, Lookup, PolicyFilters, SortConfig,
};
use crate::services::policy_kpis::{compute_policy_kpis, PolicyKpis};
use crate::services::reconciliation::filter_suggestions;
use crate::services::transaction_metrics::{compute_metrics, filter_transactions};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Result type for handlers that create a resource.
pub type CreatedResult<T> = Result<(StatusCode, Json<T>), AppError>;

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn created<T>(value: T) -> CreatedResult<T> {
    Ok((StatusCode::CREATED, Json(value)))
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the backend is
/// reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Clients
// =============================================================================

fn client_matches(client: &Client, term: &str) -> bool {
    let contains = |field: Option<&str>| field.is_some_and(|f| f.to_lowercase().contains(term));
    contains(Some(&client.name))
        || contains(client.email.as_deref())
        || contains(client.phone.as_deref())
        || contains(client.cpf_cnpj.as_deref())
}

/// GET /v1/clients
pub async fn list_clients(
    State(state): State<AppState>,
    Query(query): Query<ClientListQuery>,
) -> HandlerResult<ClientListResponse> {
    let mut clients = state.repository.list_clients().await?;
    if let Some(term) = query.search.map(|s| s.trim().to_lowercase()) {
        if !term.is_empty() {
            clients.retain(|c| client_matches(c, &term));
        }
    }
    let total = clients.len();
    Ok(Json(ClientListResponse { clients, total }))
}

/// POST /v1/clients
///
/// Field errors come back together with a 400.
pub async fn create_client(
    State(state): State<AppState>,
    Json(input): Json<ClientInput>,
) -> CreatedResult<Client> {
    created(db_services::create_client(state.repository.as_ref(), &input).await?)
}

/// GET /v1/clients/{id}
pub async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<ClientId>,
) -> HandlerResult<Client> {
    Ok(Json(state.repository.get_client(id).await?))
}

/// PUT /v1/clients/{id}
pub async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<ClientId>,
    Json(mut client): Json<Client>,
) -> HandlerResult<Client> {
    client.id = id;
    Ok(Json(
        db_services::update_client(state.repository.as_ref(), &client).await?,
    ))
}

/// DELETE /v1/clients/{id}
pub async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<ClientId>,
) -> Result<StatusCode, AppError> {
    state.repository.delete_client(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Policies
// =============================================================================

/// GET /v1/policies
///
/// Filters and sort share the query string, e.g.
/// `?status=Ativa&period=next-30-days&sortKey=premiumValue&sortDirection=desc`.
/// KPIs are computed over the filtered rows.
pub async fn list_policies(
    State(state): State<AppState>,
    Query(filters): Query<PolicyFilters>,
    Query(sort): Query<PolicySortQuery>,
) -> HandlerResult<PolicyListResponse> {
    let repo = state.repository.as_ref();
    let (policies, clients, producers) =
        futures::try_join!(repo.list_policies(), repo.list_clients(), repo.list_producers())?;

    let today = today();
    let lookup = Lookup::new(&clients, &producers);
    let sort = SortConfig {
        key: sort.sort_key,
        direction: sort.sort_direction,
    };
    let rows = filter_and_sort(&policies, &filters, sort, &lookup, today);
    let kpis = compute_policy_kpis(rows.iter().copied(), today);
    let insurance_companies = unique_insurance_companies(&policies);
    let policies: Vec<Policy> = rows.into_iter().cloned().collect();

    Ok(Json(PolicyListResponse {
        total: policies.len(),
        policies,
        kpis,
        insurance_companies,
    }))
}

/// GET /v1/policies/kpis
///
/// KPIs over the whole portfolio.
pub async fn policy_kpis(State(state): State<AppState>) -> HandlerResult<PolicyKpis> {
    let policies = state.repository.list_policies().await?;
    Ok(Json(compute_policy_kpis(&policies, today())))
}

/// POST /v1/policies
pub async fn create_policy(
    State(state): State<AppState>,
    Json(input): Json<PolicyInput>,
) -> CreatedResult<Policy> {
    created(db_services::create_policy(state.repository.as_ref(), &input).await?)
}

/// GET /v1/policies/{id}
pub async fn get_policy(
    State(state): State<AppState>,
    Path(id): Path<PolicyId>,
) -> HandlerResult<Policy> {
    Ok(Json(state.repository.get_policy(id).await?))
}

/// POST /v1/policies/{id}/activate
///
/// Marks the policy active and generates its commission once.
pub async fn activate_policy(
    State(state): State<AppState>,
    Path(id): Path<PolicyId>,
) -> HandlerResult<PolicyActivation> {
    Ok(Json(
        db_services::activate_policy(state.repository.as_ref(), id).await?,
    ))
}

// =============================================================================
// Legacy transactions
// =============================================================================

/// GET /v1/transactions
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionListQuery>,
) -> HandlerResult<TransactionListResponse> {
    let repo = state.repository.as_ref();
    let (transactions, policies) = futures::try_join!(repo.list_transactions(), repo.list_policies())?;
    let rows = filter_transactions(
        &transactions,
        &policies,
        query.period,
        query.company_id,
        today(),
    );
    let metrics = compute_metrics(rows.iter().copied());
    Ok(Json(TransactionListResponse {
        transactions: rows.into_iter().cloned().collect(),
        metrics,
    }))
}

// =============================================================================
// Ledger
// =============================================================================

/// GET /v1/ledger/accounts
pub async fn list_accounts(State(state): State<AppState>) -> HandlerResult<Vec<FinancialAccount>> {
    Ok(Json(state.repository.list_accounts().await?))
}

/// POST /v1/ledger/accounts
pub async fn create_account(
    State(state): State<AppState>,
    Json(input): Json<AccountInput>,
) -> CreatedResult<FinancialAccount> {
    created(state.repository.create_account(&input).await?)
}

/// GET /v1/ledger/balances
pub async fn account_balances(State(state): State<AppState>) -> HandlerResult<Vec<AccountBalance>> {
    Ok(Json(state.repository.get_account_balances().await?))
}

/// GET /v1/ledger/movements
pub async fn recent_movements(
    State(state): State<AppState>,
    Query(query): Query<RecentMovementsQuery>,
) -> HandlerResult<Vec<TransactionWithEntries>> {
    Ok(Json(
        state
            .repository
            .get_recent_transactions(query.limit, query.offset, query.kind)
            .await?,
    ))
}

/// POST /v1/ledger/movements
///
/// Records a revenue or an expense from the simplified form.
pub async fn create_movement(
    State(state): State<AppState>,
    Json(request): Json<CreateMovementRequest>,
) -> CreatedResult<CreateMovementResponse> {
    let repo = state.repository.as_ref();
    let id = match request.kind {
        MovementKind::Revenue => db_services::record_revenue(repo, request.movement).await?,
        MovementKind::Expense => db_services::record_expense(repo, request.movement).await?,
    };
    created(CreateMovementResponse { id })
}

/// POST /v1/ledger/movements/{id}/void
pub async fn void_movement(
    State(state): State<AppState>,
    Path(id): Path<LedgerTransactionId>,
    Json(request): Json<VoidRequest>,
) -> HandlerResult<ReverseResult> {
    if request.reason.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Informe o motivo do estorno".to_string(),
        ));
    }
    Ok(Json(
        state.repository.void_transaction(id, &request.reason).await?,
    ))
}

/// POST /v1/ledger/movements/{id}/settle
pub async fn settle_movement(
    State(state): State<AppState>,
    Path(id): Path<LedgerTransactionId>,
    Json(request): Json<SettleRequest>,
) -> HandlerResult<SettleResult> {
    Ok(Json(
        state
            .repository
            .settle_commission(id, request.bank_account_id)
            .await?,
    ))
}

/// GET /v1/ledger/summary?start=..&end=..
pub async fn financial_summary(
    State(state): State<AppState>,
    Query(period): Query<PeriodQuery>,
) -> HandlerResult<SummaryComparison> {
    if period.start > period.end {
        return Err(AppError::BadRequest(
            "A data inicial deve ser anterior à data final".to_string(),
        ));
    }
    Ok(Json(
        state
            .repository
            .get_financial_summary(period.start, period.end)
            .await?,
    ))
}

// =============================================================================
// Claims
// =============================================================================

/// GET /v1/claims
///
/// Stats always cover every claim; the list follows the filters.
pub async fn list_claims(
    State(state): State<AppState>,
    Query(filters): Query<ClaimFilters>,
) -> HandlerResult<ClaimListResponse> {
    let all = state.repository.list_claims().await?;
    let stats = claim_stats(&all);
    let claims: Vec<Claim> = filter_claims(&all, &filters).into_iter().cloned().collect();
    Ok(Json(ClaimListResponse {
        total: claims.len(),
        claims,
        stats,
    }))
}

/// POST /v1/claims
pub async fn create_claim(
    State(state): State<AppState>,
    Json(input): Json<ClaimInput>,
) -> CreatedResult<Claim> {
    created(db_services::create_claim(state.repository.as_ref(), &input).await?)
}

/// POST /v1/claims/{id}/status
pub async fn change_claim_status(
    State(state): State<AppState>,
    Path(id): Path<ClaimId>,
    Json(request): Json<ClaimStatusRequest>,
) -> HandlerResult<Claim> {
    Ok(Json(
        db_services::change_claim_status(state.repository.as_ref(), id, request.status).await?,
    ))
}

/// GET /v1/claims/{id}/activities
pub async fn claim_activities(
    State(state): State<AppState>,
    Path(id): Path<ClaimId>,
) -> HandlerResult<Vec<ClaimActivity>> {
    Ok(Json(state.repository.list_claim_activities(id).await?))
}

// =============================================================================
// Appointments
// =============================================================================

/// GET /v1/appointments/focus
///
/// Uses the server's local clock, since appointments carry naive local times.
pub async fn appointment_focus(
    State(state): State<AppState>,
    Query(query): Query<FocusQuery>,
) -> HandlerResult<FocusResponse> {
    let appointments = state.repository.list_appointments().await?;
    let now = Local::now().naive_local();
    let limit = query.limit.unwrap_or(DEFAULT_FOCUS_LIMIT);
    Ok(Json(FocusResponse {
        focus: immediate_focus(&appointments, now, limit),
        weekly: weekly_stats(&appointments, now.date()),
        gaps: schedule_gaps(&appointments, now.date()),
    }))
}

/// POST /v1/appointments
pub async fn create_appointment(
    State(state): State<AppState>,
    Json(input): Json<AppointmentInput>,
) -> CreatedResult<Appointment> {
    created(db_services::create_appointment(state.repository.as_ref(), &input).await?)
}

// =============================================================================
// CRM
// =============================================================================

/// GET /v1/crm/pipeline
pub async fn pipeline(
    State(state): State<AppState>,
    Query(query): Query<PipelineQuery>,
) -> HandlerResult<Vec<StageSummary>> {
    let repo = state.repository.as_ref();
    let (stages, deals) =
        futures::try_join!(repo.list_stages(query.pipeline_id), repo.list_deals())?;
    Ok(Json(pipeline_summary(&stages, &deals)))
}

/// POST /v1/crm/deals
pub async fn create_deal(
    State(state): State<AppState>,
    Json(input): Json<DealInput>,
) -> CreatedResult<Deal> {
    created(db_services::create_deal(state.repository.as_ref(), &input).await?)
}

/// POST /v1/crm/deals/{id}/move
pub async fn move_deal(
    State(state): State<AppState>,
    Path(id): Path<DealId>,
    Json(request): Json<MoveDealRequest>,
) -> HandlerResult<Deal> {
    Ok(Json(
        state
            .repository
            .move_deal(id, request.stage_id, request.position)
            .await?,
    ))
}

// =============================================================================
// Reconciliation
// =============================================================================

/// POST /v1/reconciliation/import
pub async fn import_statement(
    State(state): State<AppState>,
    Json(request): Json<ImportStatementRequest>,
) -> CreatedResult<StatementImportResult> {
    if request.entries.is_empty() {
        return Err(AppError::BadRequest(
            "O extrato não contém lançamentos".to_string(),
        ));
    }
    created(
        state
            .repository
            .import_statement(request.bank_account_id, &request.file_name, &request.entries)
            .await?,
    )
}

/// GET /v1/reconciliation/suggestions
pub async fn reconciliation_suggestions(
    State(state): State<AppState>,
    Query(query): Query<SuggestionQuery>,
) -> HandlerResult<SuggestionResponse> {
    let suggestions = state
        .repository
        .suggest_matches(query.bank_account_id)
        .await?;
    let suggestions = filter_suggestions(suggestions, query.min_confidence.unwrap_or(0.0));
    Ok(Json(SuggestionResponse {
        total: suggestions.len(),
        suggestions,
    }))
}

/// POST /v1/reconciliation/reconcile
pub async fn reconcile(
    State(state): State<AppState>,
    Json(request): Json<ReconcileRequest>,
) -> HandlerResult<SuccessResponse> {
    let success = state
        .repository
        .reconcile(request.statement_entry_id, request.transaction_id)
        .await?;
    Ok(Json(SuccessResponse { success }))
}

// =============================================================================
// Dashboard
// =============================================================================

/// GET /v1/dashboard
pub async fn dashboard(State(state): State<AppState>) -> HandlerResult<Dashboard> {
    let now = Local::now().naive_local();
    Ok(Json(load_dashboard(state.repository.as_ref(), now).await?))
}

// =============================================================================
// Auth
// =============================================================================

/// POST /v1/auth/sign-in
pub async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> HandlerResult<Session> {
    Ok(Json(
        state.auth.sign_in(&request.email, &request.password).await?,
    ))
}

/// POST /v1/auth/sign-up
pub async fn sign_up(
    State(state): State<AppState>,
    Json(request): Json<SignUpRequest>,
) -> CreatedResult<SignUpResponse> {
    let (user, session) = state
        .auth
        .sign_up(&request.email, &request.password, &request.full_name)
        .await?;
    let message = if session.is_some() {
        "Cadastro realizado com sucesso!"
    } else {
        "Cadastro realizado! Verifique seu email para confirmar a conta."
    };
    created(SignUpResponse {
        user,
        session,
        message: message.to_string(),
    })
}

/// POST /v1/auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> HandlerResult<MessageResponse> {
    state
        .auth
        .reset_password(&request.email, request.redirect_to.as_deref())
        .await?;
    Ok(Json(MessageResponse {
        message: "Email de recuperação enviado! Verifique sua caixa de entrada.".to_string(),
    }))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// POST /v1/auth/sign-out
pub async fn sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let token = bearer_token(&headers).ok_or(AppError::Auth(crate::auth::AuthError::Unauthorized))?;
    state.auth.sign_out(token).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);
    }
}
