//! Service layer: repository-agnostic orchestration.
//!
//! These functions put validation in front of the repository calls and
//! combine several calls where one user action touches more than one record.
//! They work with any [`FullRepository`] implementation.

use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;

use super::repository::{ErrorContext, FullRepository, RepositoryError, RepositoryResult};
use crate::models::{
    Appointment, AppointmentInput, Claim, ClaimActivity, ClaimId, ClaimInput, ClaimStatus,
    ClaimUpdate, Client, ClientInput, CommissionRegistration, CommissionRegistrationResult, Deal,
    DealInput, LedgerTransactionId, MovementInput, Policy, PolicyId, PolicyInput, PolicyStatus,
    Transaction, TransactionInput, TransactionNature, TransactionStatus, TransactionTypeId,
};
use crate::services::claims::can_transition;
use crate::services::ledger::{expense_movement, revenue_movement, MovementRequest};
use crate::services::validation::{
    validate_appointment, validate_claim, validate_client, validate_deal, validate_movement,
    validate_movement_request, validate_policy, validate_transaction,
};

/// Name of the transaction type that commission transactions are filed under.
pub const COMMISSION_TYPE_NAME: &str = "Comissão";

/// Days between policy start and the commission due date.
pub const COMMISSION_DUE_DAYS: i64 = 30;

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Check the backend connection.
pub async fn health_check<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<bool> {
    repo.health_check().await
}

// ==================== Portfolio ====================

pub async fn create_client<R: FullRepository + ?Sized>(
    repo: &R,
    input: &ClientInput,
) -> RepositoryResult<Client> {
    validate_client(input, today())?;
    let client = repo.create_client(input).await?;
    log::info!("Client created: {}", client.id);
    Ok(client)
}

pub async fn update_client<R: FullRepository + ?Sized>(
    repo: &R,
    client: &Client,
) -> RepositoryResult<Client> {
    let input = ClientInput {
        name: client.name.clone(),
        phone: client.phone.clone(),
        email: client.email.clone(),
        cpf_cnpj: client.cpf_cnpj.clone(),
        birth_date: client.birth_date,
        status: client.status,
        cep: client.cep.clone(),
        city: client.city.clone(),
        state: client.state.clone(),
        observations: client.observations.clone(),
    };
    validate_client(&input, today())?;
    repo.update_client(client).await
}

pub async fn create_policy<R: FullRepository + ?Sized>(
    repo: &R,
    input: &PolicyInput,
) -> RepositoryResult<Policy> {
    validate_policy(input)?;
    // Fails with NotFound before anything is written.
    repo.get_client(input.client_id).await?;
    let policy = repo.create_policy(input).await?;
    log::info!(
        "Policy created: {} ({})",
        policy.id,
        policy.policy_number.as_deref().unwrap_or("sem número")
    );
    Ok(policy)
}

/// Outcome of [`activate_policy`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyActivation {
    pub policy: Policy,
    /// Commission transaction in the legacy module, new or pre-existing.
    /// `None` when the policy yields no commission.
    pub commission: Option<Transaction>,
    /// `true` when the commission had already been generated.
    pub already_generated: bool,
    /// Ledger registration result. `None` when the ledger was not touched or
    /// the procedure call failed.
    pub ledger: Option<CommissionRegistrationResult>,
}

/// Commission transaction description, falling back to the id prefix.
fn commission_description(policy: &Policy) -> String {
    let number = policy
        .policy_number
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| policy.id.to_string().chars().take(8).collect());
    format!("Comissão da apólice {}", number)
}

async fn commission_type_id<R: FullRepository + ?Sized>(
    repo: &R,
) -> RepositoryResult<TransactionTypeId> {
    let types = repo.list_transaction_types().await?;
    if let Some(existing) = types.iter().find(|t| t.name == COMMISSION_TYPE_NAME) {
        return Ok(existing.id);
    }
    log::info!("Creating default '{}' transaction type", COMMISSION_TYPE_NAME);
    let created = repo
        .create_transaction_type(COMMISSION_TYPE_NAME, TransactionNature::Ganho)
        .await?;
    Ok(created.id)
}

/// Mark a policy as `Ativa` and generate its commission.
///
/// The commission is written twice: as a pending `RECEITA` transaction in
/// the legacy module and through `register_policy_commission` in the ledger.
/// Activation is idempotent; if an income transaction already exists for the
/// policy it is returned and nothing new is posted. A ledger failure is
/// logged and reported as `ledger: None` since the legacy record already
/// exists at that point.
pub async fn activate_policy<R: FullRepository + ?Sized>(
    repo: &R,
    id: PolicyId,
) -> RepositoryResult<PolicyActivation> {
    let mut policy = repo.get_policy(id).await?;
    if policy.status != PolicyStatus::Active {
        policy.status = PolicyStatus::Active;
        policy = repo.update_policy(&policy).await?;
    }

    if let Some(existing) = repo.find_income_for_policy(id).await? {
        log::warn!("Commission already generated for policy {}", id);
        return Ok(PolicyActivation {
            policy,
            commission: Some(existing),
            already_generated: true,
            ledger: None,
        });
    }

    let amount = policy.estimated_commission();
    if !amount.is_finite() || amount <= 0.0 {
        log::info!("Policy {} has no commission to generate", id);
        return Ok(PolicyActivation {
            policy,
            commission: None,
            already_generated: false,
            ledger: None,
        });
    }

    let today = today();
    let type_id = commission_type_id(repo).await?;
    let due_date = policy
        .start_date
        .map(|start| start + Duration::days(COMMISSION_DUE_DAYS))
        .unwrap_or(policy.expiration_date);
    let transaction = repo
        .create_transaction(&TransactionInput {
            type_id: Some(type_id),
            description: commission_description(&policy),
            amount,
            status: TransactionStatus::Pendente,
            nature: TransactionNature::Receita,
            date: today,
            due_date: Some(due_date),
            client_id: Some(policy.client_id),
            policy_id: Some(policy.id),
            company_id: policy.insurance_company,
            producer_id: policy.producer_id,
        })
        .await?;

    let client_name = match repo.get_client(policy.client_id).await {
        Ok(client) if !client.name.trim().is_empty() => client.name.trim().to_string(),
        _ => "Cliente".to_string(),
    };
    let registration = CommissionRegistration {
        policy_id: policy.id,
        client_name,
        ramo_name: policy
            .ramo
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or("Seguro")
            .to_string(),
        policy_number: policy
            .policy_number
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
        commission_amount: amount,
        transaction_date: policy.start_date.unwrap_or(today) + Duration::days(COMMISSION_DUE_DAYS),
    };
    let ledger = match repo.register_policy_commission(&registration).await {
        Ok(result) => {
            if !result.success {
                log::warn!(
                    "Ledger commission for policy {} not registered: {}",
                    id,
                    result.message.as_deref().unwrap_or("sem detalhes")
                );
            }
            Some(result)
        }
        Err(e) => {
            log::error!("Ledger commission for policy {} failed: {}", id, e);
            None
        }
    };

    log::info!("Commission of {:.2} generated for policy {}", amount, id);
    Ok(PolicyActivation {
        policy,
        commission: Some(transaction),
        already_generated: false,
        ledger,
    })
}

// ==================== Finance ====================

pub async fn create_transaction<R: FullRepository + ?Sized>(
    repo: &R,
    input: &TransactionInput,
) -> RepositoryResult<Transaction> {
    validate_transaction(input)?;
    repo.create_transaction(input).await
}

/// Validate and post a movement as given.
pub async fn post_movement<R: FullRepository + ?Sized>(
    repo: &R,
    movement: &MovementInput,
) -> RepositoryResult<LedgerTransactionId> {
    validate_movement(movement)?;
    let id = repo.create_financial_movement(movement).await?;
    log::info!("Movement posted: {} ({})", id, movement.description);
    Ok(id)
}

/// Post a revenue: credit the revenue account against the counterpart.
pub async fn record_revenue<R: FullRepository + ?Sized>(
    repo: &R,
    request: MovementRequest,
) -> RepositoryResult<LedgerTransactionId> {
    validate_movement_request(&request)?;
    post_movement(repo, &revenue_movement(request)).await
}

/// Post an expense: debit the expense account against the counterpart.
pub async fn record_expense<R: FullRepository + ?Sized>(
    repo: &R,
    request: MovementRequest,
) -> RepositoryResult<LedgerTransactionId> {
    validate_movement_request(&request)?;
    post_movement(repo, &expense_movement(request)).await
}

// ==================== Claims ====================

pub async fn create_claim<R: FullRepository + ?Sized>(
    repo: &R,
    input: &ClaimInput,
) -> RepositoryResult<Claim> {
    validate_claim(input, today())?;
    let claim = repo.create_claim(input).await?;
    log::info!("Claim created: {}", claim.id);
    Ok(claim)
}

/// Move a claim to `status` and append the status-change activity.
///
/// Transitions outside the claim workflow are rejected with a validation
/// error before anything is written.
pub async fn change_claim_status<R: FullRepository + ?Sized>(
    repo: &R,
    id: ClaimId,
    status: ClaimStatus,
) -> RepositoryResult<Claim> {
    let current = repo.get_claim(id).await?;
    if current.status == status {
        return Ok(current);
    }
    if !can_transition(current.status, status) {
        return Err(RepositoryError::validation_with_context(
            format!(
                "Transição de status inválida: {} para {}",
                current.status.label(),
                status.label()
            ),
            ErrorContext::new("change_claim_status")
                .with_entity("claim")
                .with_entity_id(id.to_string()),
        ));
    }

    let update = ClaimUpdate {
        status: Some(status),
        ..ClaimUpdate::default()
    };
    let updated = repo.update_claim(id, &update).await?;
    repo.add_claim_activity(&ClaimActivity::status_change(id, current.status, status))
        .await?;
    log::info!(
        "Claim {} moved from {} to {}",
        id,
        current.status.label(),
        status.label()
    );
    Ok(updated)
}

// ==================== Agenda & CRM ====================

pub async fn create_appointment<R: FullRepository + ?Sized>(
    repo: &R,
    input: &AppointmentInput,
) -> RepositoryResult<Appointment> {
    validate_appointment(input)?;
    repo.create_appointment(input).await
}

pub async fn create_deal<R: FullRepository + ?Sized>(
    repo: &R,
    input: &DealInput,
) -> RepositoryResult<Deal> {
    validate_deal(input)?;
    repo.create_deal(input).await
}

#[cfg(all(test, feature = "local-repo"))]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::{
        ClaimRepository, FinanceRepository, LedgerRepository, PortfolioRepository,
    };
    use crate::models::{AccountType, ClientStatus};

    fn client_input() -> ClientInput {
        ClientInput {
            name: "Maria Souza".into(),
            email: Some("maria@example.com".into()),
            status: ClientStatus::Active,
            ..ClientInput::default()
        }
    }

    fn policy_input(client: &Client, premium: f64) -> PolicyInput {
        PolicyInput {
            client_id: client.id,
            policy_number: Some("AP-001".into()),
            insurance_company: None,
            ramo: Some("Auto".into()),
            producer_id: None,
            insured_asset: "Onix 2022".into(),
            premium_value: premium,
            commission_rate: 15.0,
            status: PolicyStatus::AwaitingPolicy,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 10),
            expiration_date: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
            automatic_renewal: false,
        }
    }

    #[tokio::test]
    async fn test_activate_policy_is_idempotent() {
        let repo = LocalRepository::new();
        let client = create_client(&repo, &client_input()).await.unwrap();
        let policy = create_policy(&repo, &policy_input(&client, 2000.0)).await.unwrap();

        let first = activate_policy(&repo, policy.id).await.unwrap();
        assert_eq!(first.policy.status, PolicyStatus::Active);
        assert!(!first.already_generated);
        let commission = first.commission.unwrap();
        assert_eq!(commission.amount, 300.0);
        assert_eq!(commission.description, "Comissão da apólice AP-001");
        assert_eq!(commission.due_date, NaiveDate::from_ymd_opt(2025, 2, 9));
        assert!(first.ledger.unwrap().success);

        let second = activate_policy(&repo, policy.id).await.unwrap();
        assert!(second.already_generated);
        assert_eq!(second.commission.unwrap().id, commission.id);
        assert_eq!(repo.list_transactions().await.unwrap().len(), 1);
        assert_eq!(repo.ledger_len(), 1);
    }

    #[tokio::test]
    async fn test_activate_policy_without_premium_skips_commission() {
        let repo = LocalRepository::new();
        let client = create_client(&repo, &client_input()).await.unwrap();
        let policy = create_policy(&repo, &policy_input(&client, 0.0)).await.unwrap();

        let activation = activate_policy(&repo, policy.id).await.unwrap();
        assert_eq!(activation.policy.status, PolicyStatus::Active);
        assert!(activation.commission.is_none());
        assert!(repo.list_transactions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_client_rejects_invalid_input() {
        let repo = LocalRepository::new();
        let input = ClientInput {
            name: "A".into(),
            ..ClientInput::default()
        };
        let err = create_client(&repo, &input).await.unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
        assert!(repo.list_clients().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_change_claim_status_appends_activity() {
        let repo = LocalRepository::new();
        let claim = create_claim(
            &repo,
            &ClaimInput {
                policy_id: None,
                client_id: None,
                claim_number: None,
                occurrence_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                report_date: None,
                claim_type: "Colisão".into(),
                priority: None,
                claim_amount: Some(1200.0),
                deductible_amount: None,
                description: "Colisão traseira".into(),
                location_occurrence: None,
                police_report_number: None,
            },
        )
        .await
        .unwrap();

        let updated = change_claim_status(&repo, claim.id, ClaimStatus::InAnalysis)
            .await
            .unwrap();
        assert_eq!(updated.status, ClaimStatus::InAnalysis);
        let activities = repo.list_claim_activities(claim.id).await.unwrap();
        assert!(activities
            .iter()
            .any(|a| a.new_status == Some(ClaimStatus::InAnalysis)
                && a.old_status == Some(ClaimStatus::Open)));

        let err = change_claim_status(&repo, claim.id, ClaimStatus::Closed)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn test_record_revenue_posts_balanced_movement() {
        let repo = LocalRepository::new();
        let accounts = repo.ensure_default_accounts().await.unwrap();
        let revenue = accounts
            .iter()
            .find(|a| a.account_type == AccountType::Revenue)
            .unwrap()
            .id;
        let asset = accounts
            .iter()
            .find(|a| a.account_type == AccountType::Asset)
            .unwrap()
            .id;

        let id = record_revenue(
            &repo,
            MovementRequest {
                description: "Comissão avulsa".into(),
                amount: 150.0,
                transaction_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                category_account_id: revenue,
                asset_account_id: asset,
                bank_account_id: None,
                reference_number: None,
                memo: None,
                due_date: None,
                is_confirmed: true,
            },
        )
        .await
        .unwrap();
        let recent = repo.get_recent_transactions(10, 0, None).await.unwrap();
        assert_eq!(recent[0].transaction.id, id);
        assert_eq!(recent[0].entries.len(), 2);

        let rejected = record_expense(
            &repo,
            MovementRequest {
                description: " ".into(),
                amount: -1.0,
                transaction_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                category_account_id: revenue,
                asset_account_id: asset,
                bank_account_id: None,
                reference_number: None,
                memo: None,
                due_date: None,
                is_confirmed: true,
            },
        )
        .await;
        assert!(rejected.is_err());
    }
}
