//! In-memory local repository implementation.
//!
//! This module provides a local implementation of all repository traits
//! suitable for unit testing and local development. Tables live in
//! `HashMap`s behind a single lock; backend procedures are emulated with just
//! enough bookkeeping for services and HTTP handlers to be exercised without a
//! network:
//!
//! ```text
//!  create_financial_movement   balanced entries only, bank leg appended when confirmed
//!  void_financial_transaction  original flagged void + reversal with negated entries
//!  get_account_balances        per-account sum of every posted entry
//!  import_bank_statement_batch sha256 fingerprint per batch, repeats fail with 23505
//!  suggest_reconciliation...   |amount diff| <= 0.01 and |date diff| <= 5 days
//! ```
//!
//! Data is single-tenant: there is no user scoping.

mod claims;
mod crm;
mod finance;
mod ledger;
mod portfolio;
mod reconciliation;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::db::repository::{ErrorContext, RepositoryError, RepositoryResult};
use crate::models::*;

/// In-memory local repository.
///
/// # Example
/// ```
/// use brokerdesk::db::repositories::LocalRepository;
/// use brokerdesk::db::repository::PortfolioRepository;
///
/// # tokio_test_block(async {
/// let repo = LocalRepository::new();
/// repo.create_company("Porto Seguro").await.unwrap();
/// assert_eq!(repo.list_companies().await.unwrap().len(), 1);
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f)
/// # }
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    // Portfolio
    clients: HashMap<ClientId, Client>,
    policies: HashMap<PolicyId, Policy>,
    companies: HashMap<CompanyId, Company>,
    producers: HashMap<ProducerId, Producer>,

    // Legacy finance
    transactions: HashMap<TransactionId, Transaction>,
    transaction_types: HashMap<TransactionTypeId, TransactionType>,
    recurring_configs: HashMap<RecurringConfigId, RecurringConfig>,

    // Ledger, in posting order
    accounts: HashMap<AccountId, FinancialAccount>,
    ledger: Vec<TransactionWithEntries>,

    // Reconciliation
    statement_entries: HashMap<StatementEntryId, BankStatementEntry>,
    import_fingerprints: HashSet<String>,

    // Claims, agenda, CRM
    claims: HashMap<ClaimId, Claim>,
    claim_activities: Vec<ClaimActivity>,
    appointments: HashMap<AppointmentId, Appointment>,
    pipelines: HashMap<PipelineId, Pipeline>,
    stages: HashMap<StageId, Stage>,
    deals: HashMap<DealId, Deal>,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            clients: HashMap::new(),
            policies: HashMap::new(),
            companies: HashMap::new(),
            producers: HashMap::new(),
            transactions: HashMap::new(),
            transaction_types: HashMap::new(),
            recurring_configs: HashMap::new(),
            accounts: HashMap::new(),
            ledger: Vec::new(),
            statement_entries: HashMap::new(),
            import_fingerprints: HashSet::new(),
            claims: HashMap::new(),
            claim_activities: Vec::new(),
            appointments: HashMap::new(),
            pipelines: HashMap::new(),
            stages: HashMap::new(),
            deals: HashMap::new(),
            is_healthy: true,
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }

    /// Register a producer. Producers are managed outside this crate.
    pub fn add_producer(&self, name: impl Into<String>) -> Producer {
        let producer = Producer {
            id: ProducerId::new(),
            name: name.into(),
            email: None,
        };
        self.data
            .write()
            .producers
            .insert(producer.id, producer.clone());
        producer
    }

    /// Number of posted ledger movements, reversals included.
    pub fn ledger_len(&self) -> usize {
        self.data.read().ledger.len()
    }

    /// Helper to check health and return error if unhealthy.
    fn check_health(&self) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::connection_with_context(
                "Backend is not healthy",
                ErrorContext::default().with_code("NETWORK_ERROR"),
            ));
        }
        Ok(())
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(entity: &str, id: impl ToString) -> RepositoryError {
    let id = id.to_string();
    RepositoryError::not_found_with_context(
        format!("{} {} not found", entity, id),
        ErrorContext::default()
            .with_entity(entity)
            .with_entity_id(id)
            .with_code("PGRST116"),
    )
}

/// Foreign-key style violation.
fn missing_reference(entity: &str, id: impl ToString) -> RepositoryError {
    let id = id.to_string();
    RepositoryError::validation_with_context(
        format!("{} {} does not exist", entity, id),
        ErrorContext::default()
            .with_entity(entity)
            .with_entity_id(id)
            .with_code("23503"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::PortfolioRepository;

    #[tokio::test]
    async fn test_unhealthy_repository_rejects_calls() {
        let repo = LocalRepository::new();
        assert!(repo.health_check().await.unwrap());

        repo.set_healthy(false);
        assert!(!repo.health_check().await.unwrap());
        let err = repo.list_clients().await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.code(), Some("NETWORK_ERROR"));
    }

    #[tokio::test]
    async fn test_clear_keeps_health_flag() {
        let repo = LocalRepository::new();
        repo.create_company("Allianz").await.unwrap();
        repo.set_healthy(false);
        repo.clear();
        repo.set_healthy(true);
        assert!(repo.list_companies().await.unwrap().is_empty());
    }
}
