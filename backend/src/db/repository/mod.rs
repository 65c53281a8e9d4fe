//! Repository trait definitions for backend access.
//!
//! The hosted backend is split into focused traits so that implementations
//! and test doubles stay small.
//!
//! # Module Organization
//!
//! - [`error`]: Error types for repository operations
//! - [`portfolio`]: Clients, policies, insurers and producers
//! - [`finance`]: Legacy transactions and recurring configurations
//! - [`ledger`]: Double-entry ledger procedures
//! - [`reconciliation`]: Bank statement import and matching
//! - [`claims`]: Claims and their timeline
//! - [`agenda`]: Appointments
//! - [`crm`]: Pipelines, stages and deals
//!
//! # Convenience Trait Bound
//!
//! For functions that need every capability, use [`FullRepository`]:
//!
//! ```ignore
//! async fn activate<R: FullRepository + ?Sized>(repo: &R, id: PolicyId) -> RepositoryResult<()> {
//!     let policy = repo.get_policy(id).await?;
//!     repo.register_policy_commission(&registration_for(&policy)).await?;
//!     Ok(())
//! }
//! ```

pub mod agenda;
pub mod claims;
pub mod crm;
pub mod error;
pub mod finance;
pub mod ledger;
pub mod portfolio;
pub mod reconciliation;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

pub use agenda::AgendaRepository;
pub use claims::ClaimRepository;
pub use crm::CrmRepository;
pub use finance::FinanceRepository;
pub use ledger::{LedgerRepository, MovementKind};
pub use portfolio::PortfolioRepository;
pub use reconciliation::ReconciliationRepository;

/// Composite trait bound for a complete repository implementation.
///
/// Automatically implemented for any type that implements all seven
/// repository traits.
pub trait FullRepository:
    PortfolioRepository
    + FinanceRepository
    + LedgerRepository
    + ReconciliationRepository
    + ClaimRepository
    + AgendaRepository
    + CrmRepository
{
}

impl<T> FullRepository for T where
    T: PortfolioRepository
        + FinanceRepository
        + LedgerRepository
        + ReconciliationRepository
        + ClaimRepository
        + AgendaRepository
        + CrmRepository
{
}
