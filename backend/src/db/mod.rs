//! Data access for the brokerage back office.
//!
//! All records live in a hosted backend (tables plus named procedures).
//! This module hides it behind repository traits so the same services run
//! against the real backend or an in-memory stand-in.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Application Layer (HTTP API, CLI, tests)                │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (services.rs)                            │
//! │  - Validation in front of writes                        │
//! │  - Commission generation on policy activation           │
//! │  - Claim workflow                                       │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Traits (repository/) - Abstract Interface   │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴──────────────┐
//!     │                              │
//! ┌───▼──────────────┐    ┌──────────▼─────────┐
//! │ RestRepository   │    │  LocalRepository   │
//! │ (PostgREST+/rpc) │    │  (in-memory)       │
//! └──────────────────┘    └────────────────────┘
//! ```
//!
//! # Recommended Usage
//!
//! ```ignore
//! use brokerdesk::db::{services, RepositoryFactory};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = RepositoryFactory::from_env()?;
//!     let healthy = services::health_check(repo.as_ref()).await?;
//!     Ok(())
//! }
//! ```

#[cfg(not(any(feature = "rest-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod checksum;
pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;
pub mod services;

#[cfg(feature = "rest-repo")]
pub use repositories::RestConfig;
#[cfg(not(feature = "rest-repo"))]
#[derive(Debug, Clone)]
pub struct RestConfig {
    _private: (),
}

// ==================== Service Layer ====================

pub use services::{
    activate_policy, change_claim_status, create_claim, create_client, create_policy,
    create_transaction, health_check, post_movement, record_expense, record_revenue,
    PolicyActivation,
};

// ==================== Repository Pattern Exports ====================

pub use checksum::{calculate_checksum, fingerprint};
pub use repo_config::RepositoryConfig;

pub use factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
#[cfg(feature = "local-repo")]
pub use repositories::LocalRepository;
#[cfg(feature = "rest-repo")]
pub use repositories::RestRepository;
pub use repository::{
    AgendaRepository, ClaimRepository, CrmRepository, ErrorContext, FinanceRepository,
    FullRepository, LedgerRepository, MovementKind, PortfolioRepository,
    ReconciliationRepository, RepositoryError, RepositoryResult,
};

use anyhow::{Context, Result};
use std::sync::{Arc, OnceLock};

/// Global repository instance initialized once per process.
static REPOSITORY: OnceLock<Arc<dyn FullRepository>> = OnceLock::new();

/// Environment first, then `repository.toml`, then the in-memory store.
fn create_selected_repository() -> RepositoryResult<Arc<dyn FullRepository>> {
    let env_selected = std::env::var("REPOSITORY_TYPE").is_ok()
        || std::env::var("BACKEND_URL").is_ok();
    if env_selected {
        return RepositoryFactory::from_env();
    }
    match RepositoryFactory::from_default_config() {
        Ok(repo) => Ok(repo),
        Err(e) => {
            log::debug!("No usable repository.toml ({}), using environment defaults", e);
            RepositoryFactory::from_env()
        }
    }
}

/// Initialize the global repository singleton for the selected backend.
pub fn init_repository() -> Result<()> {
    if REPOSITORY.get().is_some() {
        return Ok(());
    }

    let repo = create_selected_repository()
        .map_err(|e| anyhow::Error::msg(e.to_string()))
        .context("Failed to create repository")?;
    let _ = REPOSITORY.set(repo);
    Ok(())
}

/// Get a reference to the global repository instance.
pub fn get_repository() -> Result<&'static Arc<dyn FullRepository>> {
    if REPOSITORY.get().is_none() {
        let _ = init_repository();
    }

    REPOSITORY
        .get()
        .context("Repository not initialized. Call init_repository() first.")
}
