//! Client-side business rules.
//!
//! This module holds the computations that run on data already fetched from
//! the backend: list filters and sorting, KPIs, currency formatting, form
//! validation, commission rates and the ledger movement builders. Everything
//! here is pure except [`dashboard`], which reads through a repository.

pub mod agenda;
pub mod claims;
pub mod commission;
pub mod crm;
pub mod currency;
pub mod dashboard;
pub mod ledger;
pub mod messages;
pub mod periods;
pub mod policy_filter;
pub mod policy_kpis;
pub mod reconciliation;
pub mod transaction_metrics;
pub mod validation;

pub use currency::{format_brl, format_percent, parse_brl};
pub use dashboard::{load_dashboard, Dashboard};
pub use messages::{friendly_message, friendly_text};
pub use periods::{DateRange, PolicyPeriod, TransactionPeriod};
pub use policy_filter::{filter_and_sort, PolicyFilters, SortConfig, SortDirection, SortKey};
pub use policy_kpis::{compute_policy_kpis, PolicyKpis};
pub use transaction_metrics::{compute_metrics, TransactionMetrics};
pub use validation::{FieldError, ValidationErrors};
