//! Dashboard aggregate assembled from independent repository reads.

use chrono::NaiveDateTime;
use serde::Serialize;

use super::agenda::{immediate_focus, weekly_stats, FocusItem, WeeklyStats, DEFAULT_FOCUS_LIMIT};
use super::claims::{claim_stats, ClaimStats};
use super::periods::TransactionPeriod;
use super::policy_kpis::{compute_policy_kpis, PolicyKpis};
use super::transaction_metrics::{compute_metrics, filter_transactions, TransactionMetrics};
use crate::db::repository::{FullRepository, RepositoryResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub policy_kpis: PolicyKpis,
    /// Legacy module totals for the current month.
    pub month_metrics: TransactionMetrics,
    pub claim_stats: ClaimStats,
    pub focus: Vec<FocusItem>,
    pub weekly: WeeklyStats,
    pub client_count: usize,
}

/// Load every dashboard section. The reads run concurrently and the first
/// failure aborts the whole load.
pub async fn load_dashboard<R: FullRepository + ?Sized>(
    repo: &R,
    now: NaiveDateTime,
) -> RepositoryResult<Dashboard> {
    let today = now.date();
    let (clients, policies, transactions, claims, appointments) = futures::try_join!(
        repo.list_clients(),
        repo.list_policies(),
        repo.list_transactions(),
        repo.list_claims(),
        repo.list_appointments(),
    )?;

    let month = filter_transactions(
        &transactions,
        &policies,
        TransactionPeriod::CurrentMonth,
        None,
        today,
    );

    let dashboard = Dashboard {
        policy_kpis: compute_policy_kpis(&policies, today),
        month_metrics: compute_metrics(month),
        claim_stats: claim_stats(&claims),
        focus: immediate_focus(&appointments, now, DEFAULT_FOCUS_LIMIT),
        weekly: weekly_stats(&appointments, today),
        client_count: clients.len(),
    };
    log::debug!(
        "Dashboard loaded: {} clients, {} policies, {} claims",
        dashboard.client_count,
        policies.len(),
        claims.len()
    );
    Ok(dashboard)
}
