//! Portfolio KPIs shown above the policy list.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::Policy;

/// Active policies expiring within this many days count as "expiring soon".
pub const EXPIRING_SOON_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyKpis {
    pub total_active: usize,
    /// Premium of every policy in the slice, whatever its status.
    pub total_premium: f64,
    pub estimated_commission: f64,
    pub expiring_soon: usize,
}

pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    (date - today).num_days()
}

/// Aggregate KPIs over already-filtered policies.
pub fn compute_policy_kpis<'a, I>(policies: I, today: NaiveDate) -> PolicyKpis
where
    I: IntoIterator<Item = &'a Policy>,
{
    policies
        .into_iter()
        .fold(PolicyKpis::default(), |mut acc, policy| {
            let premium = if policy.premium_value.is_finite() {
                policy.premium_value
            } else {
                0.0
            };
            let rate = if policy.commission_rate.is_finite() {
                policy.commission_rate
            } else {
                0.0
            };
            acc.total_premium += premium;
            acc.estimated_commission += premium * rate / 100.0;

            if policy.is_active() {
                acc.total_active += 1;
                let days = days_until(policy.expiration_date, today);
                if (0..=EXPIRING_SOON_DAYS).contains(&days) {
                    acc.expiring_soon += 1;
                }
            }
            acc
        })
}
