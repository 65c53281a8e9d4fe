//! Filters and totals of the legacy financial module.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::periods::TransactionPeriod;
use crate::models::{CompanyId, Policy, PolicyId, Transaction};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMetrics {
    /// Realized income.
    pub total_income: f64,
    /// Realized expense.
    pub total_expense: f64,
    /// Open income minus open expense.
    pub forecast_total: f64,
    /// Realized income minus realized expense.
    pub net_balance: f64,
}

/// Keep transactions whose competence date falls in `period` and that relate
/// to `company` directly or through their policy's insurer.
pub fn filter_transactions<'t>(
    transactions: &'t [Transaction],
    policies: &[Policy],
    period: TransactionPeriod,
    company: Option<CompanyId>,
    today: NaiveDate,
) -> Vec<&'t Transaction> {
    let range = period.range(today);
    let insurer_by_policy: HashMap<PolicyId, CompanyId> = policies
        .iter()
        .filter_map(|p| p.insurance_company.map(|c| (p.id, c)))
        .collect();

    transactions
        .iter()
        .filter(|t| range.is_none_or(|r| r.contains(t.date)))
        .filter(|t| match company {
            None => true,
            Some(company) => {
                t.company_id == Some(company)
                    || t
                        .policy_id
                        .and_then(|p| insurer_by_policy.get(&p))
                        .is_some_and(|c| *c == company)
            }
        })
        .collect()
}

pub fn compute_metrics<'a, I>(transactions: I) -> TransactionMetrics
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut metrics = TransactionMetrics::default();
    for t in transactions {
        if t.is_realized() {
            if t.is_income() {
                metrics.total_income += t.amount;
            } else {
                metrics.total_expense += t.amount;
            }
        } else if t.is_forecast() {
            if t.is_income() {
                metrics.forecast_total += t.amount;
            } else {
                metrics.forecast_total -= t.amount;
            }
        }
    }
    metrics.net_balance = metrics.total_income - metrics.total_expense;
    metrics
}
