//! Multi-criteria filtering and sorting of the policy list.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use super::periods::PolicyPeriod;
use crate::models::{Client, ClientId, Company, Policy, Producer, ProducerId};

/// Sentinel for "no filter" on masculine fields (status, ramo, producer).
pub const ALL_M: &str = "todos";
/// Sentinel for "no filter" on the insurance company.
pub const ALL_F: &str = "todas";

fn is_sentinel(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || v == ALL_M || v == ALL_F
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyFilters {
    pub search_term: String,
    pub status: String,
    /// Company id, or `todas`.
    pub insurance_company: String,
    pub period: PolicyPeriod,
    pub producer_id: String,
    pub ramo: String,
    pub custom_start: Option<NaiveDate>,
    pub custom_end: Option<NaiveDate>,
}

impl Default for PolicyFilters {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            status: ALL_M.to_string(),
            insurance_company: ALL_F.to_string(),
            period: PolicyPeriod::Todos,
            producer_id: ALL_M.to_string(),
            ramo: ALL_M.to_string(),
            custom_start: None,
            custom_end: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    ClientName,
    InsuranceCompany,
    ProducerName,
    #[serde(rename = "type")]
    Ramo,
    PremiumValue,
    #[default]
    ExpirationDate,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Column and direction of the policy table. Defaults to expiration date,
/// ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SortConfig {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortConfig {
    /// Clicking the active ascending column flips it; any other click sorts
    /// the clicked column ascending.
    pub fn toggle(self, key: SortKey) -> Self {
        let direction = if self.key == key && self.direction == SortDirection::Asc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        Self { key, direction }
    }
}

/// Names used to search and sort by client and producer.
#[derive(Debug, Default)]
pub struct Lookup<'a> {
    clients: HashMap<ClientId, &'a str>,
    producers: HashMap<ProducerId, &'a str>,
}

impl<'a> Lookup<'a> {
    pub fn new(clients: &'a [Client], producers: &'a [Producer]) -> Self {
        Self {
            clients: clients.iter().map(|c| (c.id, c.name.as_str())).collect(),
            producers: producers.iter().map(|p| (p.id, p.name.as_str())).collect(),
        }
    }

    pub fn client_name(&self, policy: &Policy) -> &'a str {
        self.clients.get(&policy.client_id).copied().unwrap_or("")
    }

    pub fn producer_name(&self, policy: &Policy) -> &'a str {
        policy
            .producer_id
            .and_then(|id| self.producers.get(&id).copied())
            .unwrap_or("")
    }
}

/// Case-insensitive search over policy number, client name and insured asset.
pub fn matches_search(policy: &Policy, client_name: &str, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    policy
        .policy_number
        .as_deref()
        .is_some_and(|n| n.to_lowercase().contains(&term))
        || client_name.to_lowercase().contains(&term)
        || policy.insured_asset.to_lowercase().contains(&term)
}

/// Whether `policy` passes every filter except the search term.
pub fn matches_filters(policy: &Policy, filters: &PolicyFilters, today: NaiveDate) -> bool {
    if !is_sentinel(&filters.status) && policy.status.label() != filters.status {
        return false;
    }
    if !is_sentinel(&filters.insurance_company)
        && policy.insurance_company.map(|c| c.to_string()).as_deref()
            != Some(filters.insurance_company.as_str())
    {
        return false;
    }
    if !is_sentinel(&filters.ramo) && policy.ramo.as_deref() != Some(filters.ramo.as_str()) {
        return false;
    }
    if !is_sentinel(&filters.producer_id)
        && policy.producer_id.map(|p| p.to_string()).as_deref()
            != Some(filters.producer_id.as_str())
    {
        return false;
    }
    match filters
        .period
        .range(today, filters.custom_start, filters.custom_end)
    {
        Some(range) => range.contains(policy.expiration_date),
        None => true,
    }
}

pub fn filter_policies<'p>(
    policies: &'p [Policy],
    filters: &PolicyFilters,
    lookup: &Lookup<'_>,
    today: NaiveDate,
) -> Vec<&'p Policy> {
    policies
        .iter()
        .filter(|p| matches_search(p, lookup.client_name(p), &filters.search_term))
        .filter(|p| matches_filters(p, filters, today))
        .collect()
}

fn compare(a: &Policy, b: &Policy, key: SortKey, lookup: &Lookup<'_>) -> Ordering {
    let text = |x: &str, y: &str| x.to_lowercase().cmp(&y.to_lowercase());
    match key {
        SortKey::ClientName => text(lookup.client_name(a), lookup.client_name(b)),
        SortKey::InsuranceCompany => text(
            a.insurance_company_name.as_deref().unwrap_or(""),
            b.insurance_company_name.as_deref().unwrap_or(""),
        ),
        SortKey::ProducerName => text(lookup.producer_name(a), lookup.producer_name(b)),
        SortKey::Ramo => text(
            a.ramo.as_deref().unwrap_or(""),
            b.ramo.as_deref().unwrap_or(""),
        ),
        SortKey::PremiumValue => a.premium_value.total_cmp(&b.premium_value),
        SortKey::ExpirationDate => a.expiration_date.cmp(&b.expiration_date),
        SortKey::Status => text(a.status.label(), b.status.label()),
    }
}

/// Stable sort; equal keys keep their input order in both directions.
pub fn sort_policies(policies: &mut [&Policy], sort: SortConfig, lookup: &Lookup<'_>) {
    policies.sort_by(|a, b| {
        let ord = compare(a, b, sort.key, lookup);
        match sort.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}

/// Filter then sort, as the policy table shows them.
pub fn filter_and_sort<'p>(
    policies: &'p [Policy],
    filters: &PolicyFilters,
    sort: SortConfig,
    lookup: &Lookup<'_>,
    today: NaiveDate,
) -> Vec<&'p Policy> {
    let mut rows = filter_policies(policies, filters, lookup, today);
    sort_policies(&mut rows, sort, lookup);
    log::debug!(
        "Filtered {} of {} policies (sort={:?})",
        rows.len(),
        policies.len(),
        sort
    );
    rows
}

/// Distinct insurers present in the list, sorted by name.
///
/// Each option carries the company id, which is the value the
/// `insuranceCompany` filter matches on.
pub fn unique_insurance_companies(policies: &[Policy]) -> Vec<Company> {
    let mut companies: Vec<Company> = policies
        .iter()
        .filter_map(|p| {
            let id = p.insurance_company?;
            let name = p
                .insurance_company_name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| id.to_string());
            Some(Company { id, name })
        })
        .collect();
    companies.sort_by_key(|c| c.id);
    companies.dedup_by_key(|c| c.id);
    companies.sort_by_cached_key(|c| c.name.to_lowercase());
    companies
}
