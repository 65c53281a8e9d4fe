//! Policy table behaviour: filters, sorting and the KPIs shown above it.

mod support;

use proptest::prelude::*;

use brokerdesk::models::{Client, CompanyId, Policy, PolicyStatus};
use brokerdesk::services::periods::PolicyPeriod;
use brokerdesk::services::policy_filter::{
    filter_and_sort, unique_insurance_companies, Lookup, PolicyFilters, SortConfig,
    SortDirection, SortKey,
};
use brokerdesk::services::policy_kpis::compute_policy_kpis;
use support::{client_input, date, policy_input};

const STATUSES: [PolicyStatus; 5] = [
    PolicyStatus::Quote,
    PolicyStatus::AwaitingPolicy,
    PolicyStatus::Active,
    PolicyStatus::Cancelled,
    PolicyStatus::Renewed,
];

fn portfolio() -> (Vec<Client>, Vec<Policy>) {
    let ana = client_input("Ana Lima").into_client();
    let bruno = client_input("Bruno Dias").into_client();
    let mut policies = Vec::new();
    for (client, number, premium, status, expires) in [
        (&ana, "AP-1", 1200.0, PolicyStatus::Active, date(2025, 3, 20)),
        (&ana, "AP-2", 300.0, PolicyStatus::Quote, date(2025, 9, 1)),
        (&bruno, "AP-3", 800.0, PolicyStatus::Active, date(2025, 5, 15)),
        (&bruno, "AP-4", 450.0, PolicyStatus::Cancelled, date(2025, 2, 1)),
    ] {
        let mut input = policy_input(client, number, premium, expires);
        input.status = status;
        input.start_date = None;
        policies.push(input.into_policy());
    }
    (vec![ana, bruno], policies)
}

fn numbers(rows: &[&Policy]) -> Vec<String> {
    rows.iter()
        .map(|p| p.policy_number.clone().unwrap_or_default())
        .collect()
}

#[test]
fn test_search_by_client_name_and_status() {
    let (clients, policies) = portfolio();
    let lookup = Lookup::new(&clients, &[]);
    let filters = PolicyFilters {
        search_term: "bruno".into(),
        status: "Ativa".into(),
        ..PolicyFilters::default()
    };
    let rows = filter_and_sort(&policies, &filters, SortConfig::default(), &lookup, date(2025, 3, 1));
    assert_eq!(numbers(&rows), ["AP-3"]);
}

#[test]
fn test_offered_insurers_filter_their_own_policies() {
    let (clients, mut policies) = portfolio();
    let porto = CompanyId::new();
    let allianz = CompanyId::new();
    for (policy, (company, name)) in policies.iter_mut().zip([
        (porto, "Porto Seguro"),
        (allianz, "Allianz"),
        (porto, "Porto Seguro"),
    ]) {
        policy.insurance_company = Some(company);
        policy.insurance_company_name = Some(name.into());
    }
    let lookup = Lookup::new(&clients, &[]);

    let offered = unique_insurance_companies(&policies);
    let names: Vec<&str> = offered.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Allianz", "Porto Seguro"]);

    let filters = PolicyFilters {
        insurance_company: offered[1].id.to_string(),
        ..PolicyFilters::default()
    };
    let rows = filter_and_sort(&policies, &filters, SortConfig::default(), &lookup, date(2025, 3, 1));
    assert_eq!(numbers(&rows), ["AP-1", "AP-3"]);
}

#[test]
fn test_next_30_days_and_expired_periods() {
    let (clients, policies) = portfolio();
    let lookup = Lookup::new(&clients, &[]);
    let today = date(2025, 3, 1);

    let soon = PolicyFilters {
        period: PolicyPeriod::Next30Days,
        ..PolicyFilters::default()
    };
    let rows = filter_and_sort(&policies, &soon, SortConfig::default(), &lookup, today);
    assert_eq!(numbers(&rows), ["AP-1"]);

    let expired = PolicyFilters {
        period: PolicyPeriod::Expired,
        ..PolicyFilters::default()
    };
    let rows = filter_and_sort(&policies, &expired, SortConfig::default(), &lookup, today);
    assert_eq!(numbers(&rows), ["AP-4"]);
}

#[test]
fn test_sort_by_client_then_premium() {
    let (clients, policies) = portfolio();
    let lookup = Lookup::new(&clients, &[]);
    let by_client_desc = SortConfig {
        key: SortKey::ClientName,
        direction: SortDirection::Desc,
    };
    let rows = filter_and_sort(
        &policies,
        &PolicyFilters::default(),
        by_client_desc,
        &lookup,
        date(2025, 3, 1),
    );
    // Stable: equal client names keep their input order.
    assert_eq!(numbers(&rows), ["AP-3", "AP-4", "AP-1", "AP-2"]);

    let toggled = SortConfig::default().toggle(SortKey::PremiumValue);
    let rows = filter_and_sort(&policies, &PolicyFilters::default(), toggled, &lookup, date(2025, 3, 1));
    assert_eq!(numbers(&rows), ["AP-2", "AP-4", "AP-3", "AP-1"]);
}

#[test]
fn test_kpis_over_filtered_rows() {
    let (clients, policies) = portfolio();
    let lookup = Lookup::new(&clients, &[]);
    let today = date(2025, 3, 1);
    let filters = PolicyFilters {
        search_term: "ana".into(),
        ..PolicyFilters::default()
    };
    let rows = filter_and_sort(&policies, &filters, SortConfig::default(), &lookup, today);
    let kpis = compute_policy_kpis(rows.iter().copied(), today);
    assert_eq!(kpis.total_active, 1);
    assert_eq!(kpis.total_premium, 1500.0);
    assert_eq!(kpis.estimated_commission, 150.0);
    assert_eq!(kpis.expiring_soon, 1);
}

fn arb_policies() -> impl Strategy<Value = Vec<(f64, usize, u32)>> {
    prop::collection::vec((0.0f64..10_000.0, 0usize..STATUSES.len(), 1u32..365), 0..30)
}

proptest! {
    #[test]
    fn prop_filters_never_add_rows(rows in arb_policies(), status in 0usize..STATUSES.len()) {
        let client = client_input("Ana Lima").into_client();
        let policies: Vec<Policy> = rows
            .iter()
            .map(|(premium, s, days)| {
                let mut input = policy_input(&client, "AP", *premium, date(2025, 1, 1) + chrono::Duration::days(*days as i64));
                input.status = STATUSES[*s];
                input.start_date = None;
                input.into_policy()
            })
            .collect();
        let clients = [client];
        let lookup = Lookup::new(&clients, &[]);
        let filters = PolicyFilters {
            status: STATUSES[status].label().to_string(),
            ..PolicyFilters::default()
        };
        let filtered = filter_and_sort(&policies, &filters, SortConfig::default(), &lookup, date(2025, 1, 1));
        prop_assert!(filtered.len() <= policies.len());
        prop_assert!(filtered.iter().all(|p| p.status == STATUSES[status]));
    }

    #[test]
    fn prop_premium_sort_is_ordered(rows in arb_policies()) {
        let client = client_input("Ana Lima").into_client();
        let policies: Vec<Policy> = rows
            .iter()
            .map(|(premium, _, days)| {
                let mut input = policy_input(&client, "AP", *premium, date(2025, 1, 1) + chrono::Duration::days(*days as i64));
                input.start_date = None;
                input.into_policy()
            })
            .collect();
        let clients = [client];
        let lookup = Lookup::new(&clients, &[]);
        let sort = SortConfig { key: SortKey::PremiumValue, direction: SortDirection::Desc };
        let sorted = filter_and_sort(&policies, &PolicyFilters::default(), sort, &lookup, date(2025, 1, 1));
        prop_assert_eq!(sorted.len(), policies.len());
        prop_assert!(sorted.windows(2).all(|w| w[0].premium_value >= w[1].premium_value));

        let kpis = compute_policy_kpis(sorted.iter().copied(), date(2025, 1, 1));
        let total: f64 = policies.iter().map(|p| p.premium_value).sum();
        prop_assert!((kpis.total_premium - total).abs() < 1e-6);
    }
}
