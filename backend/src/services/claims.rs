//! Claim list filters, quick stats and status workflow.

use serde::{Deserialize, Serialize};

use crate::models::{Claim, ClaimStatus};

/// Sentinel for "no filter" on status and type.
pub const ALL: &str = "Todos";

/// Claim types offered by the claim form.
pub const CLAIM_TYPES: &[&str] = &[
    "Colisão",
    "Roubo",
    "Furto",
    "Incêndio",
    "Danos Elétricos",
    "Enchente",
    "Granizo",
    "Vandalismo",
    "Quebra de Vidros",
    "Assistência 24h",
    "Outros",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimFilters {
    pub search: String,
    pub status: String,
    pub claim_type: String,
}

impl Default for ClaimFilters {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: ALL.to_string(),
            claim_type: ALL.to_string(),
        }
    }
}

fn contains(field: Option<&str>, term: &str) -> bool {
    field.is_some_and(|f| f.to_lowercase().contains(term))
}

pub fn matches(claim: &Claim, filters: &ClaimFilters) -> bool {
    let term = filters.search.trim().to_lowercase();
    let matches_search = term.is_empty()
        || contains(claim.claim_number.as_deref(), &term)
        || contains(claim.client_name.as_deref(), &term)
        || contains(claim.policy_number.as_deref(), &term)
        || contains(Some(&claim.claim_type), &term)
        || contains(Some(&claim.description), &term);

    let status = filters.status.trim();
    let matches_status = status.is_empty() || status == ALL || claim.status.label() == status;

    let claim_type = filters.claim_type.trim();
    let matches_type = claim_type.is_empty() || claim_type == ALL || claim.claim_type == claim_type;

    matches_search && matches_status && matches_type
}

pub fn filter_claims<'c>(claims: &'c [Claim], filters: &ClaimFilters) -> Vec<&'c Claim> {
    claims.iter().filter(|c| matches(c, filters)).collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimStats {
    pub total: usize,
    pub open: usize,
    pub in_analysis: usize,
    pub approved: usize,
    /// Sum of claimed amounts; missing amounts count as zero.
    pub total_claimed: f64,
}

pub fn claim_stats<'a, I>(claims: I) -> ClaimStats
where
    I: IntoIterator<Item = &'a Claim>,
{
    claims.into_iter().fold(ClaimStats::default(), |mut s, c| {
        s.total += 1;
        match c.status {
            ClaimStatus::Open => s.open += 1,
            ClaimStatus::InAnalysis => s.in_analysis += 1,
            ClaimStatus::Approved => s.approved += 1,
            _ => {}
        }
        s.total_claimed += c.claim_amount.filter(|v| v.is_finite()).unwrap_or(0.0);
        s
    })
}

/// Statuses reachable from `from`.
pub fn allowed_transitions(from: ClaimStatus) -> &'static [ClaimStatus] {
    use ClaimStatus::*;
    match from {
        Open => &[InAnalysis, PendingDocuments, Cancelled],
        InAnalysis => &[PendingDocuments, Approved, Denied, Cancelled],
        PendingDocuments => &[InAnalysis, Cancelled],
        Approved => &[Closed],
        Denied => &[InAnalysis, Closed],
        Cancelled | Closed => &[],
    }
}

pub fn can_transition(from: ClaimStatus, to: ClaimStatus) -> bool {
    allowed_transitions(from).contains(&to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClaimInput, Priority};
    use chrono::NaiveDate;

    fn claim(kind: &str, status: ClaimStatus, amount: Option<f64>) -> Claim {
        let mut c = ClaimInput {
            policy_id: None,
            client_id: None,
            claim_number: Some("SIN-001".into()),
            occurrence_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            report_date: None,
            claim_type: kind.into(),
            priority: Some(Priority::Medium),
            claim_amount: amount,
            deductible_amount: None,
            description: "Batida no estacionamento".into(),
            location_occurrence: None,
            police_report_number: None,
        }
        .into_claim(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        c.status = status;
        c
    }

    #[test]
    fn test_filters() {
        let claims = vec![
            claim("Colisão", ClaimStatus::Open, Some(1000.0)),
            claim("Roubo", ClaimStatus::Approved, None),
        ];
        let by_type = ClaimFilters {
            claim_type: "Roubo".into(),
            ..ClaimFilters::default()
        };
        assert_eq!(filter_claims(&claims, &by_type).len(), 1);

        let by_search = ClaimFilters {
            search: "ESTACIONAMENTO".into(),
            status: "Aberto".into(),
            ..ClaimFilters::default()
        };
        let found = filter_claims(&claims, &by_search);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].claim_type, "Colisão");
    }

    #[test]
    fn test_stats() {
        let claims = vec![
            claim("Colisão", ClaimStatus::Open, Some(1000.0)),
            claim("Roubo", ClaimStatus::Approved, Some(500.0)),
            claim("Furto", ClaimStatus::InAnalysis, None),
        ];
        let stats = claim_stats(&claims);
        assert_eq!(stats.total, 3);
        assert_eq!((stats.open, stats.in_analysis, stats.approved), (1, 1, 1));
        assert_eq!(stats.total_claimed, 1500.0);
    }

    #[test]
    fn test_terminal_statuses_have_no_transitions() {
        for status in ClaimStatus::ALL {
            assert_eq!(status.is_terminal(), allowed_transitions(status).is_empty());
            assert!(!can_transition(status, status));
        }
        assert!(can_transition(ClaimStatus::InAnalysis, ClaimStatus::Approved));
        assert!(!can_transition(ClaimStatus::Open, ClaimStatus::Closed));
    }
}
