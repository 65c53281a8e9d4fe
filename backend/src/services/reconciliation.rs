//! Reconciliation payload decoding and suggestion ranking.

use serde_json::Value;

use super::ledger::lenient_number;
use crate::models::{KpisComparison, MatchSuggestion, ReconciliationKpis};

fn kpis_from_object(value: Option<&Value>) -> ReconciliationKpis {
    let field = |name: &str| lenient_number(value.and_then(|v| v.get(name)));
    let count = |name: &str| field(name).max(0.0) as u64;
    ReconciliationKpis {
        total_count: count("total_count"),
        reconciled_count: count("reconciled_count"),
        pending_count: count("pending_count"),
        ignored_count: count("ignored_count"),
        total_amount: field("total_amount"),
        reconciled_amount: field("reconciled_amount"),
        pending_amount: field("pending_amount"),
        reconciled_revenue: field("reconciled_revenue"),
        reconciled_expense: field("reconciled_expense"),
        pending_revenue: field("pending_revenue"),
        pending_expense: field("pending_expense"),
    }
}

/// Decode `get_reconciliation_kpis`, flat or `{current, previous}`. A missing
/// previous period reads as zeros.
pub fn kpis_from_json(value: &Value) -> Result<KpisComparison, serde_json::Error> {
    match value {
        Value::Null => Ok(KpisComparison::default()),
        Value::Object(map) => {
            let current = map.get("current").filter(|c| c.is_object()).unwrap_or(value);
            Ok(KpisComparison {
                current: kpis_from_object(Some(current)),
                previous: kpis_from_object(map.get("previous")),
            })
        }
        other => Err(serde::de::Error::custom(format!(
            "unexpected reconciliation kpis payload: {}",
            other
        ))),
    }
}

/// Suggestions at or above `min_confidence`, most confident first.
pub fn filter_suggestions(
    suggestions: Vec<MatchSuggestion>,
    min_confidence: f64,
) -> Vec<MatchSuggestion> {
    let mut kept: Vec<MatchSuggestion> = suggestions
        .into_iter()
        .filter(|s| s.confidence >= min_confidence)
        .collect();
    kept.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    kept
}

/// Share of statement entries already reconciled, in percent.
pub fn reconciled_percent(kpis: &ReconciliationKpis) -> f64 {
    if kpis.total_count == 0 {
        return 0.0;
    }
    kpis.reconciled_count as f64 / kpis.total_count as f64 * 100.0
}
