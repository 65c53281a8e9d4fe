//! Ledger movement builders and procedure payload decoding.
//!
//! Revenue and expense forms are turned into balanced entry sets here; the
//! bookkeeping itself stays with `create_financial_movement`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{
    AccountId, AccountType, DreRow, FinancialSummary, LedgerEntryInput, MovementInput,
    SummaryComparison,
};

/// A revenue or expense as entered on the financial forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementRequest {
    pub description: String,
    /// Positive amount in reais.
    pub amount: f64,
    pub transaction_date: NaiveDate,
    /// Revenue account for revenues, expense account for expenses.
    pub category_account_id: AccountId,
    /// Counterpart used when the movement does not go through a bank:
    /// e.g. `Comissões a Receber` or `Contas a Pagar`.
    pub asset_account_id: AccountId,
    #[serde(default)]
    pub bank_account_id: Option<AccountId>,
    #[serde(default)]
    pub reference_number: Option<String>,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_confirmed: bool,
}

impl MovementRequest {
    fn paid_through_bank(&self) -> bool {
        self.is_confirmed && self.bank_account_id.is_some()
    }

    fn entry(&self, account_id: AccountId, amount: f64) -> LedgerEntryInput {
        LedgerEntryInput {
            account_id,
            amount,
            memo: self.memo.clone(),
        }
    }

    fn into_movement(self, entries: Vec<LedgerEntryInput>) -> MovementInput {
        MovementInput {
            description: self.description,
            transaction_date: self.transaction_date,
            reference_number: self.reference_number,
            related_entity_type: None,
            related_entity_id: None,
            due_date: self.due_date,
            bank_account_id: self.bank_account_id,
            is_confirmed: self.is_confirmed,
            entries,
        }
    }
}

/// Credit the revenue account; debit the asset counterpart unless the
/// movement is confirmed against a bank, which the procedure posts itself.
pub fn revenue_movement(request: MovementRequest) -> MovementInput {
    let mut entries = Vec::with_capacity(2);
    if !request.paid_through_bank() {
        entries.push(request.entry(request.asset_account_id, request.amount));
    }
    entries.push(request.entry(request.category_account_id, -request.amount));
    request.into_movement(entries)
}

/// Debit the expense account; credit the counterpart unless paid through a
/// bank.
pub fn expense_movement(request: MovementRequest) -> MovementInput {
    let mut entries = Vec::with_capacity(2);
    entries.push(request.entry(request.category_account_id, request.amount));
    if !request.paid_through_bank() {
        entries.push(request.entry(request.asset_account_id, -request.amount));
    }
    request.into_movement(entries)
}

/// Read a number that may arrive as a JSON number, a numeric string or null.
pub(crate) fn lenient_number(value: Option<&Value>) -> f64 {
    let n = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

fn summary_from_object(value: &Value) -> FinancialSummary {
    let field = |name: &str| lenient_number(value.get(name));
    FinancialSummary {
        total_income: field("totalIncome"),
        total_expense: field("totalExpense"),
        net_result: field("netResult"),
        pending_income: field("pendingIncome"),
        pending_expense: field("pendingExpense"),
        transaction_count: field("transactionCount").max(0.0) as u64,
        cash_balance: field("cashBalance"),
    }
}

/// Decode `get_financial_summary`, which returns either a flat summary or
/// `{current, previous}`.
pub fn summary_from_json(value: &Value) -> Result<SummaryComparison, serde_json::Error> {
    match value {
        Value::Null => Ok(SummaryComparison::default()),
        Value::Object(map) => {
            if let Some(current) = map.get("current").filter(|c| c.is_object()) {
                Ok(SummaryComparison {
                    current: summary_from_object(current),
                    previous: map
                        .get("previous")
                        .filter(|p| p.is_object())
                        .map(summary_from_object),
                })
            } else {
                Ok(SummaryComparison {
                    current: summary_from_object(value),
                    previous: None,
                })
            }
        }
        other => Err(serde::de::Error::custom(format!(
            "unexpected financial summary payload: {}",
            other
        ))),
    }
}

/// Month columns of a `get_dre_data` row.
pub const DRE_MONTHS: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

#[derive(Deserialize)]
struct RawDreRow {
    category: String,
    account_type: AccountType,
    #[serde(flatten)]
    columns: serde_json::Map<String, Value>,
}

/// Decode `get_dre_data` rows (`category`, `account_type`, `jan`..`dez`,
/// `total`).
pub fn dre_rows_from_json(value: &Value) -> Result<Vec<DreRow>, serde_json::Error> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    let raw: Vec<RawDreRow> = serde_json::from_value(value.clone())?;
    Ok(raw
        .into_iter()
        .map(|row| {
            let mut months = [0.0; 12];
            for (slot, name) in months.iter_mut().zip(DRE_MONTHS) {
                *slot = lenient_number(row.columns.get(name));
            }
            let total = match row.columns.get("total") {
                Some(v) if !v.is_null() => lenient_number(Some(v)),
                _ => months.iter().sum(),
            };
            DreRow {
                category: row.category,
                account_type: row.account_type,
                months,
                total,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::is_balanced;
    use serde_json::json;

    fn request(confirmed: bool, bank: Option<AccountId>) -> MovementRequest {
        MovementRequest {
            description: "Comissão".into(),
            amount: 150.0,
            transaction_date: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            category_account_id: AccountId::new(),
            asset_account_id: AccountId::new(),
            bank_account_id: bank,
            reference_number: None,
            memo: Some("memo".into()),
            due_date: None,
            is_confirmed: confirmed,
        }
    }

    #[test]
    fn test_revenue_without_bank_is_balanced() {
        let req = request(false, None);
        let (asset, revenue) = (req.asset_account_id, req.category_account_id);
        let movement = revenue_movement(req);
        assert!(is_balanced(&movement.entries));
        assert_eq!(movement.entries[0].account_id, asset);
        assert_eq!(movement.entries[0].amount, 150.0);
        assert_eq!(movement.entries[1].account_id, revenue);
        assert_eq!(movement.entries[1].amount, -150.0);
        assert!(!movement.has_bank_counterpart());
    }

    #[test]
    fn test_confirmed_bank_movement_omits_counterpart() {
        let movement = expense_movement(request(true, Some(AccountId::new())));
        assert_eq!(movement.entries.len(), 1);
        assert_eq!(movement.entries[0].amount, 150.0);
        assert!(movement.has_bank_counterpart());

        // a pending movement keeps the counterpart even with a bank
        let pending = expense_movement(request(false, Some(AccountId::new())));
        assert_eq!(pending.entries.len(), 2);
        assert!(is_balanced(&pending.entries));
    }

    #[test]
    fn test_summary_accepts_flat_and_nested_payloads() {
        let flat = summary_from_json(&json!({"totalIncome": "1200.50", "transactionCount": 3}))
            .unwrap();
        assert_eq!(flat.current.total_income, 1200.5);
        assert_eq!(flat.current.transaction_count, 3);
        assert!(flat.previous.is_none());

        let nested = summary_from_json(&json!({
            "current": {"totalIncome": 10, "netResult": 4},
            "previous": {"totalIncome": 8}
        }))
        .unwrap();
        assert_eq!(nested.current.net_result, 4.0);
        assert_eq!(nested.previous.unwrap().total_income, 8.0);

        assert!(summary_from_json(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_dre_rows() {
        let rows = dre_rows_from_json(&json!([
            {"category": "Receita de Comissões", "account_type": "revenue", "jan": 100, "mar": "50.5", "total": 150.5},
            {"category": "Marketing", "account_type": "expense", "fev": 20}
        ]))
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].months[2], 50.5);
        assert_eq!(rows[0].total, 150.5);
        assert_eq!(rows[1].months[1], 20.0);
        assert_eq!(rows[1].total, 20.0);
        assert_eq!(rows[1].account_type, AccountType::Expense);
    }
}
