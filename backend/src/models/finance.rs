//! Legacy financial module records: transaction types, transactions and
//! recurring revenue/expense configurations.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::portfolio::{ClientId, CompanyId, PolicyId, ProducerId};
use super::AccountId;
use crate::define_id_type;

define_id_type!(TransactionId);
define_id_type!(TransactionTypeId);
define_id_type!(RecurringConfigId);

/// Nature of a transaction type or transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionNature {
    Receita,
    Despesa,
    Ganho,
    Perda,
}

impl TransactionNature {
    /// `GANHO` and `RECEITA` count as income.
    pub fn is_income(&self) -> bool {
        matches!(self, Self::Ganho | Self::Receita)
    }
}

/// Settlement status of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Previsto,
    Realizado,
    Pendente,
    Pago,
    ParcialmentePago,
    Atrasado,
    Cancelado,
}

impl TransactionStatus {
    pub fn is_realized(&self) -> bool {
        matches!(self, Self::Realizado | Self::Pago)
    }

    pub fn is_forecast(&self) -> bool {
        matches!(self, Self::Previsto | Self::Pendente | Self::ParcialmentePago)
    }
}

/// User-defined transaction category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionType {
    pub id: TransactionTypeId,
    pub name: String,
    pub nature: TransactionNature,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_id: Option<TransactionTypeId>,
    pub description: String,
    pub amount: f64,
    pub status: TransactionStatus,
    pub nature: TransactionNature,
    /// Competence date.
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<PolicyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<CompanyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub producer_id: Option<ProducerId>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_realized(&self) -> bool {
        self.status.is_realized()
    }

    pub fn is_forecast(&self) -> bool {
        self.status.is_forecast()
    }

    pub fn is_income(&self) -> bool {
        self.nature.is_income()
    }
}

/// Fields accepted when creating a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionInput {
    #[serde(default)]
    pub type_id: Option<TransactionTypeId>,
    pub description: String,
    pub amount: f64,
    pub status: TransactionStatus,
    pub nature: TransactionNature,
    pub date: NaiveDate,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub client_id: Option<ClientId>,
    #[serde(default)]
    pub policy_id: Option<PolicyId>,
    #[serde(default)]
    pub company_id: Option<CompanyId>,
    #[serde(default)]
    pub producer_id: Option<ProducerId>,
}

impl TransactionInput {
    pub fn into_transaction(self) -> Transaction {
        Transaction {
            id: TransactionId::new(),
            type_id: self.type_id,
            description: self.description,
            amount: self.amount,
            status: self.status,
            nature: self.nature,
            date: self.date,
            due_date: self.due_date,
            client_id: self.client_id,
            policy_id: self.policy_id,
            company_id: self.company_id,
            producer_id: self.producer_id,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurringNature {
    Revenue,
    Expense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    Monthly,
    Yearly,
}

/// A recurring revenue or expense template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringConfig {
    pub id: RecurringConfigId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub nature: RecurringNature,
    pub amount: f64,
    pub frequency: Frequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u32>,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_generated_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<AccountId>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringConfigInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub nature: RecurringNature,
    pub amount: f64,
    pub frequency: Frequency,
    #[serde(default)]
    pub day_of_month: Option<u32>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub account_id: Option<AccountId>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl RecurringConfigInput {
    pub fn into_config(self) -> RecurringConfig {
        RecurringConfig {
            id: RecurringConfigId::new(),
            name: self.name,
            description: self.description,
            nature: self.nature,
            amount: self.amount,
            frequency: self.frequency,
            day_of_month: self.day_of_month,
            start_date: self.start_date,
            end_date: self.end_date,
            last_generated_date: None,
            account_id: self.account_id,
            is_active: self.is_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_predicates_partition_open_and_closed() {
        use TransactionStatus::*;
        for s in [Realizado, Pago] {
            assert!(s.is_realized() && !s.is_forecast());
        }
        for s in [Previsto, Pendente, ParcialmentePago] {
            assert!(s.is_forecast() && !s.is_realized());
        }
        for s in [Atrasado, Cancelado] {
            assert!(!s.is_forecast() && !s.is_realized());
        }
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&TransactionStatus::ParcialmentePago).unwrap(),
            "\"PARCIALMENTE_PAGO\""
        );
        assert_eq!(
            serde_json::to_string(&TransactionNature::Receita).unwrap(),
            "\"RECEITA\""
        );
        assert!(TransactionNature::Ganho.is_income());
        assert!(!TransactionNature::Perda.is_income());
    }
}
