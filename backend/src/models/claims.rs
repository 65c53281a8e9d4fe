//! Insurance claims (sinistros) and their activity timeline.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::portfolio::{ClientId, PolicyId};
use crate::define_id_type;

define_id_type!(ClaimId);
define_id_type!(ClaimActivityId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ClaimStatus {
    #[default]
    #[serde(rename = "Aberto")]
    Open,
    #[serde(rename = "Em Análise")]
    InAnalysis,
    #[serde(rename = "Documentação Pendente")]
    PendingDocuments,
    #[serde(rename = "Aprovado")]
    Approved,
    #[serde(rename = "Negado")]
    Denied,
    #[serde(rename = "Cancelado")]
    Cancelled,
    #[serde(rename = "Finalizado")]
    Closed,
}

impl ClaimStatus {
    pub const ALL: [ClaimStatus; 7] = [
        Self::Open,
        Self::InAnalysis,
        Self::PendingDocuments,
        Self::Approved,
        Self::Denied,
        Self::Cancelled,
        Self::Closed,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Open => "Aberto",
            Self::InAnalysis => "Em Análise",
            Self::PendingDocuments => "Documentação Pendente",
            Self::Approved => "Aprovado",
            Self::Denied => "Negado",
            Self::Cancelled => "Cancelado",
            Self::Closed => "Finalizado",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }

    /// Terminal statuses accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Closed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "Baixa")]
    Low,
    #[serde(rename = "Média")]
    Medium,
    #[serde(rename = "Alta")]
    High,
    #[serde(rename = "Urgente")]
    Urgent,
}

impl Priority {
    pub fn is_high(&self) -> bool {
        matches!(self, Self::High | Self::Urgent)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub id: ClaimId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<PolicyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_number: Option<String>,
    pub occurrence_date: NaiveDate,
    pub report_date: NaiveDate,
    pub claim_type: String,
    pub status: ClaimStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deductible_amount: Option<f64>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_occurrence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub police_report_number: Option<String>,
    /// Denormalized for listing and search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimInput {
    #[serde(default)]
    pub policy_id: Option<PolicyId>,
    #[serde(default)]
    pub client_id: Option<ClientId>,
    #[serde(default)]
    pub claim_number: Option<String>,
    pub occurrence_date: NaiveDate,
    #[serde(default)]
    pub report_date: Option<NaiveDate>,
    pub claim_type: String,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub claim_amount: Option<f64>,
    #[serde(default)]
    pub deductible_amount: Option<f64>,
    pub description: String,
    #[serde(default)]
    pub location_occurrence: Option<String>,
    #[serde(default)]
    pub police_report_number: Option<String>,
}

impl ClaimInput {
    /// New claims always start `Aberto`; report date defaults to `today`.
    pub fn into_claim(self, today: NaiveDate) -> Claim {
        let now = Utc::now();
        Claim {
            id: ClaimId::new(),
            policy_id: self.policy_id,
            client_id: self.client_id,
            claim_number: self.claim_number,
            occurrence_date: self.occurrence_date,
            report_date: self.report_date.unwrap_or(today),
            claim_type: self.claim_type,
            status: ClaimStatus::Open,
            priority: self.priority,
            claim_amount: self.claim_amount,
            approved_amount: None,
            deductible_amount: self.deductible_amount,
            description: self.description,
            location_occurrence: self.location_occurrence,
            police_report_number: self.police_report_number,
            policy_number: None,
            client_name: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ClaimStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deductible_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ClaimUpdate {
    pub fn apply_to(&self, claim: &mut Claim) {
        if let Some(status) = self.status {
            claim.status = status;
        }
        if let Some(priority) = self.priority {
            claim.priority = Some(priority);
        }
        if let Some(v) = self.claim_amount {
            claim.claim_amount = Some(v);
        }
        if let Some(v) = self.approved_amount {
            claim.approved_amount = Some(v);
        }
        if let Some(v) = self.deductible_amount {
            claim.deductible_amount = Some(v);
        }
        if let Some(ref d) = self.description {
            claim.description = d.clone();
        }
        claim.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityType {
    #[serde(rename = "Criação")]
    Created,
    #[serde(rename = "Comentário")]
    Comment,
    #[serde(rename = "Mudança de Status")]
    StatusChange,
    #[serde(rename = "Anexo Adicionado")]
    AttachmentAdded,
    #[serde(rename = "Atribuição")]
    Assignment,
    #[serde(rename = "Aprovação")]
    Approval,
    #[serde(rename = "Negativa")]
    Denial,
    #[serde(rename = "Pagamento")]
    Payment,
    #[serde(rename = "Atualização")]
    Update,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimActivity {
    pub id: ClaimActivityId,
    pub claim_id: ClaimId,
    pub activity_type: ActivityType,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_status: Option<ClaimStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_status: Option<ClaimStatus>,
    pub created_at: DateTime<Utc>,
}

impl ClaimActivity {
    pub fn new(claim_id: ClaimId, activity_type: ActivityType, description: impl Into<String>) -> Self {
        Self {
            id: ClaimActivityId::new(),
            claim_id,
            activity_type,
            description: description.into(),
            old_status: None,
            new_status: None,
            created_at: Utc::now(),
        }
    }

    pub fn status_change(claim_id: ClaimId, old: ClaimStatus, new: ClaimStatus) -> Self {
        Self {
            old_status: Some(old),
            new_status: Some(new),
            ..Self::new(
                claim_id,
                ActivityType::StatusChange,
                format!("Status alterado de {} para {}", old.label(), new.label()),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels_round_trip() {
        for status in ClaimStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.label()));
            assert_eq!(ClaimStatus::from_label(status.label()), Some(status));
        }
    }

    #[test]
    fn test_status_change_activity_description() {
        let activity =
            ClaimActivity::status_change(ClaimId::new(), ClaimStatus::Open, ClaimStatus::Approved);
        assert_eq!(activity.description, "Status alterado de Aberto para Aprovado");
        assert_eq!(activity.activity_type, ActivityType::StatusChange);
    }
}
