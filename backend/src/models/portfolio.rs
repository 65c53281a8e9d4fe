//! Clients, policies and the reference data attached to them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::define_id_type;

define_id_type!(UserId);
define_id_type!(ClientId);
define_id_type!(PolicyId);
define_id_type!(CompanyId);
define_id_type!(ProducerId);

/// Client lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ClientStatus {
    #[default]
    #[serde(rename = "Ativo")]
    Active,
    #[serde(rename = "Inativo")]
    Inactive,
}

/// A brokerage client (person or company).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpf_cnpj: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: ClientStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cep: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observations: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields accepted when creating or editing a client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientInput {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub cpf_cnpj: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: ClientStatus,
    #[serde(default)]
    pub cep: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub observations: Option<String>,
}

impl ClientInput {
    /// Materialize a new client record from the input.
    pub fn into_client(self) -> Client {
        Client {
            id: ClientId::new(),
            name: self.name,
            phone: self.phone,
            email: self.email,
            cpf_cnpj: self.cpf_cnpj,
            birth_date: self.birth_date,
            status: self.status,
            cep: self.cep,
            city: self.city,
            state: self.state,
            observations: self.observations,
            created_at: Utc::now(),
        }
    }
}

/// Policy status as stored by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyStatus {
    #[serde(rename = "Orçamento")]
    Quote,
    #[serde(rename = "Aguardando Apólice")]
    AwaitingPolicy,
    #[serde(rename = "Ativa")]
    Active,
    #[serde(rename = "Cancelada")]
    Cancelled,
    #[serde(rename = "Renovada")]
    Renewed,
}

impl PolicyStatus {
    /// Backend label for the status.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Quote => "Orçamento",
            Self::AwaitingPolicy => "Aguardando Apólice",
            Self::Active => "Ativa",
            Self::Cancelled => "Cancelada",
            Self::Renewed => "Renovada",
        }
    }

    /// Parse a backend label.
    pub fn from_label(label: &str) -> Option<Self> {
        [
            Self::Quote,
            Self::AwaitingPolicy,
            Self::Active,
            Self::Cancelled,
            Self::Renewed,
        ]
        .into_iter()
        .find(|s| s.label() == label)
    }
}

/// Renewal follow-up status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenewalStatus {
    #[serde(rename = "Pendente")]
    Pending,
    #[serde(rename = "Em Contato")]
    InContact,
    #[serde(rename = "Proposta Enviada")]
    ProposalSent,
    #[serde(rename = "Renovada")]
    Renewed,
    #[serde(rename = "Não Renovada")]
    NotRenewed,
}

/// An insurance contract (apólice) or a quote that may become one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub id: PolicyId,
    pub client_id: ClientId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_number: Option<String>,
    /// Insurance company id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance_company: Option<CompanyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance_company_name: Option<String>,
    /// Line of business (ramo).
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub ramo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub producer_id: Option<ProducerId>,
    pub insured_asset: String,
    pub premium_value: f64,
    /// Commission rate in percent (15.0 = 15%).
    pub commission_rate: f64,
    pub status: PolicyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    pub expiration_date: NaiveDate,
    #[serde(default)]
    pub automatic_renewal: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renewal_status: Option<RenewalStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Policy {
    /// Commission expected from this policy's premium.
    pub fn estimated_commission(&self) -> f64 {
        self.premium_value * self.commission_rate / 100.0
    }

    pub fn is_active(&self) -> bool {
        self.status == PolicyStatus::Active
    }
}

/// Writable columns of a policy row. The joined insurer name and the
/// backend-owned `id`/`created_at` are left out of updates.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyUpdate<'a> {
    pub client_id: ClientId,
    pub policy_number: Option<&'a str>,
    pub insurance_company: Option<CompanyId>,
    #[serde(rename = "type")]
    pub ramo: Option<&'a str>,
    pub producer_id: Option<ProducerId>,
    pub insured_asset: &'a str,
    pub premium_value: f64,
    pub commission_rate: f64,
    pub status: PolicyStatus,
    pub start_date: Option<NaiveDate>,
    pub expiration_date: NaiveDate,
    pub automatic_renewal: bool,
    pub renewal_status: Option<RenewalStatus>,
    pub pdf_url: Option<&'a str>,
}

impl<'a> From<&'a Policy> for PolicyUpdate<'a> {
    fn from(policy: &'a Policy) -> Self {
        Self {
            client_id: policy.client_id,
            policy_number: policy.policy_number.as_deref(),
            insurance_company: policy.insurance_company,
            ramo: policy.ramo.as_deref(),
            producer_id: policy.producer_id,
            insured_asset: &policy.insured_asset,
            premium_value: policy.premium_value,
            commission_rate: policy.commission_rate,
            status: policy.status,
            start_date: policy.start_date,
            expiration_date: policy.expiration_date,
            automatic_renewal: policy.automatic_renewal,
            renewal_status: policy.renewal_status,
            pdf_url: policy.pdf_url.as_deref(),
        }
    }
}

/// Fields accepted when creating or editing a policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyInput {
    pub client_id: ClientId,
    #[serde(default)]
    pub policy_number: Option<String>,
    #[serde(default)]
    pub insurance_company: Option<CompanyId>,
    #[serde(default, rename = "type")]
    pub ramo: Option<String>,
    #[serde(default)]
    pub producer_id: Option<ProducerId>,
    pub insured_asset: String,
    pub premium_value: f64,
    pub commission_rate: f64,
    pub status: PolicyStatus,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    pub expiration_date: NaiveDate,
    #[serde(default)]
    pub automatic_renewal: bool,
}

impl PolicyInput {
    /// Materialize a new policy record from the input.
    pub fn into_policy(self) -> Policy {
        Policy {
            id: PolicyId::new(),
            client_id: self.client_id,
            policy_number: self.policy_number,
            insurance_company: self.insurance_company,
            insurance_company_name: None,
            ramo: self.ramo,
            producer_id: self.producer_id,
            insured_asset: self.insured_asset,
            premium_value: self.premium_value,
            commission_rate: self.commission_rate,
            status: self.status,
            start_date: self.start_date,
            expiration_date: self.expiration_date,
            automatic_renewal: self.automatic_renewal,
            renewal_status: None,
            pdf_url: None,
            created_at: Utc::now(),
        }
    }
}

/// Insurance company (seguradora).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
}

/// Sales producer attached to a brokerage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Producer {
    pub id: ProducerId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}
