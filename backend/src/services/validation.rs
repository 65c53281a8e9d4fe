//! Form validation run before records are sent to the backend.
//!
//! Every validator collects all field problems instead of stopping at the
//! first one, so a form can highlight them together.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use super::ledger::MovementRequest;
use crate::db::repository::{ErrorContext, RepositoryError};
use crate::models::{
    entries_total, AppointmentInput, ClaimInput, ClientInput, DealInput, MovementInput,
    PolicyInput, TransactionInput, BALANCE_TOLERANCE,
};

static EMAIL_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Field-level validation failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{}", self.summary())]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Record `message` for `field` when `failed` holds.
    pub fn check(&mut self, failed: bool, field: &str, message: &str) {
        if failed {
            self.add(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// First message recorded for `field`.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(FieldError::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<ValidationErrors> for RepositoryError {
    fn from(errors: ValidationErrors) -> Self {
        let first = errors
            .errors
            .first()
            .map(|e| e.message.clone())
            .unwrap_or_else(|| "Dados inválidos".to_string());
        let mut context = ErrorContext::default().with_details(errors.summary());
        context.fields = errors.errors;
        RepositoryError::validation_with_context(first, context)
    }
}

fn digits(value: &str) -> Vec<u32> {
    value.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn all_same(d: &[u32]) -> bool {
    d.windows(2).all(|w| w[0] == w[1])
}

/// CPF check digits (11 digits, punctuation ignored).
pub fn is_valid_cpf(value: &str) -> bool {
    let d = digits(value);
    if d.len() != 11 || all_same(&d) {
        return false;
    }
    let check = |len: usize| {
        let sum: u32 = d[..len]
            .iter()
            .enumerate()
            .map(|(i, n)| n * (len as u32 + 1 - i as u32))
            .sum();
        let rem = (sum * 10) % 11;
        if rem == 10 {
            0
        } else {
            rem
        }
    };
    check(9) == d[9] && check(10) == d[10]
}

/// CNPJ check digits (14 digits, punctuation ignored).
pub fn is_valid_cnpj(value: &str) -> bool {
    let d = digits(value);
    if d.len() != 14 || all_same(&d) {
        return false;
    }
    let check = |len: usize| {
        let mut weight = 2;
        let mut sum = 0;
        for n in d[..len].iter().rev() {
            sum += n * weight;
            weight = if weight == 9 { 2 } else { weight + 1 };
        }
        let rem = sum % 11;
        if rem < 2 {
            0
        } else {
            11 - rem
        }
    };
    check(12) == d[12] && check(13) == d[13]
}

pub fn is_valid_cpf_or_cnpj(value: &str) -> bool {
    match digits(value).len() {
        11 => is_valid_cpf(value),
        14 => is_valid_cnpj(value),
        _ => false,
    }
}

pub fn is_valid_email(value: &str) -> bool {
    match EMAIL_RE.as_ref() {
        Ok(re) => re.is_match(value.trim()),
        Err(_) => value.contains('@'),
    }
}

pub fn is_valid_phone(value: &str) -> bool {
    matches!(digits(value).len(), 10 | 11)
}

pub fn is_valid_cep(value: &str) -> bool {
    digits(value).len() == 8
}

fn filled(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn too_long(value: &Option<String>, max: usize) -> bool {
    value.as_deref().is_some_and(|v| v.chars().count() > max)
}

pub fn validate_client(input: &ClientInput, today: NaiveDate) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let name_len = input.name.chars().count();
    errors.check(name_len < 2, "name", "Nome deve ter pelo menos 2 caracteres");
    errors.check(name_len > 100, "name", "Nome deve ter no máximo 100 caracteres");
    errors.check(
        name_len > 0 && !input.name.chars().all(|c| c.is_alphabetic() || c.is_whitespace()),
        "name",
        "Nome deve conter apenas letras e espaços",
    );

    let email = filled(&input.email);
    let phone = filled(&input.phone);
    errors.check(
        email.is_none() && phone.is_none(),
        "email",
        "É obrigatório ter pelo menos email ou telefone",
    );
    errors.check(
        email.is_some_and(|e| !is_valid_email(e)),
        "email",
        "Email inválido",
    );
    errors.check(
        phone.is_some_and(|p| !is_valid_phone(p)),
        "phone",
        "Telefone deve ter 10 ou 11 dígitos",
    );
    errors.check(
        filled(&input.cpf_cnpj).is_some_and(|v| !is_valid_cpf_or_cnpj(v)),
        "cpf_cnpj",
        "CPF ou CNPJ inválido",
    );
    errors.check(
        filled(&input.cep).is_some_and(|v| !is_valid_cep(v)),
        "cep",
        "CEP deve ter 8 dígitos",
    );
    if let Some(birth) = input.birth_date {
        let floor = NaiveDate::from_ymd_opt(today.year() - 100, today.month(), today.day())
            .or_else(|| NaiveDate::from_ymd_opt(today.year() - 100, today.month(), 28))
            .unwrap_or(NaiveDate::MIN);
        errors.check(
            birth > today || birth < floor,
            "birth_date",
            "Data de nascimento inválida",
        );
    }
    errors.check(
        too_long(&input.city, 50),
        "city",
        "Cidade deve ter no máximo 50 caracteres",
    );
    errors.check(
        too_long(&input.state, 2),
        "state",
        "Estado deve ter no máximo 2 caracteres",
    );
    errors.check(
        too_long(&input.observations, 500),
        "observations",
        "Observações devem ter no máximo 500 caracteres",
    );
    errors.into_result()
}

pub fn validate_policy(input: &PolicyInput) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.check(
        !input.premium_value.is_finite() || input.premium_value < 0.0,
        "premium_value",
        "Prêmio deve ser um valor positivo",
    );
    errors.check(
        !(0.0..=100.0).contains(&input.commission_rate),
        "commission_rate",
        "Taxa de comissão deve estar entre 0 e 100",
    );
    errors.check(
        input
            .start_date
            .is_some_and(|start| input.expiration_date <= start),
        "expiration_date",
        "Data de vencimento deve ser posterior ao início da vigência",
    );
    errors.into_result()
}

pub fn validate_transaction(input: &TransactionInput) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.check(
        input.description.trim().is_empty(),
        "description",
        "Descrição é obrigatória",
    );
    errors.check(
        !input.amount.is_finite() || input.amount <= 0.0,
        "amount",
        "Valor deve ser maior que zero",
    );
    errors.into_result()
}

pub fn validate_movement_request(input: &MovementRequest) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.check(
        input.description.trim().is_empty(),
        "description",
        "Descrição é obrigatória",
    );
    errors.check(
        !input.amount.is_finite() || input.amount <= 0.0,
        "amount",
        "Valor deve ser maior que zero",
    );
    errors.into_result()
}

/// A movement paid through a bank carries only one side; the bank leg is
/// posted by the procedure. Anything else must balance on its own.
pub fn validate_movement(input: &MovementInput) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.check(
        input.description.trim().is_empty(),
        "description",
        "Descrição é obrigatória",
    );
    errors.check(
        input.entries.iter().any(|e| !e.amount.is_finite()),
        "entries",
        "Valores dos lançamentos inválidos",
    );
    if input.has_bank_counterpart() {
        errors.check(
            input.entries.is_empty() || entries_total(&input.entries).abs() <= BALANCE_TOLERANCE,
            "entries",
            "Informe ao menos um lançamento com valor",
        );
    } else {
        errors.check(
            input.entries.len() < 2,
            "entries",
            "São necessários ao menos dois lançamentos",
        );
        errors.check(
            input.entries.len() >= 2
                && entries_total(&input.entries).abs() > BALANCE_TOLERANCE,
            "entries",
            "Lançamentos desbalanceados: a soma deve ser zero",
        );
    }
    errors.into_result()
}

pub fn validate_claim(input: &ClaimInput, today: NaiveDate) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.check(
        input.description.trim().is_empty(),
        "description",
        "Descrição do sinistro é obrigatória",
    );
    errors.check(
        input.claim_type.trim().is_empty(),
        "claim_type",
        "Tipo do sinistro é obrigatório",
    );
    errors.check(
        input.occurrence_date > today,
        "occurrence_date",
        "Data da ocorrência não pode ser futura",
    );
    let negative = |v: Option<f64>| v.is_some_and(|v| !v.is_finite() || v < 0.0);
    errors.check(
        negative(input.claim_amount),
        "claim_amount",
        "Valor do sinistro não pode ser negativo",
    );
    errors.check(
        negative(input.deductible_amount),
        "deductible_amount",
        "Valor da franquia não pode ser negativo",
    );
    errors.into_result()
}

pub fn validate_appointment(input: &AppointmentInput) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.check(input.title.trim().is_empty(), "title", "Título é obrigatório");
    errors.into_result()
}

pub fn validate_deal(input: &DealInput) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.check(input.title.trim().is_empty(), "title", "Título é obrigatório");
    errors.check(
        !input.value.is_finite() || input.value < 0.0,
        "value",
        "Valor não pode ser negativo",
    );
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AccountId, ClientId, LedgerEntryInput, PolicyStatus, TransactionNature, TransactionStatus,
    };
    use proptest::prelude::*;

    fn client(name: &str, email: Option<&str>, phone: Option<&str>) -> ClientInput {
        ClientInput {
            name: name.into(),
            email: email.map(Into::into),
            phone: phone.map(Into::into),
            ..ClientInput::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_cpf_and_cnpj_check_digits() {
        assert!(is_valid_cpf("529.982.247-25"));
        assert!(!is_valid_cpf("529.982.247-24"));
        assert!(!is_valid_cpf("111.111.111-11"));
        assert!(is_valid_cnpj("11.222.333/0001-81"));
        assert!(!is_valid_cnpj("11.222.333/0001-80"));
        assert!(is_valid_cpf_or_cnpj("52998224725"));
        assert!(!is_valid_cpf_or_cnpj("123"));
    }

    #[test]
    fn test_client_needs_email_or_phone() {
        let errors = validate_client(&client("Maria", None, None), today()).unwrap_err();
        assert_eq!(
            errors.get("email"),
            Some("É obrigatório ter pelo menos email ou telefone")
        );
        assert!(validate_client(&client("Maria", None, Some("(11) 98765-4321")), today()).is_ok());
    }

    #[test]
    fn test_client_collects_every_error() {
        let mut input = client("J4", Some("no-at-sign"), Some("123"));
        input.cpf_cnpj = Some("000".into());
        input.cep = Some("1234".into());
        let errors = validate_client(&input, today()).unwrap_err();
        assert_eq!(errors.get("name"), Some("Nome deve conter apenas letras e espaços"));
        assert_eq!(errors.get("email"), Some("Email inválido"));
        assert_eq!(errors.get("phone"), Some("Telefone deve ter 10 ou 11 dígitos"));
        assert_eq!(errors.get("cpf_cnpj"), Some("CPF ou CNPJ inválido"));
        assert_eq!(errors.get("cep"), Some("CEP deve ter 8 dígitos"));
    }

    #[test]
    fn test_accented_names_are_letters() {
        assert!(validate_client(&client("José Antônio", Some("jose@x.com.br"), None), today()).is_ok());
    }

    #[test]
    fn test_movement_balance() {
        let a = AccountId::new();
        let b = AccountId::new();
        let mut movement = MovementInput {
            description: "Aluguel".into(),
            transaction_date: today(),
            reference_number: None,
            related_entity_type: None,
            related_entity_id: None,
            due_date: None,
            bank_account_id: None,
            is_confirmed: true,
            entries: vec![LedgerEntryInput::new(a, 100.0), LedgerEntryInput::new(b, -90.0)],
        };
        assert!(validate_movement(&movement).is_err());
        movement.entries[1].amount = -100.0;
        assert!(validate_movement(&movement).is_ok());

        movement.bank_account_id = Some(AccountId::new());
        movement.entries.truncate(1);
        assert!(validate_movement(&movement).is_ok());
    }

    #[test]
    fn test_validation_errors_convert_to_repository_error() {
        let errors = validate_appointment(&AppointmentInput {
            client_id: None,
            policy_id: None,
            title: " ".into(),
            date: today(),
            time: chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            status: Default::default(),
            priority: None,
            notes: None,
        })
        .unwrap_err();
        let err: RepositoryError = errors.into();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
        assert_eq!(err.message(), "Título é obrigatório");
    }

    fn policy(premium: f64, rate: f64) -> PolicyInput {
        PolicyInput {
            client_id: ClientId::new(),
            policy_number: None,
            insurance_company: None,
            ramo: Some("Auto".into()),
            producer_id: None,
            insured_asset: "HB20".into(),
            premium_value: premium,
            commission_rate: rate,
            status: PolicyStatus::Quote,
            start_date: Some(today()),
            expiration_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            automatic_renewal: false,
        }
    }

    fn transaction(amount: f64) -> TransactionInput {
        TransactionInput {
            type_id: None,
            description: "Comissão".into(),
            amount,
            status: TransactionStatus::Pendente,
            nature: TransactionNature::Receita,
            date: today(),
            due_date: None,
            client_id: None,
            policy_id: None,
            company_id: None,
            producer_id: None,
        }
    }

    fn claim(occurrence: NaiveDate, amount: Option<f64>) -> ClaimInput {
        ClaimInput {
            policy_id: None,
            client_id: None,
            claim_number: None,
            occurrence_date: occurrence,
            report_date: None,
            claim_type: "Colisão".into(),
            priority: None,
            claim_amount: amount,
            deductible_amount: None,
            description: "Batida na traseira".into(),
            location_occurrence: None,
            police_report_number: None,
        }
    }

    #[test]
    fn test_policy_numeric_rules() {
        assert!(validate_policy(&policy(1500.0, 15.0)).is_ok());
        assert!(validate_policy(&policy(0.0, 0.0)).is_ok());
        assert!(validate_policy(&policy(100.0, 100.0)).is_ok());

        let errors = validate_policy(&policy(-1.0, 100.5)).unwrap_err();
        assert_eq!(errors.get("premium_value"), Some("Prêmio deve ser um valor positivo"));
        assert_eq!(
            errors.get("commission_rate"),
            Some("Taxa de comissão deve estar entre 0 e 100")
        );

        for bad in [f64::NAN, f64::INFINITY] {
            let errors = validate_policy(&policy(bad, bad)).unwrap_err();
            assert_eq!(errors.len(), 2);
        }
        assert!(validate_policy(&policy(100.0, -0.5)).is_err());
    }

    #[test]
    fn test_policy_expiration_after_start() {
        let mut input = policy(100.0, 10.0);
        input.expiration_date = today();
        let errors = validate_policy(&input).unwrap_err();
        assert!(errors.get("expiration_date").is_some());

        input.start_date = None;
        assert!(validate_policy(&input).is_ok());
    }

    #[test]
    fn test_transaction_amount_must_be_positive_and_finite() {
        assert!(validate_transaction(&transaction(0.01)).is_ok());
        for bad in [0.0, -10.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let errors = validate_transaction(&transaction(bad)).unwrap_err();
            assert_eq!(errors.get("amount"), Some("Valor deve ser maior que zero"));
        }

        let mut blank = transaction(10.0);
        blank.description = "   ".into();
        assert_eq!(
            validate_transaction(&blank).unwrap_err().get("description"),
            Some("Descrição é obrigatória")
        );
    }

    #[test]
    fn test_claim_rejects_future_dates_and_negative_amounts() {
        assert!(validate_claim(&claim(today(), Some(5000.0)), today()).is_ok());
        assert!(validate_claim(&claim(today(), None), today()).is_ok());

        let tomorrow = today().succ_opt().unwrap();
        let errors = validate_claim(&claim(tomorrow, None), today()).unwrap_err();
        assert_eq!(
            errors.get("occurrence_date"),
            Some("Data da ocorrência não pode ser futura")
        );

        for bad in [-0.01, f64::NAN, f64::INFINITY] {
            let errors = validate_claim(&claim(today(), Some(bad)), today()).unwrap_err();
            assert!(errors.get("claim_amount").is_some());
        }

        let mut input = claim(today(), None);
        input.deductible_amount = Some(-100.0);
        input.claim_type = String::new();
        let errors = validate_claim(&input, today()).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.get("deductible_amount").is_some());
        assert!(errors.get("claim_type").is_some());
    }

    proptest! {
        #[test]
        fn prop_non_finite_amounts_are_rejected(
            bad in prop_oneof![Just(f64::NAN), Just(f64::INFINITY), Just(f64::NEG_INFINITY)],
        ) {
            prop_assert!(validate_transaction(&transaction(bad)).is_err());
            prop_assert!(validate_policy(&policy(bad, 10.0)).is_err());
            prop_assert!(validate_claim(&claim(today(), Some(bad)), today()).is_err());
        }

        #[test]
        fn prop_positive_amounts_pass(amount in 0.01f64..1.0e9) {
            prop_assert!(validate_transaction(&transaction(amount)).is_ok());
        }
    }
}
