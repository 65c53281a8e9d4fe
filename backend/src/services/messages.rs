//! User-facing pt-BR messages for backend and auth errors.

use crate::db::repository::RepositoryError;

/// Backend error codes and their friendly text. Order matters when matching
/// fragments inside a free-form message.
pub const ERROR_MESSAGES: &[(&str, &str)] = &[
    ("23505", "Este registro já está cadastrado no sistema"),
    ("23502", "Falta preencher um campo obrigatório"),
    (
        "23503",
        "Registro relacionado não existe (verifique seguradora, cliente ou ramo)",
    ),
    ("42P01", "Erro no banco de dados: tabela não encontrada"),
    ("42703", "Erro no banco de dados: coluna não encontrada"),
    (
        "PGRST202",
        "Falta vincular a seguradora. Por favor, selecione uma seguradora válida",
    ),
    ("PGRST204", "Nenhum dado encontrado"),
    ("PGRST116", "Acesso negado ou credenciais inválidas"),
    ("INVALID_CPF", "CPF inválido. Verifique os 11 dígitos"),
    ("INVALID_CNPJ", "CNPJ inválido. Verifique os 14 dígitos"),
    ("MISSING_COMPANY", "Seguradora não foi selecionada"),
    ("MISSING_RAMO", "Ramo do seguro não foi identificado"),
    ("MISSING_CLIENT", "Cliente não foi identificado. Verifique CPF/nome"),
    ("MISSING_POLICY_NUMBER", "Número da apólice está vazio"),
    ("MISSING_PREMIUM", "Valor do prêmio não foi extraído"),
    ("INVALID_DATES", "Datas de vigência inválidas ou ausentes"),
    ("NETWORK_ERROR", "Erro de conexão. Verifique sua internet"),
    ("TIMEOUT", "Operação demorou muito. Tente novamente"),
    ("ECONNABORTED", "Conexão interrompida"),
];

pub const UNKNOWN_ERROR: &str = "Erro desconhecido";
pub const GENERIC_ERROR: &str = "Erro ao processar. Tente novamente";

/// Exact lookup by code.
pub fn message_for_code(code: &str) -> Option<&'static str> {
    ERROR_MESSAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, m)| *m)
}

/// First known code mentioned inside `text`.
pub fn message_in_text(text: &str) -> Option<&'static str> {
    ERROR_MESSAGES
        .iter()
        .find(|(c, _)| text.contains(c))
        .map(|(_, m)| *m)
}

/// Friendly text for a free-form error string; unknown text is returned as is.
pub fn friendly_text(text: &str) -> String {
    if text.trim().is_empty() {
        return UNKNOWN_ERROR.to_string();
    }
    message_in_text(text)
        .map(str::to_string)
        .unwrap_or_else(|| text.to_string())
}

/// Friendly text for a repository error: by code, then by a code mentioned in
/// the message, then the message itself.
pub fn friendly_message(error: &RepositoryError) -> String {
    if let Some(message) = error.code().and_then(message_for_code) {
        return message.to_string();
    }
    let text = error.message();
    if text.trim().is_empty() {
        return GENERIC_ERROR.to_string();
    }
    friendly_text(text)
}

const AUTH_MESSAGES: &[(&str, &str)] = &[
    ("Invalid login credentials", "Email ou senha incorretos"),
    (
        "Email not confirmed",
        "Por favor, confirme seu email antes de fazer login",
    ),
    ("User already registered", "Este email já está cadastrado"),
    (
        "Password should be at least 6 characters",
        "A senha deve ter pelo menos 6 caracteres",
    ),
    ("Invalid email", "Email inválido"),
    (
        "Too many requests",
        "Muitas tentativas. Tente novamente em alguns minutos",
    ),
];

pub const AUTH_FALLBACK: &str = "Erro no sistema. Tente novamente.";

/// Friendly text for an auth provider message. Matching is exact.
pub fn auth_message(provider_message: &str) -> &'static str {
    AUTH_MESSAGES
        .iter()
        .find(|(raw, _)| *raw == provider_message)
        .map(|(_, m)| *m)
        .unwrap_or(AUTH_FALLBACK)
}

/// Import checklist for a policy extracted from a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportCandidate<'a> {
    pub client_name: Option<&'a str>,
    pub policy_number: Option<&'a str>,
    pub company_linked: bool,
    pub ramo_linked: bool,
    pub has_dates: bool,
    pub net_premium: Option<f64>,
}

/// Problems that block importing `item`, in display order.
pub fn import_problems(item: &ImportCandidate<'_>) -> Vec<&'static str> {
    let mut problems = Vec::new();
    if item
        .client_name
        .is_none_or(|n| n.trim().is_empty() || n == "Cliente Não Identificado")
    {
        problems.push("Nome do cliente não identificado");
    }
    if item.policy_number.is_none_or(|n| n.trim().is_empty()) {
        problems.push("Número da apólice está vazio");
    }
    if !item.company_linked {
        problems.push("Seguradora não vinculada");
    }
    if !item.ramo_linked {
        problems.push("Ramo não vinculado");
    }
    if !item.has_dates {
        problems.push("Faltam datas de vigência");
    }
    if item.net_premium.is_none_or(|p| p.is_nan() || p <= 0.0) {
        problems.push("Prêmio líquido inválido");
    }
    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::ErrorContext;

    #[test]
    fn test_code_lookup_prefers_context_code() {
        let err = RepositoryError::validation_with_context(
            "duplicate key value violates unique constraint",
            ErrorContext::default().with_code("23505"),
        );
        assert_eq!(friendly_message(&err), "Este registro já está cadastrado no sistema");
    }

    #[test]
    fn test_code_found_in_message() {
        let err = RepositoryError::query("PGRST116: JSON object requested, multiple rows");
        assert_eq!(friendly_message(&err), "Acesso negado ou credenciais inválidas");
        assert_eq!(friendly_text("plain failure"), "plain failure");
        assert_eq!(friendly_text(""), UNKNOWN_ERROR);
    }

    #[test]
    fn test_timeout_errors_are_localized() {
        let err = RepositoryError::timeout("request timed out");
        assert_eq!(friendly_message(&err), "Operação demorou muito. Tente novamente");
    }

    #[test]
    fn test_auth_messages() {
        assert_eq!(auth_message("Invalid login credentials"), "Email ou senha incorretos");
        assert_eq!(auth_message("boom"), AUTH_FALLBACK);
    }

    #[test]
    fn test_import_problems() {
        let ok = ImportCandidate {
            client_name: Some("Ana"),
            policy_number: Some("123"),
            company_linked: true,
            ramo_linked: true,
            has_dates: true,
            net_premium: Some(10.0),
        };
        assert!(import_problems(&ok).is_empty());
        let bad = ImportCandidate {
            client_name: Some("Cliente Não Identificado"),
            ..ImportCandidate::default()
        };
        assert_eq!(import_problems(&bad).len(), 6);
    }
}
