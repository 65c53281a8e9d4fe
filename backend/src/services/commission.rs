//! Commission rates by line of business (ramo).
//!
//! The table holds market-average rates. Lookup is tolerant of case and
//! accents: exact name first, then partial containment, then a keyword list.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::Policy;

/// Rate applied when no ramo matches.
pub const DEFAULT_COMMISSION_RATE: f64 = 10.0;

/// Minimum number of active policies before a portfolio average is trusted.
pub const MIN_SAMPLE_SIZE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CommissionRate {
    pub ramo: &'static str,
    /// Percent, e.g. 15.0 = 15%.
    pub rate: f64,
    pub description: &'static str,
}

const fn rate(ramo: &'static str, rate: f64, description: &'static str) -> CommissionRate {
    CommissionRate {
        ramo,
        rate,
        description,
    }
}

pub const COMMISSION_RATES: &[CommissionRate] = &[
    rate("Auto", 15.0, "Seguros de automóvel"),
    rate("Vida", 12.0, "Seguros de vida"),
    rate("Saúde", 11.0, "Planos de saúde"),
    rate("Residencial", 18.0, "Seguros residenciais"),
    rate("Empresarial", 20.0, "Seguros empresariais"),
    rate("Viagem", 25.0, "Seguros viagem"),
    rate("Equipamentos", 22.0, "Seguros de equipamentos"),
    rate("Responsabilidade Civil", 16.0, "RC Profissional"),
    rate("Acidentes Pessoais", 14.0, "Seguros de acidentes pessoais"),
    rate("Previdência", 8.0, "Previdência privada"),
    rate("Rural", 17.0, "Seguros rurais"),
    rate("Transportes", 19.0, "Seguros de transporte de cargas"),
    rate("Marítimo", 21.0, "Seguros marítimos"),
    rate("Aeronáutico", 23.0, "Seguros aeronáuticos"),
    rate("Fiança", 13.0, "Seguros fiança"),
    rate("Garantia", 15.0, "Seguros garantia"),
    rate("D&O", 24.0, "Directors & Officers"),
    rate("Cyber", 26.0, "Seguros de cyber riscos"),
];

const KEYWORDS: &[(&str, f64)] = &[
    ("automovel", 15.0),
    ("auto", 15.0),
    ("carro", 15.0),
    ("veiculo", 15.0),
    ("saude", 11.0),
    ("plano", 11.0),
    ("medico", 11.0),
    ("odonto", 11.0),
    ("casa", 18.0),
    ("residencia", 18.0),
    ("lar", 18.0),
    ("empresa", 20.0),
    ("comercial", 20.0),
    ("negocios", 20.0),
    ("viagem", 25.0),
    ("internacional", 25.0),
    ("equipamento", 22.0),
    ("maquina", 22.0),
    ("celular", 22.0),
    ("notebook", 22.0),
    ("vida", 12.0),
    ("morte", 12.0),
    ("funeral", 12.0),
    ("previdencia", 8.0),
    ("aposentadoria", 8.0),
    ("pensao", 8.0),
];

/// Lower-case and strip Portuguese diacritics.
pub fn fold(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

/// Default commission rate (percent) for a ramo.
pub fn rate_for_ramo(ramo: &str) -> f64 {
    let ramo = ramo.trim();
    if ramo.is_empty() {
        return DEFAULT_COMMISSION_RATE;
    }

    let lower = ramo.to_lowercase();
    if let Some(exact) = COMMISSION_RATES.iter().find(|r| r.ramo.to_lowercase() == lower) {
        return exact.rate;
    }

    let folded = fold(ramo);
    if let Some(partial) = COMMISSION_RATES.iter().find(|r| {
        let name = fold(r.ramo);
        name.contains(&folded) || folded.contains(&name)
    }) {
        return partial.rate;
    }

    KEYWORDS
        .iter()
        .find(|(key, _)| folded.contains(key))
        .map(|(_, rate)| *rate)
        .unwrap_or(DEFAULT_COMMISSION_RATE)
}

/// Commission in reais for a premium; zero for non-positive premiums.
pub fn commission_value(premium: f64, ramo: &str) -> f64 {
    if !premium.is_finite() || premium <= 0.0 {
        return 0.0;
    }
    premium * rate_for_ramo(ramo) / 100.0
}

/// Premium-weighted average of the table rates over `(premium, ramo)` pairs.
pub fn average_commission_rate<'a, I>(items: I) -> f64
where
    I: IntoIterator<Item = (f64, &'a str)>,
{
    let (premium, commission) = items
        .into_iter()
        .filter(|(premium, _)| *premium > 0.0)
        .fold((0.0, 0.0), |(p, c), (premium, ramo)| {
            (p + premium, c + commission_value(premium, ramo))
        });
    if premium == 0.0 {
        DEFAULT_COMMISSION_RATE
    } else {
        commission / premium * 100.0
    }
}

/// Rate actually practiced by the brokerage for one ramo.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioRate {
    pub ramo: String,
    pub average_rate: f64,
    pub sample_size: usize,
    pub total_premium: f64,
    pub total_commission: f64,
}

/// Premium-weighted commission rates per ramo over active policies with a
/// positive premium and rate. Ramos with fewer than `min_sample` policies are
/// left out.
pub fn portfolio_rates(policies: &[Policy], min_sample: usize) -> Vec<PortfolioRate> {
    let mut by_ramo: BTreeMap<String, (f64, f64, usize)> = BTreeMap::new();
    for policy in policies.iter().filter(|p| {
        p.is_active() && p.premium_value > 0.0 && p.commission_rate > 0.0
    }) {
        let Some(ramo) = policy.ramo.as_deref().map(str::trim).filter(|r| !r.is_empty()) else {
            continue;
        };
        let entry = by_ramo.entry(ramo.to_string()).or_default();
        entry.0 += policy.premium_value;
        entry.1 += policy.estimated_commission();
        entry.2 += 1;
    }

    by_ramo
        .into_iter()
        .filter(|(_, (premium, _, count))| *count >= min_sample && *premium > 0.0)
        .map(|(ramo, (premium, commission, count))| PortfolioRate {
            ramo,
            average_rate: commission / premium * 100.0,
            sample_size: count,
            total_premium: premium,
            total_commission: commission,
        })
        .collect()
}

/// Portfolio rate for `ramo` when the sample is large enough, else the table
/// rate.
pub fn effective_rate(ramo: &str, portfolio: &[PortfolioRate]) -> f64 {
    portfolio
        .iter()
        .find(|r| r.ramo.eq_ignore_ascii_case(ramo.trim()))
        .map(|r| r.average_rate)
        .unwrap_or_else(|| rate_for_ramo(ramo))
}
