//! Brazilian real formatting and parsing.
//!
//! Output follows the pt-BR locale: `R$`, a non-breaking space, `.` as the
//! thousands separator and `,` before the two decimal places.

/// Non-breaking space placed between the symbol and the amount.
pub const NBSP: char = '\u{a0}';

/// Round to cents, half away from zero.
pub fn round_cents(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let (integer, fraction) = rounded_digits(value.abs(), 2);
    let magnitude: f64 = format!("{}.{}", integer, fraction).parse().unwrap_or(0.0);
    if value < 0.0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Integer and fraction digits of `magnitude` rounded half away from zero to
/// `decimals` places.
///
/// Rounds the shortest decimal representation of the float rather than
/// `magnitude * 10^decimals`, so `1.005` gives `1.01` even though the nearest
/// binary value sits just below the half.
fn rounded_digits(magnitude: f64, decimals: usize) -> (String, String) {
    let repr = magnitude.to_string();
    let (integer, fraction) = repr.split_once('.').unwrap_or((repr.as_str(), ""));
    let mut digits: Vec<u8> = integer
        .bytes()
        .chain(fraction.bytes().chain(std::iter::repeat(b'0')).take(decimals))
        .collect();

    if fraction.as_bytes().get(decimals).is_some_and(|d| *d >= b'5') {
        let mut i = digits.len();
        loop {
            if i == 0 {
                digits.insert(0, b'1');
                break;
            }
            i -= 1;
            if digits[i] == b'9' {
                digits[i] = b'0';
            } else {
                digits[i] += 1;
                break;
            }
        }
    }

    let split = digits.len() - decimals;
    let text = |range: &[u8]| range.iter().map(|&d| char::from(d)).collect::<String>();
    (text(&digits[..split]), text(&digits[split..]))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// Format `value` as a pt-BR number with `decimals` places, without symbol.
pub fn format_number(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let (integer, fraction) = rounded_digits(value.abs(), decimals);
    let negative = value < 0.0 && integer.bytes().chain(fraction.bytes()).any(|d| d != b'0');

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&group_thousands(&integer));
    if decimals > 0 {
        out.push(',');
        out.push_str(&fraction);
    }
    out
}

/// Format an amount in reais, e.g. `R$ 1.234,56`.
///
/// Negative amounts carry a leading `-` before the symbol.
pub fn format_brl(value: f64) -> String {
    let number = format_number(value, 2);
    match number.strip_prefix('-') {
        Some(rest) => format!("-R${}{}", NBSP, rest),
        None => format!("R${}{}", NBSP, number),
    }
}

/// Format a percentage with one decimal place, e.g. `12,5%`.
pub fn format_percent(value: f64) -> String {
    format!("{}%", format_number(value, 1))
}

/// Parse an amount typed by a user.
///
/// Accepts `R$ 1.234,56`, `1234,56` and `1234.56`. When both separators are
/// present the last one is the decimal separator. A lone `.` followed by
/// exactly three digits is read as a thousands separator (`1.234`).
pub fn parse_brl(input: &str) -> Option<f64> {
    let cleaned: String = input
        .trim()
        .trim_start_matches("R$")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != NBSP)
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let (negative, body) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start_matches("R$")),
        None => (false, cleaned.as_str()),
    };
    if body.is_empty() || !body.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') {
        return None;
    }

    let normalized = match (body.rfind(','), body.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => body.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => body.replace(',', ""),
        (Some(_), None) => {
            if body.matches(',').count() > 1 {
                return None;
            }
            body.replace(',', ".")
        }
        (None, Some(dot)) => {
            let dots = body.matches('.').count();
            let tail = body.len() - dot - 1;
            if dots > 1 || tail == 3 {
                body.replace('.', "")
            } else {
                body.to_string()
            }
        }
        (None, None) => body.to_string(),
    };

    let value: f64 = normalized.parse().ok()?;
    Some(if negative { -value } else { value })
}
