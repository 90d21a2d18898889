//! Monetary amount parsing and formatting (BRL, two fraction digits)

use crate::ValidationError;

/// Check that an amount is usable in a payload.
///
/// True iff the amount is finite, positive, and its shortest base-10
/// rendering has at most two fraction digits.
pub fn validate_amount(amount: f64) -> bool {
    if !amount.is_finite() || amount <= 0.0 {
        return false;
    }

    match amount.to_string().split_once('.') {
        Some((_, frac)) => frac.len() <= 2,
        None => true,
    }
}

/// Parse a user-typed amount such as `"10.50"` or `"10,50"`.
pub fn parse_amount(raw: &str) -> Result<f64, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyAmount);
    }

    // Decimal comma is what most Brazilian users type
    let normalized = trimmed.replacen(',', ".", 1);

    let (whole, frac) = match normalized.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (normalized.as_str(), ""),
    };

    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(whole) || !all_digits(frac) || (whole.is_empty() && frac.is_empty()) {
        return Err(ValidationError::InvalidAmount(trimmed.to_string()));
    }

    if frac.len() > 2 {
        return Err(ValidationError::TooManyDecimalPlaces(trimmed.to_string()));
    }

    let amount: f64 = normalized
        .parse()
        .map_err(|_| ValidationError::InvalidAmount(trimmed.to_string()))?;

    if !validate_amount(amount) {
        return Err(ValidationError::InvalidAmount(trimmed.to_string()));
    }

    Ok(amount)
}

/// Render an amount the way tag 54 carries it: exactly two fraction digits.
pub fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}

/// Render an amount for display, e.g. `10.5` becomes `"R$ 10,50"`.
pub fn format_brl(amount: f64) -> String {
    if !amount.is_finite() || amount < 0.0 {
        return "R$ —".to_string();
    }
    format!("R$ {}", format_amount(amount).replace('.', ","))
}
