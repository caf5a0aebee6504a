//! ISO 4217 currency code table
//!
//! Redsys identifies currencies by their numeric code while merchant
//! configuration uses the alpha code. The table is fixed, process-wide
//! constant data.

use crate::payments::error::{PaymentError, PaymentResult};

pub const EUR_NUMERIC: u16 = 978;

const CURRENCIES: [(&str, u16); 5] = [
    ("EUR", 978),
    ("USD", 840),
    ("GBP", 426),
    ("JPY", 392),
    ("CNY", 156),
];

/// Numeric code for an alpha currency code, case-insensitive.
pub fn numeric_for(alpha: &str) -> PaymentResult<u16> {
    let wanted = alpha.trim().to_ascii_uppercase();
    CURRENCIES
        .iter()
        .find(|(code, _)| *code == wanted)
        .map(|(_, numeric)| *numeric)
        .ok_or_else(|| PaymentError::unknown_currency(alpha))
}

/// Alpha code for a numeric currency code, used to translate the code a
/// gateway notification carries back into merchant configuration terms.
pub fn alpha_for(numeric: u16) -> PaymentResult<&'static str> {
    CURRENCIES
        .iter()
        .find(|(_, code)| *code == numeric)
        .map(|(alpha, _)| *alpha)
        .ok_or_else(|| PaymentError::unknown_currency(numeric.to_string()))
}

/// Resolves a currency given either as alpha ("EUR") or already numeric
/// ("978") into its numeric code.
pub fn resolve_numeric(currency: &str) -> PaymentResult<u16> {
    let trimmed = currency.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        let numeric: u16 = trimmed
            .parse()
            .map_err(|_| PaymentError::unknown_currency(currency))?;
        // Reject numeric codes outside the table
        alpha_for(numeric)?;
        Ok(numeric)
    } else {
        numeric_for(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_stability() {
        for (alpha, _) in CURRENCIES {
            let numeric = numeric_for(alpha).unwrap();
            let back = alpha_for(numeric).unwrap();
            assert_eq!(numeric_for(back).unwrap(), numeric);
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(numeric_for("eur").unwrap(), 978);
        assert_eq!(numeric_for(" Usd ").unwrap(), 840);
    }

    #[test]
    fn test_unknown_alpha_code() {
        let err = numeric_for("XYZ").unwrap_err();
        assert!(matches!(err, PaymentError::UnknownCurrency { .. }));
    }

    #[test]
    fn test_unknown_numeric_code() {
        assert!(alpha_for(999).is_err());
        assert!(resolve_numeric("999").is_err());
    }

    #[test]
    fn test_resolve_accepts_both_forms() {
        assert_eq!(resolve_numeric("EUR").unwrap(), 978);
        assert_eq!(resolve_numeric("978").unwrap(), 978);
    }
}
