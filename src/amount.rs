//! Amount parsing, bounds checking and display formatting.
//!
//! Amounts are entered and displayed in major units (rupees). The Khalti
//! widget takes minor units (paisa); [`to_minor_units`] is the only place
//! that conversion happens.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Accepted amount range for a single input field.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AmountBounds {
    pub min: f64,
    pub max: f64,
    /// Prefix used in validation messages, e.g. `"Rs."`.
    pub currency_label: String,
}

impl Default for AmountBounds {
    fn default() -> Self {
        Self {
            min: 10.0,
            max: 100_000.0,
            currency_label: "Rs.".to_string(),
        }
    }
}

/// Why an amount string was refused. `Display` is the user-facing message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidAmount {
    #[error("Please enter a valid amount")]
    NotPositive,
    #[error("Minimum amount is {label} {min}")]
    BelowMinimum { label: String, min: String },
    #[error("Maximum amount is {label} {max}")]
    AboveMaximum { label: String, max: String },
}

/// Check a raw input value against `bounds`, returning the parsed amount.
pub fn validate_amount(raw: &str, bounds: &AmountBounds) -> Result<f64, InvalidAmount> {
    let amount = match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() && n > 0.0 => n,
        _ => return Err(InvalidAmount::NotPositive),
    };
    if amount < bounds.min {
        return Err(InvalidAmount::BelowMinimum {
            label: bounds.currency_label.clone(),
            min: format_number(bounds.min),
        });
    }
    if amount > bounds.max {
        return Err(InvalidAmount::AboveMaximum {
            label: bounds.currency_label.clone(),
            max: format_number(bounds.max),
        });
    }
    Ok(amount)
}

/// Rupees → paisa, rounded to the nearest paisa.
pub fn to_minor_units(amount: f64) -> u64 {
    if !amount.is_finite() || amount <= 0.0 {
        return 0;
    }
    (amount * 100.0).round() as u64
}

/// `1234.5` → `"NPR 1,234.5"`, `1000` → `"NPR 1,000"`.
pub fn format_currency(amount: f64) -> String {
    format!("NPR {}", format_number(amount))
}

/// Thousands-grouped number with at most two fraction digits and no
/// trailing zeros.
pub fn format_number(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && cents != 0 { "-" } else { "" };
    match frac {
        0 => format!("{sign}{grouped}"),
        f if f % 10 == 0 => format!("{sign}{grouped}.{}", f / 10),
        f => format!("{sign}{grouped}.{:02}", f),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(raw: &str) -> Result<f64, String> {
        validate_amount(raw, &AmountBounds::default()).map_err(|e| e.to_string())
    }

    #[test]
    fn rejects_non_numeric_and_non_positive() {
        assert_eq!(check("abc"), Err("Please enter a valid amount".into()));
        assert_eq!(check(""), Err("Please enter a valid amount".into()));
        assert_eq!(check("0"), Err("Please enter a valid amount".into()));
        assert_eq!(check("-3"), Err("Please enter a valid amount".into()));
        assert_eq!(check("NaN"), Err("Please enter a valid amount".into()));
        assert_eq!(check("inf"), Err("Please enter a valid amount".into()));
    }

    #[test]
    fn enforces_bounds() {
        assert_eq!(check("5"), Err("Minimum amount is Rs. 10".into()));
        assert_eq!(check("100001"), Err("Maximum amount is Rs. 100,000".into()));
        assert_eq!(check("50"), Ok(50.0));
        assert_eq!(check(" 10 "), Ok(10.0));
        assert_eq!(check("100000"), Ok(100_000.0));
    }

    #[test]
    fn custom_bounds_are_reported() {
        let bounds = AmountBounds {
            min: 1.5,
            max: 2500.0,
            currency_label: "NPR".into(),
        };
        assert_eq!(
            validate_amount("1", &bounds).unwrap_err().to_string(),
            "Minimum amount is NPR 1.5"
        );
        assert_eq!(
            validate_amount("2500.01", &bounds).unwrap_err().to_string(),
            "Maximum amount is NPR 2,500"
        );
    }

    #[test]
    fn minor_units_round_once() {
        assert_eq!(to_minor_units(10.0), 1000);
        assert_eq!(to_minor_units(19.99), 1999);
        assert_eq!(to_minor_units(0.005), 1);
        assert_eq!(to_minor_units(-4.0), 0);
    }

    #[test]
    fn currency_formatting() {
        assert_eq!(format_currency(1000.0), "NPR 1,000");
        assert_eq!(format_currency(1234.5), "NPR 1,234.5");
        assert_eq!(format_currency(1234567.891), "NPR 1,234,567.89");
        assert_eq!(format_currency(12.05), "NPR 12.05");
        assert_eq!(format_number(-1500.0), "-1,500");
        assert_eq!(format_number(0.0), "0");
    }
}
