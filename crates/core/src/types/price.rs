//! Unit prices.
//!
//! Prices travel as plain JSON numbers and are held as [`Decimal`] so totals
//! don't drift. Documents written by older clients sometimes carry a missing,
//! `null`, textual or negative price; [`lenient`] reads all of those as zero
//! instead of rejecting the whole document.

use rust_decimal::Decimal;

/// Currency shown when an item carries none.
pub const DEFAULT_CURRENCY: &str = "QAR";

/// Format an amount for display (e.g., `QAR 60.00`).
#[must_use]
pub fn format_price(amount: Decimal, currency: Option<&str>) -> String {
    format!(
        "{} {:.2}",
        currency.unwrap_or(DEFAULT_CURRENCY),
        amount.round_dp(2)
    )
}

/// Serde adapter for prices stored as JSON numbers.
///
/// Use with `#[serde(default, with = "kos_core::price::lenient")]`.
pub mod lenient {
    use rust_decimal::Decimal;
    use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    /// Write integral amounts as JSON integers and the rest as floats.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S>(amount: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let normalized = amount.normalize();
        if normalized.scale() == 0
            && let Some(whole) = normalized.to_i64()
        {
            return serializer.serialize_i64(whole);
        }
        serializer.serialize_f64(amount.to_f64().unwrap_or_default())
    }

    /// Read any JSON value, mapping anything that is not a non-negative
    /// number (or numeric string) to zero.
    ///
    /// # Errors
    ///
    /// Only fails when the input is not valid JSON at all.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(from_json(&value))
    }

    /// Convert a JSON value to a price, defaulting to zero.
    #[must_use]
    pub fn from_json(value: &Value) -> Decimal {
        let parsed = match value {
            Value::Number(n) => n
                .as_i64()
                .map(Decimal::from)
                .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
            Value::String(s) => s.trim().parse::<Decimal>().ok(),
            _ => None,
        };
        parsed
            .filter(|amount| !amount.is_sign_negative())
            .unwrap_or(Decimal::ZERO)
    }
}
