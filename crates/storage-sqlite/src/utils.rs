//! Conversion helpers shared by the `*DB` model types.
//!
//! Monetary and NAV quantities are stored as TEXT and converted to
//! `rust_decimal::Decimal` at the model boundary. Reads are tolerant: a
//! malformed cell is logged and read as zero rather than failing the whole
//! row, with a fallback through `f64` for values written in scientific
//! notation.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parses a TEXT decimal column, falling back to `f64` for scientific
/// notation and to zero (logged) when the cell is unreadable.
pub(crate) fn parse_decimal_column(raw: &str, column: &str) -> Decimal {
    match Decimal::from_str(raw) {
        Ok(value) => value,
        Err(decimal_err) => match f64::from_str(raw) {
            Ok(float_value) => match Decimal::from_f64(float_value) {
                Some(value) => value,
                None => {
                    log::error!(
                        "Failed to convert {} '{}' (parsed as f64: {}) to Decimal.",
                        column,
                        raw,
                        float_value
                    );
                    Decimal::ZERO
                }
            },
            Err(float_err) => {
                log::error!(
                    "Failed to parse {} '{}': as Decimal (err: {}), and as f64 (err: {}). Falling back to ZERO.",
                    column,
                    raw,
                    decimal_err,
                    float_err
                );
                Decimal::ZERO
            }
        },
    }
}

/// Parses a nullable TEXT decimal column. NULL stays `None`.
pub(crate) fn parse_optional_decimal_column(raw: Option<&str>, column: &str) -> Option<Decimal> {
    raw.map(|value| parse_decimal_column(value, column))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_plain_decimals_parse_exactly() {
        assert_eq!(parse_decimal_column("1.2345", "unit_net_value"), dec!(1.2345));
        assert_eq!(parse_decimal_column("-0.57", "daily_change_rate"), dec!(-0.57));
        assert_eq!(parse_decimal_column("0", "cost"), Decimal::ZERO);
    }

    #[test]
    fn test_scientific_notation_falls_back_through_f64() {
        assert_eq!(parse_decimal_column("1e2", "shares"), dec!(100));
        assert_eq!(parse_decimal_column("2.5e-3", "shares"), dec!(0.0025));
    }

    #[test]
    fn test_garbage_reads_as_zero() {
        assert_eq!(parse_decimal_column("not-a-number", "cost"), Decimal::ZERO);
        assert_eq!(parse_decimal_column("", "cost"), Decimal::ZERO);
    }

    #[test]
    fn test_nullable_column_keeps_null() {
        assert_eq!(parse_optional_decimal_column(None, "profit_loss"), None);
        assert_eq!(
            parse_optional_decimal_column(Some("11.5"), "profit_loss"),
            Some(dec!(11.5))
        );
    }
}
