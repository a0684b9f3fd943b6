//! Field validators shared by the request bodies.

use rust_decimal::Decimal;
use validator::ValidationError;

/// Cents are the smallest unit a money field stores.
const MONEY_DECIMAL_PLACES: u32 = 2;

/// Money columns hold 12 integer digits.
const MONEY_INTEGER_DIGITS: u32 = 12;

/// Rejects money values with more than two decimal places or too many digits.
///
/// Trailing zeros do not count, so `1.500` is accepted as `1.5`.
pub fn money_amount(value: &Decimal) -> Result<(), ValidationError> {
    if value.normalize().scale() > MONEY_DECIMAL_PLACES {
        let mut error = ValidationError::new("too_many_decimals");
        error.message = Some("Ensure that there are no more than 2 decimal places".into());
        return Err(error);
    }
    if value.abs() >= Decimal::new(10_i64.pow(MONEY_INTEGER_DIGITS), 0) {
        let mut error = ValidationError::new("too_many_digits");
        error.message = Some("Ensure that there are no more than 12 digits before the decimal point".into());
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_amount_accepts_cents() {
        for value in ["0", "1500", "1500.00", "-200.5", "0.01", "1.500", "999999999999.99"] {
            let value: Decimal = value.parse().unwrap();
            assert!(money_amount(&value).is_ok(), "{} should be accepted", value);
        }
    }

    #[test]
    fn test_money_amount_rejects_fractions_of_a_cent() {
        for value in ["0.019", "0.005", "-12.345"] {
            let value: Decimal = value.parse().unwrap();
            let error = money_amount(&value).unwrap_err();
            assert_eq!(error.code, "too_many_decimals");
        }
    }

    #[test]
    fn test_money_amount_rejects_values_too_large_for_the_column() {
        let value: Decimal = "1000000000000".parse().unwrap();
        assert_eq!(money_amount(&value).unwrap_err().code, "too_many_digits");
        assert_eq!(money_amount(&-value).unwrap_err().code, "too_many_digits");
    }
}
