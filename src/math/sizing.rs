//! Share sizing and ratio helpers.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Whole shares purchasable with `dollars` at `price`, truncated toward zero.
///
/// Returns `None` when the price is not strictly positive or the result does
/// not fit in an `i64`.
pub fn shares_for_notional(dollars: Decimal, price: Decimal) -> Option<i64> {
    if price <= Decimal::ZERO {
        return None;
    }
    (dollars / price).trunc().to_i64()
}

/// Absolute dollar value of `shares` at `price`.
pub fn notional(shares: i64, price: Decimal) -> Decimal {
    (Decimal::from(shares) * price).abs()
}

/// `numerator / denominator`, or `None` when the denominator is zero.
pub fn safe_ratio(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    if denominator.is_zero() {
        None
    } else {
        numerator.checked_div(denominator)
    }
}

/// Lossy conversion for statistics; 0.0 if the value is out of range.
pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_shares_truncate_toward_zero() {
        assert_eq!(shares_for_notional(dec!(50000), dec!(100)), Some(500));
        assert_eq!(shares_for_notional(dec!(50000), dec!(30)), Some(1666));
        assert_eq!(shares_for_notional(dec!(-50000), dec!(30)), Some(-1666));
    }

    #[test]
    fn test_shares_reject_non_positive_price() {
        assert_eq!(shares_for_notional(dec!(1000), dec!(0)), None);
        assert_eq!(shares_for_notional(dec!(1000), dec!(-5)), None);
    }

    #[test]
    fn test_notional_is_absolute() {
        assert_eq!(notional(-1000, dec!(50)), dec!(50000));
        assert_eq!(notional(500, dec!(103)), dec!(51500));
    }

    #[test]
    fn test_safe_ratio() {
        assert_eq!(safe_ratio(dec!(10), dec!(0)), None);
        assert_eq!(safe_ratio(dec!(10), dec!(4)), Some(dec!(2.5)));
    }
}
