//! Decimal helpers for premium arithmetic.
//!
//! Every premium is rounded to kopecks before it feeds the next step, so
//! callers go through [`round2`] at each boundary instead of rounding once
//! at the end.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Round to 2 fractional digits, halves away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Round to whole rubles, halves away from zero.
pub fn round0(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// `amount × pct / 100`, unrounded.
pub fn percent_of(amount: Decimal, pct: Decimal) -> Decimal {
    amount * pct / dec!(100)
}

/// Multiplier that applies a discount of `pct` percent.
pub fn discount_multiplier(pct: Decimal) -> Decimal {
    Decimal::ONE - pct / dec!(100)
}

/// `2 500 000,00`: space-grouped thousands, decimal comma, kopecks always shown.
pub fn format_money(value: Decimal) -> String {
    let text = format!("{:.2}", round2(value));
    let (integer, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    format!("{},{}", group_thousands(integer), fraction)
}

/// `15 000 000`: whole rubles, space-grouped.
pub fn format_rubles(value: Decimal) -> String {
    group_thousands(&round0(value).to_string())
}

fn group_thousands(integer: &str) -> String {
    let (sign, digits) = match integer.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", integer),
    };
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    format!("{}{}", sign, grouped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2_half_away_from_zero() {
        assert_eq!(round2(dec!(1.005)), dec!(1.01));
        assert_eq!(round2(dec!(2.344)), dec!(2.34));
        assert_eq!(round2(dec!(-1.005)), dec!(-1.01));
    }

    #[test]
    fn test_round0() {
        assert_eq!(round0(dec!(62500.5)), dec!(62501));
        assert_eq!(round0(dec!(62500.49)), dec!(62500));
    }

    #[test]
    fn test_percent_helpers() {
        assert_eq!(percent_of(dec!(2500000), dec!(10)), dec!(250000));
        assert_eq!(discount_multiplier(dec!(20)), dec!(0.8));
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(dec!(2500000)), "2 500 000,00");
        assert_eq!(format_money(dec!(6780.5)), "6 780,50");
        assert_eq!(format_money(dec!(600)), "600,00");
        assert_eq!(format_money(dec!(-1234.567)), "-1 234,57");
    }

    #[test]
    fn test_format_rubles() {
        assert_eq!(format_rubles(dec!(15000000)), "15 000 000");
        assert_eq!(format_rubles(dec!(999)), "999");
    }
}
