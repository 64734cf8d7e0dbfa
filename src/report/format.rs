//! Number formatting for report rows and totals.

use rust_decimal::{Decimal, RoundingStrategy};

/// Format `amount` with exactly two decimal places and no thousands separators.
///
/// Midpoints round away from zero, so `1.005` becomes `1.01` and `-1.005`
/// becomes `-1.01`. Values that round to zero never carry a minus sign.
pub fn format_amount(amount: Decimal) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }

    // Pads to two places even past 26 integer digits, where `rescale` cannot.
    format!("{rounded:.2}")
}

/// Add up `amounts` exactly, returning `None` if the sum overflows.
///
/// The result is unrounded so that totals are rounded once, after summing.
pub fn sum_amounts(amounts: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |total, amount| total.checked_add(amount))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::{format_amount, sum_amounts};

    #[test]
    fn pads_to_two_decimal_places() {
        assert_eq!(format_amount(dec!(1234.5)), "1234.50");
        assert_eq!(format_amount(dec!(3)), "3.00");
    }

    #[test]
    fn negative_amounts_keep_minus_sign() {
        assert_eq!(format_amount(dec!(-12)), "-12.00");
        assert_eq!(format_amount(dec!(-0.5)), "-0.50");
    }

    #[test]
    fn has_no_thousands_separators() {
        assert_eq!(format_amount(dec!(1234567.891)), "1234567.89");
    }

    #[test]
    fn rounds_midpoint_away_from_zero() {
        assert_eq!(format_amount(dec!(1.005)), "1.01");
        assert_eq!(format_amount(dec!(-1.005)), "-1.01");
        assert_eq!(format_amount(dec!(2.004)), "2.00");
    }

    #[test]
    fn largest_amounts_keep_two_decimal_places() {
        assert_eq!(format_amount(Decimal::MAX), "79228162514264337593543950335.00");
        assert_eq!(
            format_amount(dec!(1234567890123456789012345678.9)),
            "1234567890123456789012345678.90"
        );
        assert_eq!(format_amount(Decimal::MIN), "-79228162514264337593543950335.00");
    }

    #[test]
    fn negative_zero_is_printed_without_sign() {
        assert_eq!(format_amount(dec!(-0.001)), "0.00");
    }

    #[test]
    fn sums_before_rounding() {
        let amounts = [dec!(0.004), dec!(0.004), dec!(0.004)];

        let total = sum_amounts(amounts).unwrap();

        // Rounding each amount first would give 0.00.
        assert_eq!(format_amount(total), "0.01");
    }

    #[test]
    fn empty_sum_is_zero() {
        assert_eq!(sum_amounts([]), Some(Decimal::ZERO));
    }

    #[test]
    fn overflowing_sum_is_none() {
        assert_eq!(sum_amounts([Decimal::MAX, Decimal::ONE]), None);
    }
}
