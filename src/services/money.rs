use rust_decimal::{Decimal, RoundingStrategy};

/// Fraction digits kept for prices and ratings
pub const MONEY_SCALE: u32 = 2;

/// Fixed 10% markup factor (1.10)
pub fn markup_factor() -> Decimal {
    Decimal::new(110, 2)
}

/// Largest price the `NUMERIC(8, 2)` column can hold
pub fn max_price() -> Decimal {
    Decimal::new(99_999_999, 2)
}

/// Round half away from zero to two fraction digits and pin the scale so the
/// value always renders as e.g. `11.00`.
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

pub fn apply_markup(price: Decimal) -> Decimal {
    round_money(price * markup_factor())
}

/// Arithmetic mean of the ratings at money precision; 0.00 when empty
pub fn mean_rating(ratings: &[i32]) -> Decimal {
    if ratings.is_empty() {
        return round_money(Decimal::ZERO);
    }
    let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
    round_money(Decimal::from(sum) / Decimal::from(ratings.len() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn markup_compounds() {
        let once = apply_markup(dec("10.00"));
        let twice = apply_markup(once);
        assert_eq!(once.to_string(), "11.00");
        assert_eq!(twice.to_string(), "12.10");
    }

    #[test]
    fn markup_on_integer_input_keeps_two_digits() {
        assert_eq!(apply_markup(dec("100")).to_string(), "110.00");
    }

    #[test]
    fn midpoints_round_away_from_zero() {
        // 0.15 * 1.10 = 0.165
        assert_eq!(apply_markup(dec("0.15")).to_string(), "0.17");
        assert_eq!(round_money(dec("2.345")).to_string(), "2.35");
        assert_eq!(round_money(dec("2.344")).to_string(), "2.34");
    }

    #[test]
    fn mean_of_ratings() {
        assert_eq!(mean_rating(&[]).to_string(), "0.00");
        assert_eq!(mean_rating(&[5]).to_string(), "5.00");
        assert_eq!(mean_rating(&[4, 5]).to_string(), "4.50");
        assert_eq!(mean_rating(&[5, 4, 4]).to_string(), "4.33");
        assert_eq!(mean_rating(&[1, 1, 2]).to_string(), "1.33");
        assert_eq!(mean_rating(&[2, 2, 1]).to_string(), "1.67");
    }

    #[test]
    fn max_price_matches_column() {
        assert_eq!(max_price().to_string(), "999999.99");
    }
}
