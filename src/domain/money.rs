use bigdecimal::{BigDecimal, RoundingMode};

/// Money is kept at two fractional digits, rounding half away from zero.
pub fn round_money(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(2, RoundingMode::HalfUp)
}

pub fn line_total(unit_price: &BigDecimal, quantity: i32) -> BigDecimal {
    round_money(&(unit_price * BigDecimal::from(quantity)))
}

/// Amounts are stored as `NUMERIC(10, 2)`; anything above 99,999,999.99
/// cannot be persisted.
pub fn fits_storage(amount: &BigDecimal) -> bool {
    *amount <= BigDecimal::new(9_999_999_999i64.into(), 2)
}

/// Rounded sum of already-rounded amounts.
pub fn sum_money<'a>(amounts: impl IntoIterator<Item = &'a BigDecimal>) -> BigDecimal {
    let total = amounts
        .into_iter()
        .fold(BigDecimal::from(0), |acc, amount| acc + amount);
    round_money(&total)
}
