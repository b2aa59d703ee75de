use rust_decimal::{Decimal, RoundingStrategy};

/// Monetary amounts.
pub type Money = Decimal;

/// Rates expressed as decimals (0.70 = 70%), never as percentages.
pub type Rate = Decimal;

/// Rounds to cents, half away from zero.
///
/// `Decimal::round_dp` defaults to banker's rounding, which would turn
/// 0.125 into 0.12; schedules are expected to show 0.13.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Converts a percentage (70 for 70%) into a decimal rate.
pub fn percent_to_rate(percent: Decimal) -> Rate {
    percent / Decimal::ONE_HUNDRED
}
