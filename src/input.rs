use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{SimResult, SimulationError};
use crate::types::{Money, Rate, percent_to_rate};

pub const MIN_PRINCIPAL: Money = dec!(100);
pub const MAX_PRINCIPAL: Money = dec!(20000);
pub const MIN_ANNUAL_RATE_PERCENT: Decimal = dec!(10);
pub const MAX_ANNUAL_RATE_PERCENT: Decimal = dec!(113.16);
pub const MIN_TERM: u32 = 1;
pub const MAX_TERM: u32 = 12;
pub const MIN_LOAN_COUNT: u32 = 1;
pub const MAX_LOAN_COUNT: u32 = 10;

/// Parameters of a simulation, as handed over by the caller.
///
/// Rates are percentages here (70 for 70%); they become decimals once
/// [`SimulationInput::validate`] succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationInput {
    /// Amount disbursed to the borrower.
    pub principal: Money,
    /// Annual effective rate (TEA) as a percentage.
    pub annual_rate: Decimal,
    /// Number of installments.
    pub term: u32,
    /// Date the principal is paid out.
    pub disbursement_date: NaiveDate,
    /// Requested date of the first installment; its day of month anchors the rest.
    pub first_payment_date: NaiveDate,
    /// Number of identical loans the lender funds in parallel.
    pub loan_count: u32,
    /// Annual rate of the fixed-term deposit used as benchmark, as a percentage.
    pub benchmark_rate: Decimal,
}

/// Input that passed every range check, with rates converted to decimals.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedInput {
    pub principal: Money,
    pub annual_rate: Rate,
    pub term: u32,
    pub disbursement_date: NaiveDate,
    pub first_payment_date: NaiveDate,
    pub loan_count: u32,
    pub benchmark_rate: Rate,
}

impl SimulationInput {
    /// Checks every bound and returns the first violation found.
    pub fn validate(&self) -> SimResult<ValidatedInput> {
        if self.principal < MIN_PRINCIPAL || self.principal > MAX_PRINCIPAL {
            return Err(SimulationError::invalid_input(
                "principal",
                format!("must be between {MIN_PRINCIPAL} and {MAX_PRINCIPAL}"),
            ));
        }
        if self.principal.normalize().scale() > 2 {
            return Err(SimulationError::invalid_input(
                "principal",
                "must have at most 2 decimal places",
            ));
        }
        if self.annual_rate < MIN_ANNUAL_RATE_PERCENT || self.annual_rate > MAX_ANNUAL_RATE_PERCENT
        {
            return Err(SimulationError::invalid_input(
                "annual_rate",
                format!(
                    "must be between {MIN_ANNUAL_RATE_PERCENT}% and {MAX_ANNUAL_RATE_PERCENT}%"
                ),
            ));
        }
        if !(MIN_TERM..=MAX_TERM).contains(&self.term) {
            return Err(SimulationError::invalid_input(
                "term",
                format!("must be between {MIN_TERM} and {MAX_TERM} installments"),
            ));
        }
        if !(MIN_LOAN_COUNT..=MAX_LOAN_COUNT).contains(&self.loan_count) {
            return Err(SimulationError::invalid_input(
                "loan_count",
                format!("must be between {MIN_LOAN_COUNT} and {MAX_LOAN_COUNT}"),
            ));
        }
        if self.benchmark_rate < Decimal::ZERO {
            return Err(SimulationError::invalid_input(
                "benchmark_rate",
                "cannot be negative",
            ));
        }
        if self.first_payment_date <= self.disbursement_date {
            return Err(SimulationError::invalid_input(
                "first_payment_date",
                format!(
                    "must be after the disbursement date {}",
                    self.disbursement_date
                ),
            ));
        }

        Ok(ValidatedInput {
            principal: self.principal,
            annual_rate: percent_to_rate(self.annual_rate),
            term: self.term,
            disbursement_date: self.disbursement_date,
            first_payment_date: self.first_payment_date,
            loan_count: self.loan_count,
            benchmark_rate: percent_to_rate(self.benchmark_rate),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn base_input() -> SimulationInput {
        SimulationInput {
            principal: dec!(2000),
            annual_rate: dec!(70),
            term: 12,
            disbursement_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            first_payment_date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            loan_count: 1,
            benchmark_rate: dec!(4.28),
        }
    }

    fn failing_field(input: &SimulationInput) -> String {
        match input.validate() {
            Err(SimulationError::InvalidInput { field, .. }) => field,
            other => panic!("expected a validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_input_converts_rates() {
        let validated = base_input().validate().unwrap();
        assert_eq!(validated.annual_rate, dec!(0.70));
        assert_eq!(validated.benchmark_rate, dec!(0.0428));
        assert_eq!(validated.principal, dec!(2000));
    }

    #[rstest]
    #[case(dec!(100))]
    #[case(dec!(20000))]
    #[case(dec!(20000.00))]
    #[case(dec!(1234.5))]
    fn test_principal_inside_bounds(#[case] principal: Decimal) {
        let input = SimulationInput {
            principal,
            ..base_input()
        };
        assert!(input.validate().is_ok());
    }

    #[rstest]
    #[case(dec!(99.99))]
    #[case(dec!(20000.01))]
    #[case(dec!(0))]
    #[case(dec!(150.001))]
    fn test_principal_outside_bounds(#[case] principal: Decimal) {
        let input = SimulationInput {
            principal,
            ..base_input()
        };
        assert_eq!(failing_field(&input), "principal");
    }

    #[rstest]
    #[case(dec!(9.99), false)]
    #[case(dec!(10), true)]
    #[case(dec!(113.16), true)]
    #[case(dec!(113.17), false)]
    fn test_annual_rate_bounds(#[case] annual_rate: Decimal, #[case] ok: bool) {
        let input = SimulationInput {
            annual_rate,
            ..base_input()
        };
        assert_eq!(input.validate().is_ok(), ok);
    }

    #[rstest]
    #[case(0, false)]
    #[case(1, true)]
    #[case(12, true)]
    #[case(13, false)]
    fn test_term_bounds(#[case] term: u32, #[case] ok: bool) {
        let input = SimulationInput {
            term,
            ..base_input()
        };
        assert_eq!(input.validate().is_ok(), ok);
    }

    #[rstest]
    #[case(0, false)]
    #[case(1, true)]
    #[case(10, true)]
    #[case(11, false)]
    fn test_loan_count_bounds(#[case] loan_count: u32, #[case] ok: bool) {
        let input = SimulationInput {
            loan_count,
            ..base_input()
        };
        assert_eq!(input.validate().is_ok(), ok);
    }

    #[test]
    fn test_negative_benchmark_rate_rejected() {
        let input = SimulationInput {
            benchmark_rate: dec!(-0.01),
            ..base_input()
        };
        assert_eq!(failing_field(&input), "benchmark_rate");

        let zero = SimulationInput {
            benchmark_rate: Decimal::ZERO,
            ..base_input()
        };
        assert!(zero.validate().is_ok());
    }

    #[rstest]
    #[case(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())]
    #[case(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap())]
    fn test_first_payment_must_follow_disbursement(#[case] first_payment_date: NaiveDate) {
        let input = SimulationInput {
            first_payment_date,
            ..base_input()
        };
        assert_eq!(failing_field(&input), "first_payment_date");
    }

    #[test]
    fn test_deserializes_from_json() {
        let json = r#"{
            "principal": "2000",
            "annual_rate": "70",
            "term": 12,
            "disbursement_date": "2025-01-01",
            "first_payment_date": "2025-02-01",
            "loan_count": 1,
            "benchmark_rate": "4.28"
        }"#;
        let input: SimulationInput = serde_json::from_str(json).unwrap();
        assert_eq!(input, base_input());
    }
}
