use chrono::{Datelike, NaiveDate};
use microloan_sim::calendar::HolidayCalendar;
use microloan_sim::xirr::{DEFAULT_GUESS, xirr};
use microloan_sim::{
    DatedCashFlow, InstallmentRow, ScheduleRow, SimulationError, SimulationInput,
    SimulationResult, Simulator, calculate_schedule,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn scenario_a() -> SimulationInput {
    SimulationInput {
        principal: dec!(2000),
        annual_rate: dec!(70),
        term: 12,
        disbursement_date: date(2025, 1, 1),
        first_payment_date: date(2025, 2, 1),
        loan_count: 1,
        benchmark_rate: dec!(4.28),
    }
}

fn installments(result: &SimulationResult) -> Vec<&InstallmentRow> {
    result
        .rows
        .iter()
        .filter_map(ScheduleRow::installment)
        .collect()
}

// ===========================================================================
// Scenarios
// ===========================================================================

#[test]
fn test_scenario_a_twelve_installments() {
    let result = calculate_schedule(&scenario_a()).unwrap();

    assert_eq!(result.rows.len(), 13);
    assert!(matches!(
        result.rows[0],
        ScheduleRow::Disbursement { amount, .. } if amount == dec!(2000)
    ));

    let rows = installments(&result);
    assert_eq!(rows.len(), 12);
    assert_eq!(rows.last().unwrap().balance, dec!(0.00));
    assert_eq!(result.summary.total_amortization, dec!(2000.00));

    // Saturdays are business days; 1 May and the Sunday/holiday pairs are not
    assert_eq!(rows[0].payment_date, date(2025, 2, 1));
    assert_eq!(rows[3].payment_date, date(2025, 5, 2));
    assert_eq!(rows[4].payment_date, date(2025, 6, 2));
    assert_eq!(rows[9].payment_date, date(2025, 11, 3));
    assert_eq!(rows[11].payment_date, date(2026, 1, 2));
}

#[test]
fn test_scenario_b_labour_day_shift() {
    let result = calculate_schedule(&SimulationInput {
        disbursement_date: date(2025, 4, 1),
        first_payment_date: date(2025, 5, 1),
        term: 3,
        ..scenario_a()
    })
    .unwrap();

    let rows = installments(&result);
    assert_eq!(rows[0].payment_date, date(2025, 5, 2));
    assert_eq!(rows[0].period_days, 31);
}

#[test]
fn test_scenario_c_single_installment() {
    let result = calculate_schedule(&SimulationInput {
        term: 1,
        ..scenario_a()
    })
    .unwrap();

    assert_eq!(result.rows.len(), 2);
    let row = installments(&result)[0];
    assert_eq!(row.amortization, dec!(2000));
    assert_eq!(row.balance, Decimal::ZERO);
    assert!((row.partial_installment - row.amortization - row.interest).abs() <= dec!(0.01));
    assert!(row.interest > Decimal::ZERO);
}

#[test]
fn test_scenario_d_degenerate_flows_leave_rate_undefined() {
    let flows = [
        DatedCashFlow::new(date(2025, 1, 1), dec!(-2000)),
        DatedCashFlow::new(date(2025, 1, 1), dec!(1000)),
    ];
    assert_eq!(xirr(&flows, DEFAULT_GUESS), None);
}

// ===========================================================================
// Properties
// ===========================================================================

#[rstest]
#[case(dec!(100), dec!(10), 1, date(2025, 1, 15), date(2025, 2, 15))]
#[case(dec!(20000), dec!(113.16), 12, date(2025, 1, 1), date(2025, 2, 1))]
#[case(dec!(3500.55), dec!(45.5), 6, date(2025, 12, 20), date(2026, 1, 31))]
#[case(dec!(999.99), dec!(90), 12, date(2024, 1, 30), date(2024, 2, 29))]
#[case(dec!(12345.67), dec!(25), 9, date(2025, 7, 10), date(2025, 7, 28))]
#[case(dec!(750), dec!(60), 4, date(2025, 3, 31), date(2025, 4, 17))]
fn test_schedule_invariants(
    #[case] principal: Decimal,
    #[case] annual_rate: Decimal,
    #[case] term: u32,
    #[case] disbursement_date: NaiveDate,
    #[case] first_payment_date: NaiveDate,
) {
    let input = SimulationInput {
        principal,
        annual_rate,
        term,
        disbursement_date,
        first_payment_date,
        ..scenario_a()
    };
    let result = calculate_schedule(&input).unwrap();
    let rows = installments(&result);
    assert_eq!(rows.len(), term as usize);

    // the table foots exactly to principal
    let amortized: Decimal = rows.iter().map(|r| r.amortization).sum();
    assert_eq!(amortized, principal);
    assert_eq!(result.summary.total_amortization, principal);
    assert_eq!(rows.last().unwrap().balance, Decimal::ZERO);

    // dates move forward, land on business days and match their periods
    let calendar = HolidayCalendar::default();
    let holidays = calendar
        .holiday_set(disbursement_date.year(), 2027)
        .unwrap();
    let mut previous = disbursement_date;
    for row in &rows {
        assert!(row.payment_date > previous);
        assert!(!holidays.is_non_business_day(row.payment_date).unwrap());
        assert_eq!(
            i64::from(row.period_days),
            (row.payment_date - previous).num_days()
        );
        previous = row.payment_date;
    }
}

#[test]
fn test_identical_inputs_give_identical_results() {
    let simulator = Simulator::default();
    let first = simulator.simulate(&scenario_a()).unwrap();
    let second = simulator.simulate(&scenario_a()).unwrap();
    let fresh = calculate_schedule(&scenario_a()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, fresh);
}

#[test]
fn test_interest_grows_with_rate() {
    let total_interest = |annual_rate: Decimal| {
        calculate_schedule(&SimulationInput {
            annual_rate,
            ..scenario_a()
        })
        .unwrap()
        .summary
        .total_interest
    };

    let mut previous = total_interest(dec!(10));
    for rate in [dec!(20), dec!(45.5), dec!(70), dec!(113.16)] {
        let current = total_interest(rate);
        assert!(current > previous, "{rate}%: {current} <= {previous}");
        previous = current;
    }
}

#[rstest]
#[case(dec!(100), true)]
#[case(dec!(20000), true)]
#[case(dec!(99.99), false)]
#[case(dec!(20000.01), false)]
fn test_principal_bounds(#[case] principal: Decimal, #[case] ok: bool) {
    let result = calculate_schedule(&SimulationInput {
        principal,
        ..scenario_a()
    });
    match result {
        Ok(_) => assert!(ok),
        Err(SimulationError::InvalidInput { field, .. }) => {
            assert!(!ok);
            assert_eq!(field, "principal");
        }
        Err(other) => panic!("unexpected error {other}"),
    }
}

#[test]
fn test_tcea_exceeds_tea() {
    let result = calculate_schedule(&scenario_a()).unwrap();
    let tcea = result.summary.effective_cost_rate.unwrap();
    // 360-day accrual measured over a 365-day year, plus the transaction tax
    assert!(tcea > result.summary.annual_rate);
}

#[test]
fn test_totals_match_rows() {
    let result = calculate_schedule(&scenario_a()).unwrap();
    let rows = installments(&result);
    let sum = |field: fn(&InstallmentRow) -> Decimal| -> Decimal {
        rows.iter().map(|row| field(row)).sum()
    };

    assert_eq!(result.summary.total_interest, sum(|r| r.interest));
    assert_eq!(result.summary.total_tax, sum(|r| r.tax));
    assert_eq!(result.summary.total_due, sum(|r| r.total_due));
    assert_eq!(
        result.summary.total_partial_installment,
        sum(|r| r.partial_installment)
    );
    assert_eq!(result.summary.total_expense, Decimal::ZERO);
}
