use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::schedule::{InstallmentRow, ScheduleRow};
use crate::types::{Money, Rate, round2};
use crate::xirr::DatedCashFlow;

/// Column totals of the installment rows plus the rates behind them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    /// Principal repaid; equals the principal once reconciled.
    pub total_amortization: Money,
    /// Interest paid over the whole loan.
    pub total_interest: Money,
    /// Sum of amortization plus interest.
    pub total_partial_installment: Money,
    /// Sum of the fixed per-installment expenses.
    pub total_expense: Money,
    /// Sum of partial installments plus expenses.
    pub total_installment: Money,
    /// Transaction tax paid over the whole loan.
    pub total_tax: Money,
    /// Everything the borrower pays back.
    pub total_due: Money,
    /// Sum of the discount factors of every payment date.
    pub present_value_factor: Decimal,
    /// Level installment before the closing one.
    pub level_installment: Money,
    /// Annual effective rate (TEA) as a decimal.
    pub annual_rate: Rate,
    /// Total annual effective cost (TCEA); `None` when XIRR found no rate.
    pub effective_cost_rate: Option<Rate>,
}

impl ScheduleSummary {
    /// Sums every installment row. The disbursement row is not part of any total.
    pub fn from_rows(
        rows: &[ScheduleRow],
        present_value_factor: Decimal,
        level_installment: Money,
        annual_rate: Rate,
    ) -> Self {
        let installments: Vec<&InstallmentRow> =
            rows.iter().filter_map(ScheduleRow::installment).collect();
        let total = |field: fn(&InstallmentRow) -> Money| -> Money {
            round2(installments.iter().map(|row| field(row)).sum())
        };

        Self {
            total_amortization: total(|row| row.amortization),
            total_interest: total(|row| row.interest),
            total_partial_installment: total(|row| row.partial_installment),
            total_expense: total(|row| row.expense),
            total_installment: total(|row| row.total_installment),
            total_tax: total(|row| row.tax),
            total_due: total(|row| row.total_due),
            present_value_factor,
            level_installment,
            annual_rate,
            effective_cost_rate: None,
        }
    }
}

/// The borrower's view of the loan: the disbursement as an outflow, every
/// total due as an inflow.
pub fn cash_flows(rows: &[ScheduleRow]) -> Vec<DatedCashFlow> {
    rows.iter()
        .map(|row| match row {
            ScheduleRow::Disbursement { date, amount } => DatedCashFlow::new(*date, -*amount),
            ScheduleRow::Installment(installment) => {
                DatedCashFlow::new(installment.payment_date, installment.total_due)
            }
        })
        .collect()
}

/// Return on principal for both alternatives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profitability {
    /// Total interest over principal.
    pub loan: Rate,
    /// Benchmark rate prorated to the term in months.
    pub deposit: Rate,
}

/// Absolute earnings over the term, scaled by the number of loans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gain {
    /// Interest collected from the loans.
    pub loan: Money,
    /// Interest the same capital earns in the deposit.
    pub deposit: Money,
}

/// Capital and earnings side by side for both alternatives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalReturns {
    /// Principal lent across every loan.
    pub capital_invested: Money,
    /// Interest earned by lending it.
    pub loan_gain: Money,
    /// The same capital left in the deposit.
    pub capital_saved: Money,
    /// Interest earned by the deposit.
    pub deposit_interest: Money,
}

/// Lending versus leaving the same capital in a fixed-term deposit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonMetrics {
    /// Returns as a fraction of principal.
    pub profitability: Profitability,
    /// Earnings in money.
    pub gain: Gain,
    /// Capital and earnings per alternative.
    pub returns: CapitalReturns,
}

impl ComparisonMetrics {
    pub fn new(
        summary: &ScheduleSummary,
        principal: Money,
        term: u32,
        loan_count: u32,
        benchmark_rate: Rate,
    ) -> Self {
        let loans = Decimal::from(loan_count);
        let deposit_rate = benchmark_rate * Decimal::from(term) / Decimal::from(12);
        let deposit_gain = principal * deposit_rate * loans;
        let loan_gain = summary.total_interest * loans;
        let capital = principal * loans;

        Self {
            profitability: Profitability {
                loan: summary.total_interest / principal,
                deposit: deposit_rate,
            },
            gain: Gain {
                loan: loan_gain,
                deposit: deposit_gain,
            },
            returns: CapitalReturns {
                capital_invested: capital,
                loan_gain,
                capital_saved: capital,
                deposit_interest: deposit_gain,
            },
        }
    }
}
