use chrono::NaiveDate;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::{Money, Rate};

pub const DEFAULT_GUESS: Rate = dec!(0.10);
const MAX_ITERATIONS: u32 = 100;
const TOLERANCE: Decimal = dec!(0.0000001);
const DAYS_PER_YEAR: Decimal = dec!(365);

/// A signed cash flow: negative leaves the lender, positive comes back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatedCashFlow {
    pub date: NaiveDate,
    /// Signed amount.
    pub amount: Money,
}

impl DatedCashFlow {
    pub fn new(date: NaiveDate, amount: Money) -> Self {
        Self { date, amount }
    }
}

/// Annualized internal rate of return of irregularly dated cash flows.
///
/// Plain Newton-Raphson from `guess`, stopping once `|NPV| < 1e-7`.
/// Returns `None` when the derivative vanishes, the iteration leaves the
/// domain `rate > -1`, or 100 iterations pass without convergence. There is
/// no bracketing fallback.
pub fn xirr(flows: &[DatedCashFlow], guess: Rate) -> Option<Rate> {
    let mut sorted = flows.to_vec();
    sorted.sort_by_key(|flow| flow.date);
    let base_date = sorted.first()?.date;

    let timed: Vec<(Decimal, Money)> = sorted
        .iter()
        .map(|flow| (Decimal::from((flow.date - base_date).num_days()), flow.amount))
        .collect();

    let mut rate = guess;
    for iteration in 0..MAX_ITERATIONS {
        let Some((npv, derivative)) = npv_with_derivative(&timed, rate) else {
            warn!(iteration, %rate, "XIRR left the domain of the NPV function");
            return None;
        };

        if npv.abs() < TOLERANCE {
            debug!(iteration, %rate, "XIRR converged");
            return Some(rate);
        }
        if derivative.is_zero() {
            warn!(iteration, %rate, %npv, "XIRR derivative vanished");
            return None;
        }

        let Some(next) = npv
            .checked_div(derivative)
            .and_then(|step| rate.checked_sub(step))
        else {
            warn!(iteration, %rate, "XIRR step overflowed");
            return None;
        };
        rate = next;
    }

    warn!(iterations = MAX_ITERATIONS, %rate, "XIRR did not converge");
    None
}

/// NPV and dNPV/drate, with every day count measured from the first flow.
fn npv_with_derivative(timed: &[(Decimal, Money)], rate: Rate) -> Option<(Decimal, Decimal)> {
    let one_plus_rate = Decimal::ONE + rate;
    if one_plus_rate <= Decimal::ZERO {
        return None;
    }

    let mut npv = Decimal::ZERO;
    let mut derivative = Decimal::ZERO;
    for &(days, amount) in timed {
        let years = days / DAYS_PER_YEAR;
        let discount = one_plus_rate.checked_powd(years)?;
        npv = npv.checked_add(amount.checked_div(discount)?)?;

        if days > Decimal::ZERO {
            let denominator = DAYS_PER_YEAR
                .checked_mul(discount)?
                .checked_mul(one_plus_rate)?;
            let term = days.checked_mul(amount)?.checked_div(denominator)?;
            derivative = derivative.checked_sub(term)?;
        }
    }
    Some((npv, derivative))
}
