//! Payment dates and the amortization table built on top of them.

pub mod amortization;
pub mod dates;

pub use amortization::{
    AmortizationSchedule, FIXED_EXPENSE, InstallmentRow, ScheduleRow, TRANSACTION_TAX_RATE,
    build_schedule, daily_rate, level_installment, present_value_factor, reconcile,
};
pub use dates::{Period, anchored_month, days_in_month, payment_periods};
