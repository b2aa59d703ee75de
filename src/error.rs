use rust_decimal::Decimal;
use thiserror::Error;

/// Result alias used throughout the simulator.
pub type SimResult<T> = Result<T, SimulationError>;

/// Fatal failures of a simulation run.
///
/// A failed XIRR is deliberately absent: the schedule stays valid and the
/// summary simply reports an undefined TCEA.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Present value factor {factor} is not positive, check the annual rate")]
    DegenerateRate { factor: Decimal },

    #[error("Installment {installment} has a period of {days} days, check the dates")]
    InvalidPeriod { installment: u32, days: i64 },

    #[error("Year {year} is outside the holiday set range {start_year}..={end_year}")]
    UncoveredYear {
        year: i32,
        start_year: i32,
        end_year: i32,
    },

    #[error("Date error: {0}")]
    InvalidDate(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SimulationError {
    pub(crate) fn invalid_input(field: &str, reason: impl Into<String>) -> Self {
        SimulationError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for SimulationError {
    fn from(e: serde_json::Error) -> Self {
        SimulationError::Serialization(e.to_string())
    }
}
