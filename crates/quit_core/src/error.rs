use thiserror::Error;

/// Failures raised by the progress engine.
///
/// Malformed user input (timestamps) is normally recovered from by the caller;
/// the remaining variants describe configuration mistakes and are meant to be
/// surfaced as hard errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid quit timestamp: {raw:?}")]
    InvalidTimestamp { raw: String },

    #[error("division by zero: `{field}` must be greater than zero")]
    DivisionByZero { field: &'static str },

    #[error("invalid threshold table `{table}`: {reason}")]
    InvalidThresholdTable { table: String, reason: String },

    #[error("invalid calendar month {month_index} for year {year} (expected 0..=11)")]
    InvalidCalendarMonth { year: i32, month_index: u32 },
}

impl EngineError {
    pub fn invalid_timestamp(raw: impl Into<String>) -> Self {
        Self::InvalidTimestamp { raw: raw.into() }
    }

    pub fn invalid_table(table: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidThresholdTable {
            table: table.into(),
            reason: reason.into(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
