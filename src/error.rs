use chrono::NaiveDate;
use thiserror::Error;

/// Application-level error carrying the process exit code.
///
/// Exit codes:
/// - `2`: bad input, configuration or local IO
/// - `3`: data insufficient for the computation (empty windows, no overlap)
/// - `4`: remote source failures (HTTP, unexpected page/JSON shape)
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Failures of the pure indicator/scoring core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("series '{name}' has no observations")]
    EmptySeries { name: String },

    #[error("series '{name}' has no observations in the window {start}..={end}")]
    EmptyWindow {
        name: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("no aligned data: '{left}' and '{right}' share no dates")]
    NoAlignedData { left: String, right: String },

    #[error("series '{name}' is not strictly increasing at {date}")]
    UnsortedDates { name: String, date: NaiveDate },

    #[error("invalid value for '{name}': {reason}")]
    InvalidValue { name: String, reason: String },
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        AppError::new(3, err.to_string())
    }
}
