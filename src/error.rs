use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or missing input, or nothing left to train on.
    #[error("Data error: {0}")]
    DataError(String),

    /// Unknown player, self-matchup or unmapped statistic name.
    #[error("Lookup error: {0}")]
    LookupError(String),

    #[error("Scaling error: {0}")]
    ScalingError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),
}

impl AppError {
    pub fn is_lookup(&self) -> bool {
        matches!(self, AppError::LookupError(_))
    }

    pub fn is_data(&self) -> bool {
        matches!(self, AppError::DataError(_))
    }
}
