use {fms_fee_market::FeeMarketError, thiserror::Error};

/// Errors raised while assembling a simulation run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("Unknown scenario: {0} (expected one of all, full, empty, stable, mixed)")]
    UnknownScenario(String),

    #[error("Invalid randomizer configuration: {reason}")]
    InvalidRandomizer { reason: String },

    #[error("Invalid dataset: {reason}")]
    InvalidDataSet { reason: String },

    #[error(transparent)]
    Adjuster(#[from] FeeMarketError),
}
