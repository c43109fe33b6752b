use thiserror::Error;

/// Errors produced while configuring or constructing a fee adjuster.
///
/// Block processing itself never fails; every error here is raised before an
/// adjuster exists.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeeMarketError {
    /// A configuration value is out of range or internally inconsistent.
    #[error("Invalid fee adjuster configuration: {reason}")]
    InvalidConfig { reason: String },

    /// The adjuster type name is not recognised.
    #[error("Unknown adjuster type: {0}")]
    UnknownAdjusterType(String),
}

impl FeeMarketError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}
