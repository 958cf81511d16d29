//! Errors

use thiserror::Error;

/// Reward scan error
#[derive(Debug, Error)]
pub enum Error {
    /// Device availability check returned false
    #[error("Ledger device is unavailable!")]
    DeviceUnavailable,
    /// Device transport failed
    #[error("Device transport error: {0}")]
    Transport(String),
    /// Account discovery failed
    #[error("Account discovery failed: {0}")]
    Discovery(String),
    /// Tip time request failed
    #[error("Could not fetch tip time: {0}")]
    TipTime(String),
    /// Discovery succeeded but there is nothing to claim against
    #[error("No account balances found.")]
    NoBalancesFound,
    /// A collaborator gave up, for example an export rejected on the device
    #[error("Scan was cancelled")]
    Cancelled,
    /// Builder is missing a required collaborator
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    /// Fee schedule out of range
    #[error("Invalid fee schedule: {0}")]
    InvalidFeeSchedule(String),
    /// Settings could not be loaded
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    /// Serde Json error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether re-running the scan could succeed without user changes
    /// to the wallet.
    ///
    /// An empty wallet is a legitimate result, not a transient failure.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::DeviceUnavailable
                | Error::Transport(_)
                | Error::Discovery(_)
                | Error::TipTime(_)
                | Error::Cancelled
        )
    }
}
