//! Komodo hardware wallet reward scanning.
//!
//! Drives a hardware wallet through the connect and public key approval
//! steps, discovers every account the device controls and computes the
//! claimable rewards of each one.
//!
//! ```rust,ignore
//! let scanner = RewardScannerBuilder::new()
//!     .device(device)
//!     .discovery(discovery)
//!     .chain(chain)
//!     .sink(|data: RewardData| println!("{}", data.total_claimable()))
//!     .build()?;
//!
//! match scanner.start().await {
//!     ScanOutcome::Completed(data) => tracing::info!("{} accounts", data.accounts.len()),
//!     outcome => tracing::warn!("Scan ended with {:?}", outcome),
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

pub mod aggregator;
pub mod amount;
pub mod chain;
pub mod device;
pub mod error;
pub mod fees;
pub mod rewards;
pub mod scan;
pub mod settings;
pub mod sink;
pub mod types;
pub mod util;

pub use self::aggregator::calculate_reward_data;
pub use self::amount::{Amount, SignedAmount};
pub use self::chain::ChainSource;
pub use self::device::{AccountDiscovery, HardwareDevice};
pub use self::error::Error;
pub use self::fees::FeeSchedule;
pub use self::rewards::{KomodoRewards, RewardFormula};
pub use self::scan::{
    RewardScanner, RewardScannerBuilder, ScanOutcome, ScanView, Step, StepStatus, StepView,
    WorkflowState,
};
pub use self::settings::{ScanSettings, Settings};
pub use self::sink::{RewardData, RewardDataSink};
pub use self::types::{Account, RewardAccount, Utxo};

/// Returns early with an error if a condition is not satisfied
#[macro_export]
macro_rules! ensure_kmd {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
}
