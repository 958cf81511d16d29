//! Hardware device collaborators
//!
//! The device transport and the account discovery procedure live outside
//! this crate. Implementors map their own failures into
//! [`Error::Transport`] and [`Error::Discovery`].

use async_trait::async_trait;

use crate::types::Account;
use crate::Error;

/// Hardware wallet connected to the host
#[async_trait]
pub trait HardwareDevice: Send + Sync {
    /// Whether the device is connected, unlocked and has the Komodo app open
    async fn is_available(&self) -> Result<bool, Error>;
}

/// Enumerates the accounts derived from the device
///
/// Discovery asks the device to export one public key per account, which
/// the user has to approve on the device.
#[async_trait]
pub trait AccountDiscovery: Send + Sync {
    /// Discover accounts and their unspent outputs, in derivation order
    async fn discover_accounts(&self) -> Result<Vec<Account>, Error>;
}
