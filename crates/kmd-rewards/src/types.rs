//! Account types

use bitcoin::Txid;
use serde::{Deserialize, Serialize};

use crate::amount::{Amount, SignedAmount};

/// Unspent transaction output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    /// Transaction id
    pub txid: Txid,
    /// Output index
    pub vout: u32,
    /// Address holding the output
    pub address: String,
    /// Value in satoshis
    pub satoshis: Amount,
    /// Block height the output was confirmed at
    pub height: u64,
    /// Locktime of the transaction (unix seconds)
    pub locktime: u64,
}

/// Account discovered on the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// BIP44 account index
    pub account_index: u32,
    /// Extended public key exported from the device
    pub xpub: String,
    /// Used addresses of the account
    pub addresses: Vec<String>,
    /// Unspent outputs in discovery order
    pub utxos: Vec<Utxo>,
}

/// Account with its computed reward figures
///
/// Only produced by [`crate::calculate_reward_data`], so the derived fields
/// always satisfy
/// `claimable_amount == rewards - service_fee - tx_fee`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardAccount {
    /// Discovered account
    #[serde(flatten)]
    pub account: Account,
    /// Sum of all unspent outputs
    pub balance: Amount,
    /// Accrued rewards of all unspent outputs
    pub rewards: Amount,
    /// Service fee taken from the rewards
    pub service_fee: Amount,
    /// Rewards left after service fee and transaction fee
    pub claimable_amount: SignedAmount,
}

impl RewardAccount {
    /// Whether claiming this account yields anything
    pub fn is_claimable(&self) -> bool {
        self.claimable_amount.is_positive()
    }
}
