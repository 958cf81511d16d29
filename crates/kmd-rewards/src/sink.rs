//! Scan results and where they are published

use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::types::RewardAccount;
use crate::Error;

/// Result of a reward scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardData {
    /// Accounts with computed rewards, in discovery order
    pub accounts: Vec<RewardAccount>,
    /// Chain tip time the rewards were computed at
    pub tip_time: Option<u64>,
}

impl RewardData {
    /// Empty result, published to clear previous results
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether there are no accounts
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Sum of all account balances
    pub fn total_balance(&self) -> Amount {
        self.accounts.iter().map(|a| a.balance).sum()
    }

    /// Sum of all accrued rewards before fees
    pub fn total_rewards(&self) -> Amount {
        self.accounts.iter().map(|a| a.rewards).sum()
    }

    /// Sum of what can be claimed, ignoring accounts not worth claiming
    pub fn total_claimable(&self) -> Amount {
        self.accounts
            .iter()
            .map(|a| a.claimable_amount.positive_part())
            .sum()
    }

    /// Accounts worth claiming
    pub fn claimable_accounts(&self) -> impl Iterator<Item = &RewardAccount> {
        self.accounts.iter().filter(|a| a.is_claimable())
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Receives published scan results
///
/// Each call replaces whatever was published before. A run publishes an
/// empty result when it starts and the final result on success.
pub trait RewardDataSink: Send + Sync {
    /// Handle published reward data
    fn handle_reward_data(&self, data: RewardData);
}

impl<F> RewardDataSink for F
where
    F: Fn(RewardData) + Send + Sync,
{
    fn handle_reward_data(&self, data: RewardData) {
        self(data)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Mutex;

    use bitcoin::Txid;

    use super::*;
    use crate::amount::SignedAmount;
    use crate::types::{Account, Utxo};

    fn reward_account(index: u32, rewards: u64, claimable: i64) -> RewardAccount {
        RewardAccount {
            account: Account {
                account_index: index,
                xpub: "xpub".to_string(),
                addresses: vec!["RXL3YXG2ceaB6C5hfJcN4fvmLH2C34knhA".to_string()],
                utxos: vec![Utxo {
                    txid: Txid::from_str(
                        "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b",
                    )
                    .unwrap(),
                    vout: 0,
                    address: "RXL3YXG2ceaB6C5hfJcN4fvmLH2C34knhA".to_string(),
                    satoshis: Amount::from(1_000_000),
                    height: 1_500_000,
                    locktime: 1_600_000_000,
                }],
            },
            balance: Amount::from(1_000_000),
            rewards: Amount::from(rewards),
            service_fee: Amount::ZERO,
            claimable_amount: SignedAmount::from(claimable),
        }
    }

    #[test]
    fn test_totals_skip_negative_claimable() {
        let data = RewardData {
            accounts: vec![reward_account(0, 0, -100), reward_account(1, 500, 350)],
            tip_time: Some(1_600_000_000),
        };

        assert_eq!(data.total_balance(), Amount::from(2_000_000));
        assert_eq!(data.total_rewards(), Amount::from(500));
        assert_eq!(data.total_claimable(), Amount::from(350));
        assert_eq!(data.claimable_accounts().count(), 1);
    }

    #[test]
    fn test_empty() {
        let data = RewardData::empty();
        assert!(data.is_empty());
        assert_eq!(data.tip_time, None);
        assert_eq!(data.total_claimable(), Amount::ZERO);
    }

    #[test]
    fn test_json_flattens_account() {
        let data = RewardData {
            accounts: vec![reward_account(4, 500, 350)],
            tip_time: Some(1_600_000_000),
        };
        let json: serde_json::Value = serde_json::from_str(&data.to_json().unwrap()).unwrap();

        assert_eq!(json["tip_time"], 1_600_000_000u64);
        assert_eq!(json["accounts"][0]["account_index"], 4);
        assert_eq!(json["accounts"][0]["claimable_amount"], 350);

        let back: RewardData = serde_json::from_value(json).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_closure_sink() {
        let published = Mutex::new(Vec::new());
        let sink = |data: RewardData| published.lock().unwrap().push(data);

        sink.handle_reward_data(RewardData::empty());
        sink.handle_reward_data(RewardData::empty());

        assert_eq!(published.lock().unwrap().len(), 2);
    }
}
