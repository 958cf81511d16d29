//! Reward aggregation over discovered accounts

use tracing::instrument;

use crate::amount::Amount;
use crate::fees::FeeSchedule;
use crate::rewards::RewardFormula;
use crate::types::{Account, RewardAccount};

/// Compute balance, rewards and fees for each account.
///
/// Accounts keep their discovery order. The claimable amount is not
/// clamped: a negative value means claiming costs more than it yields.
#[instrument(skip_all, fields(accounts = accounts.len(), tip_time = tip_time))]
pub fn calculate_reward_data(
    accounts: Vec<Account>,
    tip_time: u64,
    formula: &dyn RewardFormula,
    fees: &FeeSchedule,
) -> Vec<RewardAccount> {
    accounts
        .into_iter()
        .map(|account| {
            let balance: Amount = account.utxos.iter().map(|utxo| utxo.satoshis).sum();
            let rewards: Amount = account
                .utxos
                .iter()
                .map(|utxo| formula.reward(utxo, tip_time))
                .sum();
            let service_fee = fees.service_fee(rewards);
            let claimable_amount = fees.claimable(rewards, service_fee);

            tracing::debug!(
                "Account {}: balance {} rewards {} service fee {} claimable {}",
                account.account_index,
                balance,
                rewards,
                service_fee,
                claimable_amount
            );

            RewardAccount {
                account,
                balance,
                rewards,
                service_fee,
                claimable_amount,
            }
        })
        .collect()
}
