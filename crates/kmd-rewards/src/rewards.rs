//! Reward formula
//!
//! Komodo pays "active user rewards" on unspent outputs of at least 10 KMD.
//! Rewards accrue per minute since the transaction locktime and are only
//! paid out when the output is spent by a transaction that sets its own
//! locktime.

use crate::amount::{Amount, COIN};
use crate::types::Utxo;

/// Height after which no more rewards accrue
pub const KOMODO_ENDOFERA: u64 = 7_777_777;
/// Locktimes below this value are block heights, not timestamps
pub const LOCKTIME_THRESHOLD: u64 = 500_000_000;
/// Smallest output that accrues rewards
pub const MIN_SATOSHIS: u64 = 10 * COIN;
/// Height from which the accrual period is capped at one month
pub const ONE_MONTH_CAP_HARDFORK: u64 = 1_000_000;
/// Minutes in an hour
pub const ONE_HOUR: u64 = 60;
/// Minutes in the one month cap
pub const ONE_MONTH: u64 = 31 * 24 * 60;
/// Minutes in the one year cap
pub const ONE_YEAR: u64 = 365 * 24 * 60;
/// Satoshis per unit of reward per minute (5% yearly)
pub const DEVISOR: u64 = 10_512_000;

/// Reward accrued by a single unspent output
pub trait RewardFormula: Send + Sync {
    /// Reward of `utxo` at `tip_time`. Must be total and non-negative.
    fn reward(&self, utxo: &Utxo, tip_time: u64) -> Amount;
}

impl<F> RewardFormula for F
where
    F: Fn(&Utxo, u64) -> Amount + Send + Sync,
{
    fn reward(&self, utxo: &Utxo, tip_time: u64) -> Amount {
        self(utxo, tip_time)
    }
}

/// Komodo consensus reward formula
#[derive(Debug, Default, Clone, Copy)]
pub struct KomodoRewards;

impl RewardFormula for KomodoRewards {
    fn reward(&self, utxo: &Utxo, tip_time: u64) -> Amount {
        let satoshis = u64::from(utxo.satoshis);

        if utxo.height >= KOMODO_ENDOFERA
            || utxo.locktime < LOCKTIME_THRESHOLD
            || satoshis < MIN_SATOSHIS
            || tip_time <= utxo.locktime
        {
            return Amount::ZERO;
        }

        let minutes = (tip_time - utxo.locktime) / 60;
        if minutes < ONE_HOUR {
            return Amount::ZERO;
        }

        let cap = if utxo.height >= ONE_MONTH_CAP_HARDFORK {
            ONE_MONTH
        } else {
            ONE_YEAR
        };

        // Consensus code drops the first 59 minutes
        let minutes = minutes.min(cap) - 59;

        Amount::from((satoshis / DEVISOR).saturating_mul(minutes))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bitcoin::Txid;

    use super::*;

    const LOCKTIME: u64 = 1_600_000_000;

    fn utxo(satoshis: u64, height: u64, locktime: u64) -> Utxo {
        Utxo {
            txid: Txid::from_str(
                "0000000000000000000000000000000000000000000000000000000000000001",
            )
            .unwrap(),
            vout: 0,
            address: "RXL3YXG2ceaB6C5hfJcN4fvmLH2C34knhA".to_string(),
            satoshis: Amount::from(satoshis),
            height,
            locktime,
        }
    }

    #[test]
    fn test_reward_one_hour() {
        let output = utxo(100 * COIN, 1_500_000, LOCKTIME);
        // 60 minutes elapsed, 59 removed
        let reward = KomodoRewards.reward(&output, LOCKTIME + 3600);
        assert_eq!(reward, Amount::from(100 * COIN / DEVISOR));
    }

    #[test]
    fn test_reward_below_one_hour_is_zero() {
        let output = utxo(100 * COIN, 1_500_000, LOCKTIME);
        assert_eq!(KomodoRewards.reward(&output, LOCKTIME + 3599), Amount::ZERO);
    }

    #[test]
    fn test_reward_capped_at_one_month_after_hardfork() {
        let output = utxo(1000 * COIN, 1_500_000, LOCKTIME);
        let one_month = KomodoRewards.reward(&output, LOCKTIME + ONE_MONTH * 60);
        let one_year = KomodoRewards.reward(&output, LOCKTIME + ONE_YEAR * 60);
        assert_eq!(one_month, one_year);
        assert_eq!(
            one_month,
            Amount::from(1000 * COIN / DEVISOR * (ONE_MONTH - 59))
        );
    }

    #[test]
    fn test_reward_capped_at_one_year_before_hardfork() {
        let output = utxo(1000 * COIN, 900_000, LOCKTIME);
        let reward = KomodoRewards.reward(&output, LOCKTIME + 2 * ONE_YEAR * 60);
        assert_eq!(reward, Amount::from(1000 * COIN / DEVISOR * (ONE_YEAR - 59)));
    }

    #[test]
    fn test_no_reward_outside_rules() {
        // Too small
        let small = utxo(MIN_SATOSHIS - 1, 1_500_000, LOCKTIME);
        assert_eq!(KomodoRewards.reward(&small, LOCKTIME + 86_400), Amount::ZERO);

        // Locktime not set
        let unlocked = utxo(100 * COIN, 1_500_000, 0);
        assert_eq!(KomodoRewards.reward(&unlocked, LOCKTIME), Amount::ZERO);

        // End of era
        let late = utxo(100 * COIN, KOMODO_ENDOFERA, LOCKTIME);
        assert_eq!(KomodoRewards.reward(&late, LOCKTIME + 86_400), Amount::ZERO);

        // Tip before locktime
        let future = utxo(100 * COIN, 1_500_000, LOCKTIME);
        assert_eq!(KomodoRewards.reward(&future, LOCKTIME - 1), Amount::ZERO);
    }

    #[test]
    fn test_reward_monotonic_in_time() {
        let output = utxo(50 * COIN, 1_500_000, LOCKTIME);
        let mut last = Amount::ZERO;
        for hours in 0..(24 * 40) {
            let reward = KomodoRewards.reward(&output, LOCKTIME + hours * 3600);
            assert!(reward >= last);
            last = reward;
        }
    }

    #[test]
    fn test_closure_formula() {
        let fixed = |_: &Utxo, _: u64| Amount::from(5000);
        let output = utxo(COIN, 1, 1);
        assert_eq!(fixed.reward(&output, 0), Amount::from(5000));
    }
}
