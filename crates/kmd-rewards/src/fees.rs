//! Fee schedule

use serde::{Deserialize, Serialize};

use crate::amount::{Amount, SignedAmount};
use crate::{ensure_kmd, Error};

/// Default service fee percentage
pub const SERVICE_FEE_PERCENT: u64 = 5;

/// Default fee of the claim transaction, in satoshis
pub const TX_FEE: u64 = 20_000;

/// Fees subtracted from the accrued rewards of each account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    /// Percentage of the rewards taken as service fee
    pub service_fee_percent: u64,
    /// Fixed transaction fee, taken once per account
    pub tx_fee: Amount,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            service_fee_percent: SERVICE_FEE_PERCENT,
            tx_fee: Amount::from(TX_FEE),
        }
    }
}

impl FeeSchedule {
    /// Create a new [`FeeSchedule`]
    pub fn new(service_fee_percent: u64, tx_fee: Amount) -> Self {
        Self {
            service_fee_percent,
            tx_fee,
        }
    }

    /// Check the schedule is usable
    pub fn validate(&self) -> Result<(), Error> {
        ensure_kmd!(
            self.service_fee_percent <= 100,
            Error::InvalidFeeSchedule(format!(
                "service fee of {}% exceeds 100%",
                self.service_fee_percent
            ))
        );
        Ok(())
    }

    /// Service fee for the given rewards, rounded down
    pub fn service_fee(&self, rewards: Amount) -> Amount {
        let fee = u128::from(u64::from(rewards)) * u128::from(self.service_fee_percent) / 100;
        Amount::from(u64::try_from(fee).unwrap_or(u64::MAX))
    }

    /// Rewards left after both fees. May be negative.
    pub fn claimable(&self, rewards: Amount, service_fee: Amount) -> SignedAmount {
        rewards.to_signed() - service_fee - self.tx_fee
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_fee_rounds_down() {
        let fees = FeeSchedule::new(20, Amount::from(1000));
        assert_eq!(fees.service_fee(Amount::from(5000)), Amount::from(1000));
        assert_eq!(fees.service_fee(Amount::from(4)), Amount::ZERO);
        assert_eq!(fees.service_fee(Amount::from(9)), Amount::from(1));
    }

    #[test]
    fn test_service_fee_does_not_overflow() {
        let fees = FeeSchedule::new(100, Amount::ZERO);
        assert_eq!(
            fees.service_fee(Amount::from(u64::MAX)),
            Amount::from(u64::MAX)
        );
    }

    #[test]
    fn test_claimable_is_not_clamped() {
        let fees = FeeSchedule::new(10, Amount::from(100));
        assert_eq!(
            fees.claimable(Amount::ZERO, Amount::ZERO),
            SignedAmount::from(-100)
        );
        assert_eq!(
            fees.claimable(Amount::from(500), Amount::from(50)),
            SignedAmount::from(350)
        );
    }

    #[test]
    fn test_validate() {
        assert!(FeeSchedule::default().validate().is_ok());
        assert!(FeeSchedule::new(100, Amount::ZERO).validate().is_ok());
        assert!(matches!(
            FeeSchedule::new(101, Amount::ZERO).validate(),
            Err(Error::InvalidFeeSchedule(_))
        ));
    }
}
