//! Amounts
//!
//! All amounts are in satoshis (1 KMD = 100_000_000 satoshis).

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

use serde::{Deserialize, Serialize};

/// Number of satoshis in one KMD
pub const COIN: u64 = 100_000_000;

/// Non-negative amount in satoshis
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    /// Amount zero
    pub const ZERO: Amount = Amount(0);

    /// Checked addition. Returns `None` on overflow.
    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Checked subtraction. Returns `None` if `other` is larger than `self`.
    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    /// Saturating addition
    pub fn saturating_add(self, other: Amount) -> Amount {
        Amount(self.0.saturating_add(other.0))
    }

    /// Amount as a signed value, saturating at `i64::MAX`
    pub fn to_signed(self) -> SignedAmount {
        SignedAmount(i64::try_from(self.0).unwrap_or(i64::MAX))
    }

    /// Amount in whole KMD, for display
    pub fn to_kmd(self) -> f64 {
        self.0 as f64 / COIN as f64
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Amount> for u64 {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        *self = self.saturating_add(rhs);
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Signed amount in satoshis
///
/// Used for values that can legitimately go below zero, such as the
/// claimable amount of an account whose rewards don't cover the fees.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SignedAmount(i64);

impl SignedAmount {
    /// Signed amount zero
    pub const ZERO: SignedAmount = SignedAmount(0);

    /// Whether the amount is strictly positive
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Whether the amount is strictly negative
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Positive part of the amount, zero otherwise
    pub fn positive_part(self) -> Amount {
        Amount(u64::try_from(self.0).unwrap_or(0))
    }
}

impl From<i64> for SignedAmount {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<SignedAmount> for i64 {
    fn from(value: SignedAmount) -> Self {
        value.0
    }
}

impl fmt::Display for SignedAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Sub<Amount> for SignedAmount {
    type Output = SignedAmount;

    fn sub(self, rhs: Amount) -> Self::Output {
        SignedAmount(self.0.saturating_sub(rhs.to_signed().0))
    }
}
