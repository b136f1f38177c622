//! Fixed-scale token amounts.
//!
//! Every balance, supply counter and UTXO value is an unsigned integer count
//! of **base units**. Human-facing amounts are scaled by
//! [`BASE_UNIT`](crate::constants::BASE_UNIT) (10^8), so `1.5` tokens is
//! `150_000_000` base units.
//!
//! The backing integer is 256 bits wide; arithmetic is always checked and
//! never wraps. On the wire and in the store, amounts are base-10 strings.

use std::fmt;
use std::str::FromStr;

use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::{BASE_UNIT, BASE_UNIT_SCALE};
use crate::{LedgerError, LedgerResult};

/// Non-negative token amount in base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Amount(U256);

impl Amount {
    pub const ZERO: Self = Self(U256([0; 4]));

    #[must_use]
    pub fn from_base_units(units: u64) -> Self {
        Self(U256::from(units))
    }

    /// Convert a display amount (e.g. `12.5`) into base units.
    ///
    /// Rejects negative values and values with more than
    /// [`BASE_UNIT_SCALE`] fractional digits.
    pub fn from_display(value: Decimal) -> LedgerResult<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(LedgerError::InvalidAmount {
                reason: format!("negative amount {value}"),
            });
        }
        let mut scaled = value
            .checked_mul(Decimal::from(BASE_UNIT))
            .ok_or(LedgerError::AmountOverflow)?;
        if !scaled.fract().is_zero() {
            return Err(LedgerError::InvalidAmount {
                reason: format!("{value} has more than {BASE_UNIT_SCALE} decimal places"),
            });
        }
        scaled.rescale(0);
        let units = u128::try_from(scaled.mantissa()).map_err(|_| LedgerError::InvalidAmount {
            reason: format!("negative amount {value}"),
        })?;
        Ok(Self(U256::from(units)))
    }

    /// Display value (`base units / 10^8`).
    ///
    /// Fails with [`LedgerError::AmountOverflow`] when the amount exceeds what
    /// a 96-bit decimal mantissa can hold.
    pub fn to_display(&self) -> LedgerResult<Decimal> {
        if self.0 > U256::from(u128::MAX) {
            return Err(LedgerError::AmountOverflow);
        }
        let units = i128::try_from(self.0.as_u128()).map_err(|_| LedgerError::AmountOverflow)?;
        Decimal::try_from_i128_with_scale(units, BASE_UNIT_SCALE)
            .map_err(|_| LedgerError::AmountOverflow)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// `None` when `rhs > self`.
    #[must_use]
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    #[must_use]
    pub fn checked_mul_u64(self, factor: u64) -> Option<Self> {
        self.0.checked_mul(U256::from(factor)).map(Self)
    }

    /// Add, mapping overflow to [`LedgerError::AmountOverflow`].
    pub fn try_add(self, rhs: Self) -> LedgerResult<Self> {
        self.checked_add(rhs).ok_or(LedgerError::AmountOverflow)
    }

    /// Sum an iterator of amounts with overflow checking.
    pub fn try_sum<I>(amounts: I) -> LedgerResult<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        amounts
            .into_iter()
            .try_fold(Self::ZERO, |acc, amount| acc.try_add(amount))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LedgerError::InvalidAmount {
                reason: format!("'{s}' is not a base-10 unsigned integer"),
            });
        }
        U256::from_dec_str(trimmed)
            .map(Self)
            .map_err(|_| LedgerError::AmountOverflow)
    }
}

impl From<u64> for Amount {
    fn from(units: u64) -> Self {
        Self::from_base_units(units)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
