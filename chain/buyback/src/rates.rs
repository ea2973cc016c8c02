//! Exchange Rate Engine
//!
//! The owner sets what one collectible is worth in currency; the per-unit
//! fungible rate is always derived from it and never set on its own.

use serde::{Deserialize, Serialize};
use types::numeric::{mul_div, pow10, Amount};

use crate::errors::BuybackError;

/// How many whole fungible tokens redeem for the value of one collectible
pub const FUNGIBLE_PER_COLLECTIBLE: Amount = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRates {
    /// Currency paid for one collectible
    collectible_rate: Amount,
    /// Currency paid per whole fungible token (`collectible_rate / 5000`)
    fungible_rate: Amount,
    /// `10^token_decimals`
    token_unit: Amount,
    token_decimals: u8,
}

impl ExchangeRates {
    /// Errors with [`BuybackError::Overflow`] if `10^token_decimals` does not fit.
    pub fn new(token_decimals: u8, collectible_rate: Amount) -> Result<Self, BuybackError> {
        let token_unit = pow10(token_decimals).ok_or(BuybackError::Overflow)?;
        Ok(Self {
            collectible_rate,
            fungible_rate: collectible_rate / FUNGIBLE_PER_COLLECTIBLE,
            token_unit,
            token_decimals,
        })
    }

    /// Store the collectible rate and re-derive the fungible rate in one step.
    ///
    /// Returns the previous collectible rate.
    pub fn set_collectible_rate(&mut self, amount: Amount) -> Amount {
        let previous = self.collectible_rate;
        self.collectible_rate = amount;
        self.fungible_rate = amount / FUNGIBLE_PER_COLLECTIBLE;
        previous
    }

    pub fn collectible_rate(&self) -> Amount {
        self.collectible_rate
    }

    pub fn fungible_rate(&self) -> Amount {
        self.fungible_rate
    }

    pub fn token_decimals(&self) -> u8 {
        self.token_decimals
    }

    /// Currency owed for `base_units` of the fungible token.
    ///
    /// `base_units * fungible_rate / 10^decimals`, multiplied first.
    pub fn fungible_payout(&self, base_units: Amount) -> Result<Amount, BuybackError> {
        mul_div(base_units, self.fungible_rate, self.token_unit).ok_or(BuybackError::Overflow)
    }

    /// Currency owed for one collectible
    pub fn collectible_payout(&self) -> Amount {
        self.collectible_rate
    }
}
