//! Serialized multi-threaded access
//!
//! A [`Deployment`] is a ledger together with the rails it drives.
//! [`SharedBuyback`] puts the whole deployment behind one mutex, so every
//! operation, including its asset transfers, runs to completion before the
//! next one starts.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use types::ids::{Address, CollectibleId};
use types::numeric::Amount;

use crate::assets::{Collectible, CurrencyRail, FungibleToken};
use crate::errors::BuybackError;
use crate::ledger::{Buyback, SwapReceipt};
use crate::swaps::SwapState;
use crate::treasury::Forwarded;

/// A ledger and the rails it drives
#[derive(Debug)]
pub struct Deployment<T, C, R> {
    pub ledger: Buyback,
    pub token: T,
    pub collectible: C,
    pub currency: R,
}

/// Cloneable handle onto a mutex-guarded [`Deployment`]
#[derive(Debug)]
pub struct SharedBuyback<T, C, R> {
    inner: Arc<Mutex<Deployment<T, C, R>>>,
}

impl<T, C, R> Clone for SharedBuyback<T, C, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, C, R> SharedBuyback<T, C, R>
where
    T: FungibleToken,
    C: Collectible,
    R: CurrencyRail,
{
    pub fn new(deployment: Deployment<T, C, R>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(deployment)),
        }
    }

    // Poison is ignored: a swap only commits after its transfers succeed.
    fn lock(&self) -> MutexGuard<'_, Deployment<T, C, R>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the deployment.
    pub fn with<F, O>(&self, f: F) -> O
    where
        F: FnOnce(&mut Deployment<T, C, R>) -> O,
    {
        let mut guard = self.lock();
        f(&mut guard)
    }

    pub fn swap_fungible_for_currency(
        &self,
        caller: &Address,
        amount: Amount,
    ) -> Result<SwapReceipt, BuybackError> {
        self.with(|d| {
            d.ledger
                .swap_fungible_for_currency(&mut d.token, &mut d.currency, caller, amount)
        })
    }

    pub fn swap_collectible_for_currency(
        &self,
        caller: &Address,
        id: CollectibleId,
    ) -> Result<SwapReceipt, BuybackError> {
        self.with(|d| {
            d.ledger
                .swap_collectible_for_currency(&mut d.collectible, &mut d.currency, caller, id)
        })
    }

    pub fn withdraw_currency(&self, caller: &Address, amount: Amount) -> Result<(), BuybackError> {
        self.with(|d| d.ledger.withdraw_currency(&mut d.currency, caller, amount))
    }

    pub fn forward_to_destination(&self) -> Result<Forwarded, BuybackError> {
        self.with(|d| {
            d.ledger
                .forward_to_destination(&mut d.token, &mut d.collectible)
        })
    }

    pub fn swap_state_of(&self, participant: &Address) -> SwapState {
        self.with(|d| d.ledger.swap_state_of(participant))
    }

    pub fn currency_balance(&self) -> Amount {
        self.with(|d| d.ledger.currency_balance(&d.currency))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{MemoryCollectible, MemoryCurrency, MemoryToken};
    use crate::config::BuybackConfig;
    use std::thread;

    #[test]
    fn test_handle_clones_share_state() {
        let owner = Address::repeat_byte(0x01);
        let user = Address::repeat_byte(0xa1);
        let token = MemoryToken::new(Address::repeat_byte(0x70));
        let collectible = MemoryCollectible::new(Address::repeat_byte(0x71));
        let config = BuybackConfig::new(
            Address::repeat_byte(0x0b),
            owner,
            token.address(),
            collectible.address(),
            0,
        )
        .with_collectible_rate(5000)
        .with_allowlist(vec![user]);
        let ledger = Buyback::new(config).unwrap();
        let mut currency = MemoryCurrency::new();
        currency.fund(&ledger.address(), 100).unwrap();

        let shared = SharedBuyback::new(Deployment {
            ledger,
            token,
            collectible,
            currency,
        });
        shared.with(|d| {
            let spender = d.ledger.address();
            d.token.mint(&user, 10).unwrap();
            d.token.approve(&user, &spender, 10);
        });

        let handle = shared.clone();
        let receipt = thread::spawn(move || handle.swap_fungible_for_currency(&user, 10))
            .join()
            .unwrap()
            .unwrap();

        assert_eq!(receipt.payout, 10);
        assert_eq!(shared.swap_state_of(&user), SwapState::SwappedFungible);
        assert_eq!(shared.currency_balance(), 90);
    }
}
