//! Treasury and custody
//!
//! Owner withdrawals and recoveries, plus the open forwarding sweep that
//! moves every held token and collectible to the fixed destination.
//! Currency never leaves through forwarding.

use serde::{Deserialize, Serialize};
use tracing::{error, info};
use types::ids::{Address, CollectibleId};
use types::numeric::Amount;

use crate::assets::{Collectible, CurrencyRail, FungibleToken};
use crate::errors::{AssetError, BuybackError};
use crate::events::{
    BuybackEvent, CollectibleRecovered, CurrencyWithdrawn, ForwardedToDestination,
    FungibleRecovered,
};
use crate::ledger::Buyback;

/// Assets moved by a forwarding sweep
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forwarded {
    pub fungible_amount: Amount,
    pub collectible_ids: Vec<CollectibleId>,
}

impl Buyback {
    // ───────────────────────── Custody reads ─────────────────────────

    /// Reserve available for payouts
    pub fn currency_balance(&self, currency: &dyn CurrencyRail) -> Amount {
        currency.balance_of(&self.address)
    }

    /// Token balance held by the ledger
    pub fn custody_token_balance(&self, token: &dyn FungibleToken) -> Amount {
        token.balance_of(&self.address)
    }

    /// Collectibles held by the ledger, ascending by id
    pub fn custody_collectibles(&self, collectible: &dyn Collectible) -> Vec<CollectibleId> {
        collectible.tokens_of(&self.address)
    }

    // ───────────────────────── Owner operations ─────────────────────────

    /// Owner-only. Pay `amount` of the reserve to the owner.
    pub fn withdraw_currency(
        &mut self,
        currency: &mut dyn CurrencyRail,
        caller: &Address,
        amount: Amount,
    ) -> Result<(), BuybackError> {
        self.ownership.ensure_owner(caller)?;
        let available = currency.balance_of(&self.address);
        if amount > available {
            return Err(BuybackError::InsufficientBalance {
                asset: "currency".to_string(),
                required: amount,
                available,
            });
        }

        let owner = self.ownership.owner();
        currency.transfer(&self.address, &owner, amount)?;
        info!(to = %owner, amount = %amount, "Currency withdrawn");
        self.push_event(BuybackEvent::CurrencyWithdrawn(CurrencyWithdrawn {
            to: owner,
            amount,
        }));
        Ok(())
    }

    /// Owner-only. Send `amount` of any token the ledger holds to the owner.
    pub fn recover_fungible(
        &mut self,
        token: &mut dyn FungibleToken,
        caller: &Address,
        amount: Amount,
    ) -> Result<(), BuybackError> {
        self.ownership.ensure_owner(caller)?;
        let held = token.balance_of(&self.address);
        if amount > held {
            return Err(BuybackError::InsufficientBalance {
                asset: format!("token {}", token.address()),
                required: amount,
                available: held,
            });
        }

        let owner = self.ownership.owner();
        token.transfer(&self.address, &owner, amount)?;
        info!(token = %token.address(), to = %owner, amount = %amount, "Tokens recovered");
        self.push_event(BuybackEvent::FungibleRecovered(FungibleRecovered {
            token: token.address(),
            to: owner,
            amount,
        }));
        Ok(())
    }

    /// Owner-only. Send one held collectible, from any collection, to the owner.
    pub fn recover_collectible(
        &mut self,
        collectible: &mut dyn Collectible,
        caller: &Address,
        id: CollectibleId,
    ) -> Result<(), BuybackError> {
        self.ownership.ensure_owner(caller)?;
        if collectible.owner_of(id) != Some(self.address) {
            return Err(BuybackError::CollectibleNotHeld { id });
        }

        let owner = self.ownership.owner();
        collectible.transfer_from(&self.address, &self.address, &owner, id)?;
        info!(
            collection = %collectible.address(),
            collectible_id = %id,
            to = %owner,
            "Collectible recovered"
        );
        self.push_event(BuybackEvent::CollectibleRecovered(CollectibleRecovered {
            collection: collectible.address(),
            to: owner,
            collectible_id: id,
        }));
        Ok(())
    }

    // ───────────────────────── Forwarding ─────────────────────────

    /// Sweep every held collectible, then the whole token balance, to the
    /// destination. Open to any caller.
    ///
    /// The destination's token credit is checked before anything moves.
    /// Transfers that reached the destination cannot be pulled back, so a
    /// rail failure partway returns [`BuybackError::ForwardingInterrupted`]
    /// with what already moved, recorded as a forwarding event. Calling
    /// again forwards the remainder.
    pub fn forward_to_destination(
        &mut self,
        token: &mut dyn FungibleToken,
        collectible: &mut dyn Collectible,
    ) -> Result<Forwarded, BuybackError> {
        self.ensure_token(&*token)?;
        self.ensure_collectible(&*collectible)?;

        let fungible_amount = token.balance_of(&self.address);
        let collectible_ids = collectible.tokens_of(&self.address);
        if fungible_amount == 0 && collectible_ids.is_empty() {
            return Err(BuybackError::NothingToSend);
        }

        let destination = self.destination;
        if token
            .balance_of(&destination)
            .checked_add(fungible_amount)
            .is_none()
        {
            return Err(AssetError::Overflow.into());
        }

        let mut moved = Forwarded {
            fungible_amount: 0,
            collectible_ids: Vec::with_capacity(collectible_ids.len()),
        };
        for id in &collectible_ids {
            let result = collectible.transfer_from(&self.address, &self.address, &destination, *id);
            if let Err(err) = result {
                return Err(self.interrupt_forwarding(moved, err, Some(*id)));
            }
            moved.collectible_ids.push(*id);
        }
        if fungible_amount > 0 {
            if let Err(err) = token.transfer(&self.address, &destination, fungible_amount) {
                return Err(self.interrupt_forwarding(moved, err, None));
            }
            moved.fungible_amount = fungible_amount;
        }

        info!(
            destination = %destination,
            fungible_amount = %fungible_amount,
            collectibles = moved.collectible_ids.len(),
            "Custody forwarded"
        );
        self.record_forwarded(&moved);
        Ok(moved)
    }

    fn interrupt_forwarding(
        &mut self,
        moved: Forwarded,
        error: AssetError,
        collectible_id: Option<CollectibleId>,
    ) -> BuybackError {
        error!(
            destination = %self.destination,
            collectible_id = ?collectible_id,
            moved_collectibles = moved.collectible_ids.len(),
            error = %error,
            "Forwarding interrupted"
        );
        if !moved.collectible_ids.is_empty() {
            self.record_forwarded(&moved);
        }
        BuybackError::ForwardingInterrupted {
            forwarded: moved,
            error,
        }
    }

    fn record_forwarded(&mut self, moved: &Forwarded) {
        self.push_event(BuybackEvent::ForwardedToDestination(ForwardedToDestination {
            destination: self.destination,
            fungible_amount: moved.fungible_amount,
            collectible_ids: moved.collectible_ids.clone(),
        }));
    }
}
