//! Buyback ledger
//!
//! The [`Buyback`] state object owns the allowlist, the exchange rates, the
//! per-participant swap records and the event log. It does not own the
//! assets: every operation that moves value takes the rails it drives as
//! arguments and reads custody back from them.
//!
//! Both swap paths follow the same shape:
//! 1. Validate the rails, the caller and the amount
//! 2. Reserve the participant's one-time swap
//! 3. Take custody, then pay out
//! 4. Commit the reservation, or release it and undo any transfer already made

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use types::ids::{Address, CollectibleId};
use types::numeric::Amount;
use uuid::Uuid;

use crate::allowlist::Allowlist;
use crate::assets::{Collectible, CollectibleReceiver, CurrencyRail, FungibleToken};
use crate::config::BuybackConfig;
use crate::errors::{AssetError, BuybackError, ConfigError};
use crate::events::{
    AllowlistUpdated, BuybackEvent, CollectibleSwapped, CurrencyReceived, FungibleSwapped,
    OwnershipTransferred, RatesUpdated,
};
use crate::rates::ExchangeRates;
use crate::security::{DepositGate, Ownership};
use crate::swaps::{SwapKind, SwapLedger, SwapState};

/// What a participant handed over in a swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Redeemed {
    /// Fungible base units
    Tokens(Amount),
    Collectible(CollectibleId),
}

/// Proof of a completed swap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapReceipt {
    pub receipt_id: Uuid,
    pub participant: Address,
    pub redeemed: Redeemed,
    /// Currency paid, smallest units
    pub payout: Amount,
}

impl SwapReceipt {
    pub fn kind(&self) -> SwapKind {
        match self.redeemed {
            Redeemed::Tokens(_) => SwapKind::Fungible,
            Redeemed::Collectible(_) => SwapKind::Collectible,
        }
    }
}

/// Allowlisted one-time buyback ledger
#[derive(Debug)]
pub struct Buyback {
    pub(crate) address: Address,
    pub(crate) ownership: Ownership,
    pub(crate) token: Address,
    pub(crate) collectible: Address,
    pub(crate) destination: Address,
    allowlist: Allowlist,
    rates: ExchangeRates,
    swaps: SwapLedger,
    deposit_gate: DepositGate,
    /// Emitted events log (append-only)
    events: Vec<BuybackEvent>,
}

impl Buyback {
    /// Build a ledger from a validated configuration.
    pub fn new(config: BuybackConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rates = ExchangeRates::new(config.token_decimals, config.collectible_rate)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let allowlist = Allowlist::with_members(config.allowlist);

        info!(
            ledger = %config.ledger,
            owner = %config.owner,
            token = %config.token,
            collectible = %config.collectible,
            token_decimals = config.token_decimals,
            collectible_rate = %config.collectible_rate,
            allowlisted = allowlist.len(),
            "Buyback ledger created"
        );

        Ok(Self {
            address: config.ledger,
            ownership: Ownership::new(config.owner),
            token: config.token,
            collectible: config.collectible,
            destination: config.destination,
            allowlist,
            rates,
            swaps: SwapLedger::new(),
            deposit_gate: DepositGate::new(),
            events: Vec::new(),
        })
    }

    // ───────────────────────── Identity reads ─────────────────────────

    /// Identity custody is held under
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.ownership.owner()
    }

    pub fn token(&self) -> Address {
        self.token
    }

    pub fn collectible(&self) -> Address {
        self.collectible
    }

    pub fn token_decimals(&self) -> u8 {
        self.rates.token_decimals()
    }

    pub fn destination(&self) -> Address {
        self.destination
    }

    // ───────────────────────── Ownership ─────────────────────────

    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> Result<(), BuybackError> {
        let previous_owner = self.ownership.transfer(caller, new_owner)?;
        info!(previous_owner = %previous_owner, new_owner = %new_owner, "Ownership transferred");
        self.events
            .push(BuybackEvent::OwnershipTransferred(OwnershipTransferred {
                previous_owner,
                new_owner,
            }));
        Ok(())
    }

    // ───────────────────────── Allowlist ─────────────────────────

    pub fn is_allowlisted(&self, id: &Address) -> bool {
        self.allowlist.is_member(id)
    }

    /// Current members, ascending
    pub fn allowlist_members(&self) -> Vec<Address> {
        self.allowlist.members()
    }

    /// Owner-only. Returns `true` if `id` was not already a member.
    pub fn add_to_allowlist(
        &mut self,
        caller: &Address,
        id: Address,
    ) -> Result<bool, BuybackError> {
        self.ownership.ensure_owner(caller)?;
        let added = self.allowlist.add(id);
        if added {
            info!(participant = %id, "Allowlisted");
            self.record_allowlist_change(vec![id], Vec::new());
        }
        Ok(added)
    }

    /// Owner-only. Returns `true` if `id` was a member.
    pub fn remove_from_allowlist(
        &mut self,
        caller: &Address,
        id: &Address,
    ) -> Result<bool, BuybackError> {
        self.ownership.ensure_owner(caller)?;
        let removed = self.allowlist.remove(id);
        if removed {
            info!(participant = %id, "Removed from allowlist");
            self.record_allowlist_change(Vec::new(), vec![*id]);
        }
        Ok(removed)
    }

    /// Owner-only additive bulk set. Returns the number of new members.
    pub fn set_allowlist(
        &mut self,
        caller: &Address,
        ids: &[Address],
    ) -> Result<usize, BuybackError> {
        self.ownership.ensure_owner(caller)?;
        let added: Vec<Address> = ids
            .iter()
            .copied()
            .filter(|id| !self.allowlist.is_member(id))
            .collect();
        let count = self.allowlist.set_all(ids);
        info!(listed = ids.len(), added = count, "Allowlist set");

        if count > 0 {
            let mut added = added;
            added.sort();
            added.dedup();
            self.record_allowlist_change(added, Vec::new());
        }
        Ok(count)
    }

    /// Owner-only full reset. Returns the number of removed members.
    pub fn clear_allowlist(&mut self, caller: &Address) -> Result<usize, BuybackError> {
        self.ownership.ensure_owner(caller)?;
        let removed = self.allowlist.members();
        let count = self.allowlist.clear();
        info!(removed = count, "Allowlist cleared");

        if count > 0 {
            self.record_allowlist_change(Vec::new(), removed);
        }
        Ok(count)
    }

    fn record_allowlist_change(&mut self, added: Vec<Address>, removed: Vec<Address>) {
        self.events
            .push(BuybackEvent::AllowlistUpdated(AllowlistUpdated { added, removed }));
    }

    // ───────────────────────── Rates ─────────────────────────

    /// Owner-only. Sets the currency value of one collectible and derives the
    /// fungible rate from it.
    pub fn set_collectible_rate(
        &mut self,
        caller: &Address,
        amount: Amount,
    ) -> Result<(), BuybackError> {
        self.ownership.ensure_owner(caller)?;
        let previous = self.rates.set_collectible_rate(amount);
        info!(
            previous = %previous,
            collectible_rate = %amount,
            fungible_rate = %self.rates.fungible_rate(),
            "Exchange rate updated"
        );
        self.events.push(BuybackEvent::RatesUpdated(RatesUpdated {
            previous_collectible_rate: previous,
            collectible_rate: amount,
            fungible_rate: self.rates.fungible_rate(),
        }));
        Ok(())
    }

    pub fn collectible_rate(&self) -> Amount {
        self.rates.collectible_rate()
    }

    pub fn fungible_rate(&self) -> Amount {
        self.rates.fungible_rate()
    }

    pub fn rates(&self) -> &ExchangeRates {
        &self.rates
    }

    // ───────────────────────── Funding ─────────────────────────

    /// Move `amount` of currency from `from` into the reserve. Open to anyone.
    pub fn receive_currency(
        &mut self,
        currency: &mut dyn CurrencyRail,
        from: &Address,
        amount: Amount,
    ) -> Result<(), BuybackError> {
        if amount == 0 {
            return Err(BuybackError::InvalidAmount);
        }
        currency.transfer(from, &self.address, amount)?;
        info!(from = %from, amount = %amount, "Currency received");
        self.events
            .push(BuybackEvent::CurrencyReceived(CurrencyReceived { from: *from, amount }));
        Ok(())
    }

    // ───────────────────────── Swaps ─────────────────────────

    pub fn swap_state_of(&self, participant: &Address) -> SwapState {
        self.swaps.state_of(participant)
    }

    /// Participants that have completed a swap
    pub fn completed_swaps(&self) -> usize {
        self.swaps.completed_count()
    }

    /// Redeem `amount` base units of the fungible token for currency.
    ///
    /// The caller must have approved the ledger for at least `amount`. A
    /// participant who already swapped is refused before the amount is
    /// looked at, so a repeat attempt fails the swap limit even with zero.
    ///
    /// If the payout fails after the tokens were pulled, the tokens are
    /// pushed back to the caller but the allowance spent by the pull is not
    /// restored: [`FungibleToken`] has no way to re-grant it. The caller
    /// has to approve again before retrying.
    pub fn swap_fungible_for_currency(
        &mut self,
        token: &mut dyn FungibleToken,
        currency: &mut dyn CurrencyRail,
        caller: &Address,
        amount: Amount,
    ) -> Result<SwapReceipt, BuybackError> {
        self.ensure_token(&*token)?;
        self.ensure_allowlisted(caller)?;

        let ticket = self.swaps.reserve(*caller, SwapKind::Fungible)?;
        let payout = match self.settle_fungible(token, currency, caller, amount) {
            Ok(payout) => payout,
            Err(err) => {
                self.swaps.release(ticket);
                warn!(
                    participant = %caller,
                    amount = %amount,
                    error = %err,
                    "Fungible swap failed"
                );
                return Err(err);
            }
        };
        self.swaps.commit(ticket);

        let receipt = SwapReceipt {
            receipt_id: Uuid::now_v7(),
            participant: *caller,
            redeemed: Redeemed::Tokens(amount),
            payout,
        };
        info!(
            receipt_id = %receipt.receipt_id,
            participant = %caller,
            amount = %amount,
            payout = %payout,
            "Fungible tokens swapped"
        );
        self.events.push(BuybackEvent::FungibleSwapped(FungibleSwapped {
            receipt_id: receipt.receipt_id,
            participant: *caller,
            amount,
            payout,
        }));
        Ok(receipt)
    }

    fn settle_fungible(
        &self,
        token: &mut dyn FungibleToken,
        currency: &mut dyn CurrencyRail,
        caller: &Address,
        amount: Amount,
    ) -> Result<Amount, BuybackError> {
        if amount == 0 {
            return Err(BuybackError::InvalidAmount);
        }
        let payout = self.rates.fungible_payout(amount)?;
        if payout == 0 {
            return Err(BuybackError::ZeroPayout);
        }
        self.ensure_currency(&*currency, payout)?;

        token.transfer_from(&self.address, caller, &self.address, amount)?;

        if let Err(err) = currency.transfer(&self.address, caller, payout) {
            if let Err(refund) = token.transfer(&self.address, caller, amount) {
                error!(
                    participant = %caller,
                    amount = %amount,
                    error = %refund,
                    "Failed to return tokens after payout failure"
                );
            }
            return Err(err.into());
        }
        Ok(payout)
    }

    /// Redeem one collectible for currency.
    ///
    /// The caller must have approved the ledger for `id`. The collectible
    /// enters custody through the receipt hook with the deposit gate armed.
    pub fn swap_collectible_for_currency(
        &mut self,
        collectible: &mut dyn Collectible,
        currency: &mut dyn CurrencyRail,
        caller: &Address,
        id: CollectibleId,
    ) -> Result<SwapReceipt, BuybackError> {
        self.ensure_collectible(&*collectible)?;
        self.ensure_allowlisted(caller)?;

        let ticket = self.swaps.reserve(*caller, SwapKind::Collectible)?;
        let payout = match self.settle_collectible(collectible, currency, caller, id) {
            Ok(payout) => payout,
            Err(err) => {
                self.swaps.release(ticket);
                warn!(
                    participant = %caller,
                    collectible_id = %id,
                    error = %err,
                    "Collectible swap failed"
                );
                return Err(err);
            }
        };
        self.swaps.commit(ticket);

        let receipt = SwapReceipt {
            receipt_id: Uuid::now_v7(),
            participant: *caller,
            redeemed: Redeemed::Collectible(id),
            payout,
        };
        info!(
            receipt_id = %receipt.receipt_id,
            participant = %caller,
            collectible_id = %id,
            payout = %payout,
            "Collectible swapped"
        );
        self.events
            .push(BuybackEvent::CollectibleSwapped(CollectibleSwapped {
                receipt_id: receipt.receipt_id,
                participant: *caller,
                collectible_id: id,
                payout,
            }));
        Ok(receipt)
    }

    fn settle_collectible(
        &self,
        collectible: &mut dyn Collectible,
        currency: &mut dyn CurrencyRail,
        caller: &Address,
        id: CollectibleId,
    ) -> Result<Amount, BuybackError> {
        let payout = self.rates.collectible_payout();
        if payout == 0 {
            return Err(BuybackError::ZeroPayout);
        }
        self.ensure_currency(&*currency, payout)?;

        {
            let _armed = self
                .deposit_gate
                .arm()
                .ok_or(BuybackError::DepositRejected)?;
            debug!(participant = %caller, collectible_id = %id, "Deposit gate armed");
            collectible.safe_transfer_from(&self.address, caller, &self.address, id, self)?;
        }

        if let Err(err) = currency.transfer(&self.address, caller, payout) {
            let refund = collectible.transfer_from(&self.address, &self.address, caller, id);
            if let Err(refund) = refund {
                error!(
                    participant = %caller,
                    collectible_id = %id,
                    error = %refund,
                    "Failed to return collectible after payout failure"
                );
            }
            return Err(err.into());
        }
        Ok(payout)
    }

    // ───────────────────────── Events ─────────────────────────

    /// Get all emitted events.
    pub fn events(&self) -> &[BuybackEvent] {
        &self.events
    }

    /// Drain all events (for external processing).
    pub fn drain_events(&mut self) -> Vec<BuybackEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn push_event(&mut self, event: BuybackEvent) {
        self.events.push(event);
    }

    // ───────────────────────── Internal checks ─────────────────────────

    fn ensure_allowlisted(&self, participant: &Address) -> Result<(), BuybackError> {
        if self.allowlist.is_member(participant) {
            return Ok(());
        }
        Err(BuybackError::NotAllowlisted {
            participant: *participant,
        })
    }

    /// Reserve must cover `payout` before anything moves.
    fn ensure_currency(
        &self,
        currency: &dyn CurrencyRail,
        payout: Amount,
    ) -> Result<(), BuybackError> {
        let available = currency.balance_of(&self.address);
        if available < payout {
            return Err(BuybackError::InsufficientBalance {
                asset: "currency".to_string(),
                required: payout,
                available,
            });
        }
        Ok(())
    }

    pub(crate) fn ensure_token(&self, token: &dyn FungibleToken) -> Result<(), BuybackError> {
        if token.address() != self.token {
            return Err(BuybackError::AssetMismatch {
                expected: self.token,
                actual: token.address(),
            });
        }
        Ok(())
    }

    pub(crate) fn ensure_collectible(
        &self,
        collectible: &dyn Collectible,
    ) -> Result<(), BuybackError> {
        if collectible.address() != self.collectible {
            return Err(BuybackError::AssetMismatch {
                expected: self.collectible,
                actual: collectible.address(),
            });
        }
        Ok(())
    }
}

impl CollectibleReceiver for Buyback {
    fn address(&self) -> Address {
        self.address
    }

    /// Accepts a collectible only while a swap holds the deposit gate.
    fn on_collectible_received(
        &self,
        operator: &Address,
        from: &Address,
        id: CollectibleId,
    ) -> Result<(), AssetError> {
        if self.deposit_gate.is_armed() {
            debug!(
                operator = %operator,
                from = %from,
                collectible_id = %id,
                "Collectible accepted"
            );
            return Ok(());
        }
        warn!(
            operator = %operator,
            from = %from,
            collectible_id = %id,
            "Unsolicited collectible rejected"
        );
        Err(AssetError::DepositRejected)
    }
}
