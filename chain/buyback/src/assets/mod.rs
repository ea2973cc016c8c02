//! Asset rails the ledger drives
//!
//! The ledger never keeps its own copy of custody balances. It moves assets
//! through these interfaces and reads its holdings back from them.
//!
//! # Rails
//! - [`FungibleToken`]: divisible token with allowance-based pulls
//! - [`Collectible`]: non-fungible collection with a receipt hook on safe transfers
//! - [`CurrencyRail`]: the reserve currency payouts are made in

pub mod memory;

use types::ids::{Address, CollectibleId};
use types::numeric::Amount;

use crate::errors::AssetError;

pub use memory::{MemoryCollectible, MemoryCurrency, MemoryToken};

/// Divisible token
pub trait FungibleToken {
    /// Identity of the token contract
    fn address(&self) -> Address;

    fn balance_of(&self, holder: &Address) -> Amount;

    /// Push `amount` from `from` to `to`.
    fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<(), AssetError>;

    /// Pull `amount` from `from` to `to`, spending `spender`'s allowance.
    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), AssetError>;
}

/// Receipt hook consulted by [`Collectible::safe_transfer_from`]
pub trait CollectibleReceiver {
    /// Identity the hook answers for. Must match the transfer's `to`.
    fn address(&self) -> Address;

    /// Accept or refuse an incoming collectible. An error undoes the transfer.
    fn on_collectible_received(
        &self,
        operator: &Address,
        from: &Address,
        id: CollectibleId,
    ) -> Result<(), AssetError>;
}

/// Non-fungible collection
pub trait Collectible {
    /// Identity of the collection contract
    fn address(&self) -> Address;

    fn owner_of(&self, id: CollectibleId) -> Option<Address>;

    /// Every collectible held by `owner`, ascending by id
    fn tokens_of(&self, owner: &Address) -> Vec<CollectibleId>;

    /// Move `id` without consulting the recipient.
    fn transfer_from(
        &mut self,
        operator: &Address,
        from: &Address,
        to: &Address,
        id: CollectibleId,
    ) -> Result<(), AssetError>;

    /// Move `id` and let `receiver` (the recipient at `to`) refuse it.
    ///
    /// A `receiver` that does not answer for `to` is refused with
    /// [`AssetError::DepositRejected`] and nothing moves.
    fn safe_transfer_from(
        &mut self,
        operator: &Address,
        from: &Address,
        to: &Address,
        id: CollectibleId,
        receiver: &dyn CollectibleReceiver,
    ) -> Result<(), AssetError>;
}

/// Reserve currency
pub trait CurrencyRail {
    fn balance_of(&self, holder: &Address) -> Amount;

    fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<(), AssetError>;
}
