//! Ledger events
//!
//! Immutable records appended by every successful state-changing operation.
//! Failed operations append nothing.

use serde::{Deserialize, Serialize};
use types::ids::{Address, CollectibleId};
use types::numeric::Amount;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipTransferred {
    pub previous_owner: Address,
    pub new_owner: Address,
}

/// Allowlist membership changed
///
/// `added` and `removed` carry only ids whose membership actually flipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowlistUpdated {
    pub added: Vec<Address>,
    pub removed: Vec<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatesUpdated {
    pub previous_collectible_rate: Amount,
    pub collectible_rate: Amount,
    pub fungible_rate: Amount,
}

/// Plain currency arrived at the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyReceived {
    pub from: Address,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FungibleSwapped {
    pub receipt_id: Uuid,
    pub participant: Address,
    pub amount: Amount,
    pub payout: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectibleSwapped {
    pub receipt_id: Uuid,
    pub participant: Address,
    pub collectible_id: CollectibleId,
    pub payout: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyWithdrawn {
    pub to: Address,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FungibleRecovered {
    pub token: Address,
    pub to: Address,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectibleRecovered {
    pub collection: Address,
    pub to: Address,
    pub collectible_id: CollectibleId,
}

/// Custody swept to the fixed destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardedToDestination {
    pub destination: Address,
    pub fungible_amount: Amount,
    pub collectible_ids: Vec<CollectibleId>,
}

/// Enum wrapper for all ledger events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuybackEvent {
    OwnershipTransferred(OwnershipTransferred),
    AllowlistUpdated(AllowlistUpdated),
    RatesUpdated(RatesUpdated),
    CurrencyReceived(CurrencyReceived),
    FungibleSwapped(FungibleSwapped),
    CollectibleSwapped(CollectibleSwapped),
    CurrencyWithdrawn(CurrencyWithdrawn),
    FungibleRecovered(FungibleRecovered),
    CollectibleRecovered(CollectibleRecovered),
    ForwardedToDestination(ForwardedToDestination),
}
