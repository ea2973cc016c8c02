//! Ledger error types
//!
//! Every failure is a rejected operation with a stable reason; none of them
//! leave partial state behind and none are retried inside the ledger.

use thiserror::Error;
use types::ids::{Address, CollectibleId};
use types::numeric::Amount;

use crate::swaps::SwapKind;
use crate::treasury::Forwarded;

/// Failures reported by the asset rails (token, collection, currency)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    #[error("Insufficient allowance for {spender}: required {required}, approved {approved}")]
    InsufficientAllowance {
        spender: Address,
        required: Amount,
        approved: Amount,
    },

    #[error("Insufficient funds for {holder}: required {required}, available {available}")]
    InsufficientFunds {
        holder: Address,
        required: Amount,
        available: Amount,
    },

    #[error("Collectible {id} does not exist")]
    UnknownCollectible { id: CollectibleId },

    #[error("Collectible {id} is not owned by {from}")]
    NotOwner { id: CollectibleId, from: Address },

    #[error("{operator} is not approved to move collectible {id}")]
    NotApproved { id: CollectibleId, operator: Address },

    #[error("NFTs not accepted without a swap")]
    DepositRejected,

    #[error("Arithmetic overflow in balance calculation")]
    Overflow,
}

/// Ledger errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuybackError {
    #[error("Unauthorized: caller is not the owner")]
    Unauthorized,

    #[error("Address not allowlisted: {participant}")]
    NotAllowlisted { participant: Address },

    #[error("Swap already in progress for {participant}")]
    AlreadySwapped { participant: Address },

    #[error("Already swapped {previous}")]
    AlreadySwappedOther { previous: SwapKind },

    #[error("Swap limit exceeded for {kind}")]
    LimitExceeded { kind: SwapKind },

    #[error("Insufficient {asset} balance: required {required}, available {available}")]
    InsufficientBalance {
        asset: String,
        required: Amount,
        available: Amount,
    },

    #[error("No tokens or NFTs to send")]
    NothingToSend,

    #[error("NFTs not accepted without a swap")]
    DepositRejected,

    #[error("Swap amount must be positive")]
    InvalidAmount,

    #[error("Exchange rate yields no payout for this swap")]
    ZeroPayout,

    #[error("Asset mismatch: expected {expected}, got {actual}")]
    AssetMismatch { expected: Address, actual: Address },

    #[error("Collectible {id} is not held by the ledger")]
    CollectibleNotHeld { id: CollectibleId },

    #[error("Arithmetic overflow in payout calculation")]
    Overflow,

    #[error("Transfer failed: {0}")]
    Transfer(AssetError),

    /// The sweep stopped partway; `forwarded` already reached the destination.
    #[error(
        "Forwarding interrupted after {} collectibles and {} tokens: {error}",
        .forwarded.collectible_ids.len(),
        .forwarded.fungible_amount
    )]
    ForwardingInterrupted {
        forwarded: Forwarded,
        error: AssetError,
    },
}

impl From<AssetError> for BuybackError {
    fn from(err: AssetError) -> Self {
        match err {
            AssetError::DepositRejected => BuybackError::DepositRejected,
            other => BuybackError::Transfer(other),
        }
    }
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
