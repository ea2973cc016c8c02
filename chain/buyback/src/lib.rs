//! Allowlisted Buyback Ledger
//!
//! Custodial ledger that lets allowlisted participants redeem, exactly once,
//! either an amount of a fungible token or a single collectible for a payout
//! in reserve currency. Redeemed assets stay in custody until anyone sweeps
//! them to the fixed destination; the owner manages the allowlist, the rate,
//! and the reserve.
//!
//! # Modules
//! - `errors`: Ledger, asset rail and configuration errors
//! - `events`: Append-only event log records
//! - `security`: Owner check and the collectible deposit gate
//! - `allowlist`: Participant membership
//! - `rates`: Collectible rate and the derived fungible rate
//! - `swaps`: Per-participant one-time swap state and reservations
//! - `assets`: Token, collectible and currency rail interfaces, in-memory rails
//! - `ledger`: The `Buyback` state object and both swap paths
//! - `treasury`: Withdrawals, recoveries and forwarding
//! - `config`: Construction-time configuration
//! - `shared`: Mutex-serialized handle for multi-threaded callers

pub mod allowlist;
pub mod assets;
pub mod config;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod rates;
pub mod security;
pub mod shared;
pub mod swaps;
pub mod treasury;

pub use config::{BuybackConfig, DESTINATION_ADDRESS};
pub use errors::{AssetError, BuybackError, ConfigError};
pub use ledger::{Buyback, Redeemed, SwapReceipt};
pub use rates::FUNGIBLE_PER_COLLECTIBLE;
pub use shared::{Deployment, SharedBuyback};
pub use swaps::{SwapKind, SwapState};
pub use treasury::Forwarded;
