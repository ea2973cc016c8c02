//! Types library for the buyback ledger
//!
//! Shared primitives used by the ledger crate and by anything that
//! configures or drives it: account identities, collectible identifiers,
//! and integer amount arithmetic in smallest units.
//!
//! # Modules
//! - `ids`: Identities (Address, CollectibleId)
//! - `numeric`: Smallest-unit amounts, unit scaling, overflow-safe mul-div

pub mod ids;
pub mod numeric;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
}
