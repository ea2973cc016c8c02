//! Access control and the deposit guard
//!
//! [`Ownership`] gates every administrative operation on a single owner
//! identity. [`DepositGate`] decides whether an incoming collectible is part
//! of a swap or an unsolicited deposit.

use std::cell::Cell;
use tracing::warn;
use types::ids::Address;

use crate::errors::BuybackError;

/// Single-owner access control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ownership {
    owner: Address,
}

impl Ownership {
    pub fn new(owner: Address) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_owner(&self, caller: &Address) -> bool {
        self.owner == *caller
    }

    /// Errors with [`BuybackError::Unauthorized`] unless `caller` is the owner.
    pub fn ensure_owner(&self, caller: &Address) -> Result<(), BuybackError> {
        if self.is_owner(caller) {
            return Ok(());
        }
        warn!(caller = %caller, owner = %self.owner, "Rejected owner-only call");
        Err(BuybackError::Unauthorized)
    }

    /// Hand ownership to `new_owner`, returning the previous owner.
    pub fn transfer(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> Result<Address, BuybackError> {
        self.ensure_owner(caller)?;
        let previous = std::mem::replace(&mut self.owner, new_owner);
        Ok(previous)
    }
}

/// Guard over collectible receipt.
///
/// Closed by default. A collectible swap arms it for the duration of its own
/// incoming transfer; any receipt while closed is rejected.
#[derive(Debug, Default)]
pub struct DepositGate {
    armed: Cell<bool>,
}

impl DepositGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the gate until the returned guard is dropped.
    ///
    /// Returns `None` if the gate is already open.
    pub fn arm(&self) -> Option<ArmedDeposit<'_>> {
        if self.armed.replace(true) {
            return None;
        }
        Some(ArmedDeposit { gate: self })
    }

    pub fn is_armed(&self) -> bool {
        self.armed.get()
    }
}

/// Open deposit gate; closes on drop.
#[derive(Debug)]
#[must_use = "the gate closes as soon as this guard is dropped"]
pub struct ArmedDeposit<'a> {
    gate: &'a DepositGate,
}

impl Drop for ArmedDeposit<'_> {
    fn drop(&mut self) {
        self.gate.armed.set(false);
    }
}
