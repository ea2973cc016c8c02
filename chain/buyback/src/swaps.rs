//! Swap Ledger — per-participant one-time redemption state
//!
//! Each participant moves at most once, from `Unswapped` to one of two
//! terminal states. A swap in progress holds a [`SwapTicket`]; the
//! participant's state flips only when the ticket is committed, after
//! every transfer of the swap has succeeded. Releasing the ticket leaves
//! the participant exactly as before.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::debug;
use types::ids::Address;

use crate::errors::BuybackError;

/// Which asset a swap redeems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwapKind {
    Fungible,
    Collectible,
}

impl SwapKind {
    /// Terminal state reached by a committed swap of this kind
    pub fn terminal_state(self) -> SwapState {
        match self {
            SwapKind::Fungible => SwapState::SwappedFungible,
            SwapKind::Collectible => SwapState::SwappedCollectible,
        }
    }
}

impl fmt::Display for SwapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwapKind::Fungible => write!(f, "fungible tokens"),
            SwapKind::Collectible => write!(f, "a collectible"),
        }
    }
}

/// Redemption state of a participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SwapState {
    #[default]
    Unswapped,
    SwappedFungible,
    SwappedCollectible,
}

impl SwapState {
    /// The kind of the completed swap, if any
    pub fn completed(self) -> Option<SwapKind> {
        match self {
            SwapState::Unswapped => None,
            SwapState::SwappedFungible => Some(SwapKind::Fungible),
            SwapState::SwappedCollectible => Some(SwapKind::Collectible),
        }
    }

    pub fn is_terminal(self) -> bool {
        self.completed().is_some()
    }
}

/// Reservation for a swap in progress
///
/// Must be handed back to [`SwapLedger::commit`] or [`SwapLedger::release`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a swap ticket must be committed or released"]
pub struct SwapTicket {
    participant: Address,
    kind: SwapKind,
}

impl SwapTicket {
    pub fn participant(&self) -> Address {
        self.participant
    }

    pub fn kind(&self) -> SwapKind {
        self.kind
    }
}

/// Per-participant swap records
#[derive(Debug, Default)]
pub struct SwapLedger {
    /// Only participants that have completed a swap have an entry
    records: HashMap<Address, SwapState>,
    /// Participants holding an outstanding ticket
    in_flight: HashSet<Address>,
}

impl SwapLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state; absent participants are `Unswapped`.
    pub fn state_of(&self, participant: &Address) -> SwapState {
        self.records.get(participant).copied().unwrap_or_default()
    }

    pub fn has_swapped(&self, participant: &Address) -> bool {
        self.state_of(participant).is_terminal()
    }

    /// Reserve the participant's one-time swap.
    ///
    /// Errors:
    /// - [`BuybackError::LimitExceeded`] if the participant already swapped this kind
    /// - [`BuybackError::AlreadySwappedOther`] if the participant already swapped the other kind
    /// - [`BuybackError::AlreadySwapped`] if a swap for the participant is already in progress
    pub fn reserve(
        &mut self,
        participant: Address,
        kind: SwapKind,
    ) -> Result<SwapTicket, BuybackError> {
        if let Some(previous) = self.state_of(&participant).completed() {
            return Err(if previous == kind {
                BuybackError::LimitExceeded { kind }
            } else {
                BuybackError::AlreadySwappedOther { previous }
            });
        }

        if !self.in_flight.insert(participant) {
            return Err(BuybackError::AlreadySwapped { participant });
        }

        debug!(participant = %participant, ?kind, "Swap reserved");
        Ok(SwapTicket { participant, kind })
    }

    /// Flip the participant to the ticket's terminal state.
    pub fn commit(&mut self, ticket: SwapTicket) -> SwapState {
        self.in_flight.remove(&ticket.participant);
        let state = self.records.entry(ticket.participant).or_default();
        if *state == SwapState::Unswapped {
            *state = ticket.kind.terminal_state();
        }
        debug!(participant = %ticket.participant, state = ?*state, "Swap committed");
        *state
    }

    /// Drop the reservation without touching the participant's state.
    pub fn release(&mut self, ticket: SwapTicket) {
        self.in_flight.remove(&ticket.participant);
        debug!(participant = %ticket.participant, kind = ?ticket.kind, "Swap reservation released");
    }

    /// Number of participants that have completed a swap
    pub fn completed_count(&self) -> usize {
        self.records.values().filter(|s| s.is_terminal()).count()
    }

    /// Number of outstanding reservations
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }
}
