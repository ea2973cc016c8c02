//! In-memory rails
//!
//! Ledger-backed implementations of the asset interfaces, used for local
//! deployments and tests. Balances use checked arithmetic; a failed call
//! leaves the rail untouched.

use std::collections::{BTreeMap, HashMap, HashSet};
use types::ids::{Address, CollectibleId};
use types::numeric::Amount;

use super::{Collectible, CollectibleReceiver, CurrencyRail, FungibleToken};
use crate::errors::AssetError;

fn debit(
    balances: &mut HashMap<Address, Amount>,
    holder: &Address,
    amount: Amount,
) -> Result<(), AssetError> {
    let available = balances.get(holder).copied().unwrap_or(0);
    let remaining = available
        .checked_sub(amount)
        .ok_or(AssetError::InsufficientFunds {
            holder: *holder,
            required: amount,
            available,
        })?;
    balances.insert(*holder, remaining);
    Ok(())
}

fn credit(
    balances: &mut HashMap<Address, Amount>,
    holder: &Address,
    amount: Amount,
) -> Result<(), AssetError> {
    let current = balances.entry(*holder).or_insert(0);
    *current = current.checked_add(amount).ok_or(AssetError::Overflow)?;
    Ok(())
}

/// Move `amount` between holders, all or nothing.
fn move_balance(
    balances: &mut HashMap<Address, Amount>,
    from: &Address,
    to: &Address,
    amount: Amount,
) -> Result<(), AssetError> {
    if from == to {
        let available = balances.get(from).copied().unwrap_or(0);
        if available < amount {
            return Err(AssetError::InsufficientFunds {
                holder: *from,
                required: amount,
                available,
            });
        }
        return Ok(());
    }
    let to_balance = balances.get(to).copied().unwrap_or(0);
    if to_balance.checked_add(amount).is_none() {
        return Err(AssetError::Overflow);
    }
    debit(balances, from, amount)?;
    credit(balances, to, amount)
}

// ───────────────────────── Fungible token ─────────────────────────

#[derive(Debug, Clone)]
pub struct MemoryToken {
    address: Address,
    balances: HashMap<Address, Amount>,
    /// (owner, spender) -> remaining allowance
    allowances: HashMap<(Address, Address), Amount>,
}

impl MemoryToken {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            balances: HashMap::new(),
            allowances: HashMap::new(),
        }
    }

    pub fn mint(&mut self, to: &Address, amount: Amount) -> Result<(), AssetError> {
        credit(&mut self.balances, to, amount)
    }

    /// Set `spender`'s allowance over `owner`'s balance, replacing any previous value.
    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: Amount) {
        self.allowances.insert((*owner, *spender), amount);
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }
}

impl FungibleToken for MemoryToken {
    fn address(&self) -> Address {
        self.address
    }

    fn balance_of(&self, holder: &Address) -> Amount {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<(), AssetError> {
        move_balance(&mut self.balances, from, to, amount)
    }

    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), AssetError> {
        let approved = self.allowance(from, spender);
        if approved < amount {
            return Err(AssetError::InsufficientAllowance {
                spender: *spender,
                required: amount,
                approved,
            });
        }
        move_balance(&mut self.balances, from, to, amount)?;
        self.allowances.insert((*from, *spender), approved - amount);
        Ok(())
    }
}

// ───────────────────────── Collectible ─────────────────────────

#[derive(Debug, Clone)]
pub struct MemoryCollectible {
    address: Address,
    owners: BTreeMap<CollectibleId, Address>,
    /// Single-id approvals, cleared on every transfer of that id
    approvals: HashMap<CollectibleId, Address>,
    /// (owner, operator) pairs approved for every id of the owner
    operators: HashSet<(Address, Address)>,
    next_id: u64,
}

impl MemoryCollectible {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            owners: BTreeMap::new(),
            approvals: HashMap::new(),
            operators: HashSet::new(),
            next_id: 0,
        }
    }

    /// Mint the next sequential id to `to`. Ids start at 0.
    pub fn mint(&mut self, to: &Address) -> CollectibleId {
        let id = CollectibleId::new(self.next_id);
        self.next_id += 1;
        self.owners.insert(id, *to);
        id
    }

    /// Approve `spender` for a single id. Only the current owner may approve.
    pub fn approve(
        &mut self,
        owner: &Address,
        spender: &Address,
        id: CollectibleId,
    ) -> Result<(), AssetError> {
        match self.owners.get(&id) {
            None => Err(AssetError::UnknownCollectible { id }),
            Some(current) if current != owner => Err(AssetError::NotOwner { id, from: *owner }),
            Some(_) => {
                self.approvals.insert(id, *spender);
                Ok(())
            }
        }
    }

    pub fn set_approval_for_all(&mut self, owner: &Address, operator: &Address, approved: bool) {
        if approved {
            self.operators.insert((*owner, *operator));
        } else {
            self.operators.remove(&(*owner, *operator));
        }
    }

    pub fn approved(&self, id: CollectibleId) -> Option<Address> {
        self.approvals.get(&id).copied()
    }

    fn is_authorized(&self, operator: &Address, owner: &Address, id: CollectibleId) -> bool {
        operator == owner
            || self.approvals.get(&id) == Some(operator)
            || self.operators.contains(&(*owner, *operator))
    }

    /// Move `id` after ownership and approval checks. Returns the cleared approval.
    fn move_token(
        &mut self,
        operator: &Address,
        from: &Address,
        to: &Address,
        id: CollectibleId,
    ) -> Result<Option<Address>, AssetError> {
        let owner = *self
            .owners
            .get(&id)
            .ok_or(AssetError::UnknownCollectible { id })?;
        if owner != *from {
            return Err(AssetError::NotOwner { id, from: *from });
        }
        if !self.is_authorized(operator, from, id) {
            return Err(AssetError::NotApproved {
                id,
                operator: *operator,
            });
        }
        self.owners.insert(id, *to);
        Ok(self.approvals.remove(&id))
    }
}

impl Collectible for MemoryCollectible {
    fn address(&self) -> Address {
        self.address
    }

    fn owner_of(&self, id: CollectibleId) -> Option<Address> {
        self.owners.get(&id).copied()
    }

    fn tokens_of(&self, owner: &Address) -> Vec<CollectibleId> {
        self.owners
            .iter()
            .filter(|(_, holder)| *holder == owner)
            .map(|(id, _)| *id)
            .collect()
    }

    fn transfer_from(
        &mut self,
        operator: &Address,
        from: &Address,
        to: &Address,
        id: CollectibleId,
    ) -> Result<(), AssetError> {
        self.move_token(operator, from, to, id).map(|_| ())
    }

    fn safe_transfer_from(
        &mut self,
        operator: &Address,
        from: &Address,
        to: &Address,
        id: CollectibleId,
        receiver: &dyn CollectibleReceiver,
    ) -> Result<(), AssetError> {
        if receiver.address() != *to {
            return Err(AssetError::DepositRejected);
        }
        let cleared = self.move_token(operator, from, to, id)?;
        if let Err(err) = receiver.on_collectible_received(operator, from, id) {
            self.owners.insert(id, *from);
            if let Some(spender) = cleared {
                self.approvals.insert(id, spender);
            }
            return Err(err);
        }
        Ok(())
    }
}

// ───────────────────────── Currency ─────────────────────────

#[derive(Debug, Clone, Default)]
pub struct MemoryCurrency {
    balances: HashMap<Address, Amount>,
}

impl MemoryCurrency {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `holder` out of thin air.
    pub fn fund(&mut self, holder: &Address, amount: Amount) -> Result<(), AssetError> {
        credit(&mut self.balances, holder, amount)
    }
}

impl CurrencyRail for MemoryCurrency {
    fn balance_of(&self, holder: &Address) -> Amount {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<(), AssetError> {
        move_balance(&mut self.balances, from, to, amount)
    }
}
