//! Allowlist Registry — binary membership over participant identities
//!
//! Owner checks happen at the ledger boundary; this type only holds the set.

use std::collections::HashSet;
use types::ids::Address;

#[derive(Debug, Clone, Default)]
pub struct Allowlist {
    members: HashSet<Address>,
}

impl Allowlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from an initial list; duplicates collapse.
    pub fn with_members<I>(members: I) -> Self
    where
        I: IntoIterator<Item = Address>,
    {
        Self {
            members: members.into_iter().collect(),
        }
    }

    pub fn is_member(&self, id: &Address) -> bool {
        self.members.contains(id)
    }

    /// Returns `true` if the id was not already a member.
    pub fn add(&mut self, id: Address) -> bool {
        self.members.insert(id)
    }

    /// Returns `true` if the id was a member.
    pub fn remove(&mut self, id: &Address) -> bool {
        self.members.remove(id)
    }

    /// Additive bulk set: every listed id becomes a member, existing members stay.
    ///
    /// Returns the number of newly added members.
    pub fn set_all<'a, I>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = &'a Address>,
    {
        ids.into_iter().filter(|id| self.members.insert(**id)).count()
    }

    /// Remove every member. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.members.len();
        self.members.clear();
        removed
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members in ascending address order
    pub fn members(&self) -> Vec<Address> {
        let mut members: Vec<Address> = self.members.iter().copied().collect();
        members.sort();
        members
    }
}
