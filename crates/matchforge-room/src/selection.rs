//! The live pick ledger for a round's `UserPicks` phase.

use std::collections::BTreeMap;

use matchforge_protocol::{ItemId, UserId};

/// Each user's current (uncommitted) pick. At most one per user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionLedger {
    selections: BTreeMap<UserId, ItemId>,
}

impl SelectionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the user's pick; `None` clears it.
    ///
    /// Returns `true` if the ledger changed. Re-picking the current item
    /// or clearing an empty slot is a no-op, not an error.
    pub fn set_selection(&mut self, user_id: UserId, item: Option<ItemId>) -> bool {
        match item {
            Some(item) => self.selections.insert(user_id, item) != Some(item),
            None => self.selections.remove(&user_id).is_some(),
        }
    }

    /// Picks `item`, or releases it if it is already the user's pick.
    /// Returns the user's pick afterwards.
    pub fn toggle(&mut self, user_id: UserId, item: ItemId) -> Option<ItemId> {
        if self.selections.get(&user_id) == Some(&item) {
            self.selections.remove(&user_id);
            None
        } else {
            self.selections.insert(user_id, item);
            Some(item)
        }
    }

    pub fn selection(&self, user_id: UserId) -> Option<ItemId> {
        self.selections.get(&user_id).copied()
    }

    /// `item → number of users currently picking it`.
    pub fn tally(&self) -> BTreeMap<ItemId, usize> {
        let mut tally = BTreeMap::new();
        for item in self.selections.values() {
            *tally.entry(*item).or_insert(0) += 1;
        }
        tally
    }

    pub fn selections(&self) -> &BTreeMap<UserId, ItemId> {
        &self.selections
    }

    pub fn clear(&mut self) {
        self.selections.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }
}
