use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::Resource;

// ============================================================================
// Inventory - Resource counts held by an island (or declared by a structure)
// ============================================================================

/// Resource counts. Missing entries read as zero; counts never go negative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    pub items: BTreeMap<Resource, u64>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, resource: Resource, amount: u64) -> Self {
        self.add(resource, amount);
        self
    }

    pub fn get(&self, resource: Resource) -> u64 {
        self.items.get(&resource).copied().unwrap_or(0)
    }

    /// Adds `amount`, pinning the count at `u64::MAX`.
    pub fn add(&mut self, resource: Resource, amount: u64) {
        let entry = self.items.entry(resource).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    /// Removes up to `amount`, returns what was actually removed.
    pub fn remove(&mut self, resource: Resource, amount: u64) -> u64 {
        let current = self.items.entry(resource).or_insert(0);
        let removed = amount.min(*current);
        *current -= removed;
        removed
    }

    /// Creates an explicit zero entry so the resource shows up in views.
    pub fn ensure(&mut self, resource: Resource) {
        self.items.entry(resource).or_insert(0);
    }

    /// Production rule: every requirement must be strictly exceeded.
    pub fn exceeds(&self, requirements: &Inventory) -> bool {
        requirements
            .iter()
            .all(|(resource, needed)| self.get(resource) > needed)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Resource, u64)> + '_ {
        self.items.iter().map(|(r, n)| (*r, *n))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<(Resource, u64)> for Inventory {
    fn from_iter<T: IntoIterator<Item = (Resource, u64)>>(iter: T) -> Self {
        let mut inventory = Inventory::new();
        for (resource, amount) in iter {
            inventory.add(resource, amount);
        }
        inventory
    }
}
