//! Per-group maps keyed by denomination: counts, deltas and breakdowns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Denomination, DenominationSet, Group};

/// A value per denomination for both groups.
///
/// Denominations serialize as their decimal string key. Reads of a missing
/// key yield `T::default()`, never an error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerGroup<T> {
    #[serde(default)]
    pub banknotes: BTreeMap<Denomination, T>,
    #[serde(default)]
    pub coins: BTreeMap<Denomination, T>,
}

/// Number of physical units held per denomination.
pub type Counts = PerGroup<u64>;

/// Signed change in count per denomination. Unchanged denominations are
/// absent, never stored as zero.
pub type Delta = PerGroup<i64>;

/// Monetary amount (denomination × count) per denomination.
pub type Breakdown = PerGroup<u64>;

impl<T> PerGroup<T> {
    pub fn new() -> Self {
        Self {
            banknotes: BTreeMap::new(),
            coins: BTreeMap::new(),
        }
    }

    pub fn group(&self, group: Group) -> &BTreeMap<Denomination, T> {
        match group {
            Group::Banknotes => &self.banknotes,
            Group::Coins => &self.coins,
        }
    }

    pub fn group_mut(&mut self, group: Group) -> &mut BTreeMap<Denomination, T> {
        match group {
            Group::Banknotes => &mut self.banknotes,
            Group::Coins => &mut self.coins,
        }
    }

    /// Sets one entry, builder style.
    #[must_use]
    pub fn with(mut self, group: Group, denomination: Denomination, value: T) -> Self {
        self.group_mut(group).insert(denomination, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.banknotes.is_empty() && self.coins.is_empty()
    }

    /// Every `(group, denomination, value)` entry, banknotes first.
    pub fn entries(&self) -> impl Iterator<Item = (Group, Denomination, &T)> + '_ {
        Group::ALL
            .into_iter()
            .flat_map(move |group| self.group(group).iter().map(move |(d, v)| (group, *d, v)))
    }
}

impl<T: Copy + Default> PerGroup<T> {
    /// Value for a denomination, defaulting when the key is absent.
    pub fn get(&self, group: Group, denomination: Denomination) -> T {
        self.group(group)
            .get(&denomination)
            .copied()
            .unwrap_or_default()
    }
}

impl Counts {
    /// A zero count for every denomination of the set.
    pub fn zeroed(denoms: &DenominationSet) -> Self {
        let mut counts = Self::new();
        for (group, denomination) in denoms.iter() {
            counts.group_mut(group).insert(denomination, 0);
        }
        counts
    }
}

impl Delta {
    /// The same delta with every entry's sign flipped.
    #[must_use]
    pub fn negated(&self) -> Self {
        let mut negated = Self::new();
        for (group, denomination, value) in self.entries() {
            negated
                .group_mut(group)
                .insert(denomination, value.saturating_neg());
        }
        negated
    }
}
