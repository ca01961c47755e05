//! Denomination groups and the per-wallet set of valid face values.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Face value of a banknote or coin, in whole currency units.
pub type Denomination = u64;

/// Banknotes used when a wallet has none configured.
pub const DEFAULT_BANKNOTES: [Denomination; 9] = [5000, 2000, 1000, 500, 200, 100, 50, 10, 5];
/// Coins used when a wallet has none configured.
pub const DEFAULT_COINS: [Denomination; 4] = [10, 5, 2, 1];

/// One of the two denomination categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    Banknotes,
    Coins,
}

impl Group {
    /// Both groups, in canonical (display) order.
    pub const ALL: [Group; 2] = [Group::Banknotes, Group::Coins];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Banknotes => "banknotes",
            Self::Coins => "coins",
        }
    }

    const fn fallback(self) -> &'static [Denomination] {
        match self {
            Self::Banknotes => &DEFAULT_BANKNOTES,
            Self::Coins => &DEFAULT_COINS,
        }
    }
}

impl core::fmt::Display for Group {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Group {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "banknotes" => Ok(Self::Banknotes),
            "coins" => Ok(Self::Coins),
            other => Err(EngineError::KeyNotFound(other.to_string())),
        }
    }
}

/// The valid denominations of a wallet, per group.
///
/// Each list is non-empty, duplicate-free and sorted descending. The only way
/// to build one is through [`DenominationSet::new`], which enforces this.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DenominationSet {
    banknotes: Vec<Denomination>,
    coins: Vec<Denomination>,
}

impl DenominationSet {
    /// Canonicalizes both lists: zeros dropped, duplicates collapsed, sorted
    /// descending. A list left empty falls back to the group defaults.
    pub fn new(
        banknotes: impl IntoIterator<Item = Denomination>,
        coins: impl IntoIterator<Item = Denomination>,
    ) -> Self {
        Self {
            banknotes: canonical_list(banknotes, Group::Banknotes),
            coins: canonical_list(coins, Group::Coins),
        }
    }

    #[must_use]
    pub fn group(&self, group: Group) -> &[Denomination] {
        match group {
            Group::Banknotes => &self.banknotes,
            Group::Coins => &self.coins,
        }
    }

    #[must_use]
    pub fn contains(&self, group: Group, denomination: Denomination) -> bool {
        self.group(group).contains(&denomination)
    }

    /// Every `(group, denomination)` pair in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Group, Denomination)> + '_ {
        Group::ALL
            .into_iter()
            .flat_map(move |group| self.group(group).iter().map(move |d| (group, *d)))
    }
}

impl Default for DenominationSet {
    fn default() -> Self {
        Self::new(DEFAULT_BANKNOTES, DEFAULT_COINS)
    }
}

fn canonical_list(values: impl IntoIterator<Item = Denomination>, group: Group) -> Vec<Denomination> {
    let unique: BTreeSet<Denomination> = values.into_iter().filter(|d| *d > 0).collect();
    if unique.is_empty() {
        return group.fallback().to_vec();
    }
    unique.into_iter().rev().collect()
}
