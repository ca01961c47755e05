//! Monetary breakdown, totals and count differences.
//!
//! Denominations and counts are integers, so every amount here is an exact
//! integer. Sums saturate instead of wrapping.

use std::collections::BTreeSet;

use crate::{Breakdown, Counts, Delta, Denomination, Group, WalletState};

/// One display row of a wallet: a denomination with its count and subtotal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DenomRow {
    pub group: Group,
    pub denomination: Denomination,
    pub count: u64,
    pub subtotal: u64,
}

/// Amount held per denomination, for every denomination of the wallet.
pub fn breakdown(state: &WalletState) -> Breakdown {
    let mut breakdown = Breakdown::new();
    for (group, denomination) in state.denoms().iter() {
        let count = state.counts().get(group, denomination);
        breakdown
            .group_mut(group)
            .insert(denomination, denomination.saturating_mul(count));
    }
    breakdown
}

/// Total amount held across both groups.
pub fn total(state: &WalletState) -> u64 {
    breakdown(state)
        .entries()
        .fold(0u64, |sum, (_, _, amount)| sum.saturating_add(*amount))
}

/// Rows in canonical order: banknotes then coins, each descending.
pub fn rows(state: &WalletState) -> Vec<DenomRow> {
    state
        .denoms()
        .iter()
        .map(|(group, denomination)| {
            let count = state.counts().get(group, denomination);
            DenomRow {
                group,
                denomination,
                count,
                subtotal: denomination.saturating_mul(count),
            }
        })
        .collect()
}

/// Signed per-denomination change from `prev` to `next`.
///
/// Keys from either snapshot are considered; missing keys count as 0 and
/// unchanged denominations are omitted. Changes beyond the `i64` range
/// saturate; [`apply`](crate::apply) rejects operations that would need one.
pub fn diff(prev: &Counts, next: &Counts) -> Delta {
    let mut delta = Delta::new();
    for group in Group::ALL {
        let keys: BTreeSet<Denomination> = prev
            .group(group)
            .keys()
            .chain(next.group(group).keys())
            .copied()
            .collect();
        for denomination in keys {
            let change =
                i128::from(next.get(group, denomination)) - i128::from(prev.get(group, denomination));
            if change != 0 {
                let change = change.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64;
                delta.group_mut(group).insert(denomination, change);
            }
        }
    }
    delta
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{CurrencyCode, schema::parse_wallet};

    fn wallet() -> WalletState {
        parse_wallet(
            &json!({
                "denoms": {"banknotes": [100, 50], "coins": [10, 5]},
                "counts": {"banknotes": {"100": 2, "50": 3}, "coins": {"10": 4}}
            }),
            &CurrencyCode::default(),
        )
        .unwrap()
    }

    #[test]
    fn breakdown_and_total() {
        let state = wallet();
        let breakdown = breakdown(&state);
        assert_eq!(breakdown.get(Group::Banknotes, 100), 200);
        assert_eq!(breakdown.get(Group::Banknotes, 50), 150);
        assert_eq!(breakdown.get(Group::Coins, 10), 40);
        assert_eq!(breakdown.group(Group::Coins).get(&5), Some(&0));
        assert_eq!(total(&state), 390);

        let expected: u64 = state
            .counts()
            .entries()
            .map(|(_, denomination, count)| denomination * count)
            .sum();
        assert_eq!(total(&state), expected);
    }

    #[test]
    fn rows_are_canonical() {
        let rows = rows(&wallet());
        assert_eq!(rows.len(), 4);
        assert_eq!(
            rows[0],
            DenomRow {
                group: Group::Banknotes,
                denomination: 100,
                count: 2,
                subtotal: 200,
            }
        );
        assert_eq!(rows[3].group, Group::Coins);
        assert_eq!(rows[3].denomination, 5);
    }

    #[test]
    fn diff_of_identical_counts_is_empty() {
        let counts = wallet().counts().clone();
        assert!(diff(&counts, &counts).is_empty());
    }

    #[test]
    fn diff_omits_unchanged_and_is_antisymmetric() {
        let a = Counts::new()
            .with(Group::Banknotes, 100, 2)
            .with(Group::Banknotes, 50, 1)
            .with(Group::Coins, 10, 0);
        let b = Counts::new()
            .with(Group::Banknotes, 100, 1)
            .with(Group::Banknotes, 50, 1)
            .with(Group::Coins, 5, 3);

        let forward = diff(&a, &b);
        assert_eq!(
            forward,
            Delta::new()
                .with(Group::Banknotes, 100, -1)
                .with(Group::Coins, 5, 3)
        );
        assert_eq!(diff(&b, &a), forward.negated());
    }
}
