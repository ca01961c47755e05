//! Operations on a wallet and the pure engine that applies them.

use serde::{Deserialize, Serialize};

use crate::{
    Counts, Delta, Denomination, EngineError, Group, ResultEngine, WalletState, calculator::diff,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Deposit,
    Withdraw,
    Set,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdraw => "withdraw",
            Self::Set => "set",
        }
    }
}

impl core::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for OperationKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "deposit" => Ok(Self::Deposit),
            "withdraw" => Ok(Self::Withdraw),
            "set" => Ok(Self::Set),
            other => Err(EngineError::KeyNotFound(format!(
                "operation kind {other}"
            ))),
        }
    }
}

/// A request to change a wallet's counts.
///
/// Deposits and withdrawals carry a per-denomination delta, `set` carries
/// absolute counts. Missing entries inside a payload count as 0.
#[derive(Clone, Debug, PartialEq)]
pub struct OperationInput {
    pub kind: OperationKind,
    pub counts_delta: Option<Delta>,
    pub counts_absolute: Option<Counts>,
    pub comment: Option<String>,
    pub log_id: Option<String>,
}

impl OperationInput {
    #[must_use]
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            counts_delta: None,
            counts_absolute: None,
            comment: None,
            log_id: None,
        }
    }

    #[must_use]
    pub fn deposit(delta: Delta) -> Self {
        Self::new(OperationKind::Deposit).counts_delta(delta)
    }

    #[must_use]
    pub fn withdraw(delta: Delta) -> Self {
        Self::new(OperationKind::Withdraw).counts_delta(delta)
    }

    #[must_use]
    pub fn set(counts: Counts) -> Self {
        Self::new(OperationKind::Set).counts_absolute(counts)
    }

    #[must_use]
    pub fn counts_delta(mut self, delta: Delta) -> Self {
        self.counts_delta = Some(delta);
        self
    }

    #[must_use]
    pub fn counts_absolute(mut self, counts: Counts) -> Self {
        self.counts_absolute = Some(counts);
        self
    }

    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Use a caller-chosen id for the log entry of this operation.
    #[must_use]
    pub fn log_id(mut self, id: impl Into<String>) -> Self {
        self.log_id = Some(id.into());
        self
    }
}

/// Result of applying an operation: the next state and what changed.
#[derive(Clone, Debug, PartialEq)]
pub struct Applied {
    pub next: WalletState,
    pub delta: Delta,
}

/// Apply `op` to `state`.
///
/// Only the wallet's own denominations are touched; payload entries for
/// other denominations are ignored. All candidate counts are computed first
/// and the operation fails as a whole if any of them would be negative, so
/// the input state is never partially changed. A count, or a change, that
/// does not fit its integer type fails with [`EngineError::CountOverflow`].
pub fn apply(state: &WalletState, op: &OperationInput) -> ResultEngine<Applied> {
    if op.kind == OperationKind::Set && op.counts_absolute.is_none() {
        return Err(EngineError::MissingPayload);
    }

    let current = state.counts();
    let mut candidate = Counts::new();
    for (group, denomination) in state.denoms().iter() {
        let prev = i128::from(current.get(group, denomination));
        let next = match op.kind {
            OperationKind::Deposit => prev + payload_change(op, group, denomination),
            OperationKind::Withdraw => prev - payload_change(op, group, denomination),
            OperationKind::Set => op
                .counts_absolute
                .as_ref()
                .map_or(0, |counts| i128::from(counts.get(group, denomination))),
        };
        if next < 0 {
            return Err(EngineError::NegativeCount {
                group,
                denomination,
            });
        }
        let overflow = || EngineError::CountOverflow {
            group,
            denomination,
        };
        // The change must fit the log delta as well as the count itself.
        i64::try_from(next - prev).map_err(|_| overflow())?;
        let next = u64::try_from(next).map_err(|_| overflow())?;
        candidate.group_mut(group).insert(denomination, next);
    }

    let delta = diff(current, &candidate);
    Ok(Applied {
        next: state.with_counts(candidate),
        delta,
    })
}

fn payload_change(op: &OperationInput, group: Group, denomination: Denomination) -> i128 {
    op.counts_delta
        .as_ref()
        .map_or(0, |delta| i128::from(delta.get(group, denomination)))
}
