//! The module contains `WalletState` and the `wallets` storage entity.

use sea_orm::entity::prelude::*;
use serde::Serialize;
use serde_json::json;

use crate::{
    Counts, CurrencyCode, DenominationSet, EngineError, ResultEngine, util::parse_timestamp,
};

/// Record tag of a persisted wallet.
pub const WALLET_RECORD_TAG: &str = "cash_wallet";
/// The only schema version this engine reads and writes.
pub const SCHEMA_VERSION: u64 = 1;
/// Deadline given to a goal whose stored deadline is blank.
pub const DEFAULT_GOAL_DEADLINE: &str = "2026-12-31";

/// Linear savings plan: put `monthly` aside for `months` months.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Plan {
    pub monthly: f64,
    pub months: u64,
}

impl Plan {
    /// Validate user input for a plan.
    pub fn new(monthly: f64, months: u64) -> ResultEngine<Self> {
        if !monthly.is_finite() || monthly < 0.0 {
            return Err(EngineError::InvalidAmount(
                "monthly must be a non-negative number".to_string(),
            ));
        }
        Ok(Self { monthly, months })
    }
}

/// Savings target to reach by a deadline.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Goal {
    pub target: f64,
    pub deadline: String,
}

impl Goal {
    /// Validate user input for a goal.
    ///
    /// Returns `Ok(None)` when the input clears the goal (zero target, no
    /// deadline).
    pub fn new(target: f64, deadline: &str) -> ResultEngine<Option<Self>> {
        let deadline = deadline.trim();
        if !target.is_finite() || target < 0.0 {
            return Err(EngineError::InvalidAmount(
                "target must be a non-negative number".to_string(),
            ));
        }
        if target > 0.0 && deadline.is_empty() {
            return Err(EngineError::InvalidAmount(
                "deadline is required when target is greater than 0".to_string(),
            ));
        }
        if deadline.is_empty() {
            return Ok(None);
        }
        if parse_timestamp(deadline).is_none() {
            return Err(EngineError::InvalidAmount(format!(
                "deadline must be a valid date: {deadline}"
            )));
        }
        Ok(Some(Self {
            target,
            deadline: deadline.to_string(),
        }))
    }
}

/// Current cash holdings of a wallet.
///
/// A `WalletState` is only built by the normalizer or as the default
/// instance, so its counts always have exactly one key per denomination. It
/// is never mutated: operations produce a new value.
#[derive(Clone, Debug, PartialEq)]
pub struct WalletState {
    pub(crate) currency: CurrencyCode,
    pub(crate) denoms: DenominationSet,
    pub(crate) counts: Counts,
    pub(crate) plan: Plan,
    pub(crate) goal: Option<Goal>,
}

impl WalletState {
    /// The canonical default wallet: default denominations, zero counts, an
    /// empty plan and no goal.
    pub fn default_for(currency: CurrencyCode) -> Self {
        let denoms = DenominationSet::default();
        Self {
            currency,
            counts: Counts::zeroed(&denoms),
            denoms,
            plan: Plan::default(),
            goal: None,
        }
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }

    pub fn denoms(&self) -> &DenominationSet {
        &self.denoms
    }

    pub fn counts(&self) -> &Counts {
        &self.counts
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn goal(&self) -> Option<&Goal> {
        self.goal.as_ref()
    }

    /// Same wallet with other counts. Callers pass counts keyed by this
    /// wallet's denominations.
    pub(crate) fn with_counts(&self, counts: Counts) -> Self {
        Self {
            counts,
            ..self.clone()
        }
    }

    /// The persisted layout of this wallet.
    pub fn to_record(&self) -> serde_json::Value {
        let mut record = json!({
            "type": WALLET_RECORD_TAG,
            "schema_version": SCHEMA_VERSION,
            "currency": self.currency,
            "denoms": self.denoms,
            "counts": self.counts,
            "plan": self.plan,
        });
        if let (Some(goal), Some(map)) = (&self.goal, record.as_object_mut()) {
            map.insert("goal".to_string(), json!(goal));
        }
        record
    }
}

/// Stored wallet document. `id` is the wallet reference and `document` the
/// raw JSON record, unknown fields included.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub document: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
