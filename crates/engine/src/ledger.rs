//! Log records of committed operations and the `cash_logs` storage entity.

use sea_orm::entity::prelude::*;
use serde_json::json;

use crate::{Delta, OperationKind, util::parse_timestamp, wallet::SCHEMA_VERSION};

/// Record tag of a persisted log entry.
pub const LOG_RECORD_TAG: &str = "cash_log";

/// Immutable record of one committed operation.
///
/// Created exactly once per commit and never modified by the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub id: String,
    /// Reference of the wallet the operation was applied to.
    pub wallet: String,
    /// ISO 8601 timestamp of the commit.
    pub ts: String,
    pub kind: OperationKind,
    pub delta: Delta,
    pub total_before: Option<u64>,
    pub total_after: u64,
    pub comment: String,
}

impl LogEntry {
    /// The persisted layout of this entry.
    pub fn to_record(&self) -> serde_json::Value {
        let mut record = json!({
            "id": self.id,
            "type": LOG_RECORD_TAG,
            "schema_version": SCHEMA_VERSION,
            "wallet": self.wallet,
            "ts": self.ts,
            "kind": self.kind,
            "delta": self.delta,
            "total_after": self.total_after,
            "comment": self.comment,
        });
        if let (Some(total_before), Some(map)) = (self.total_before, record.as_object_mut()) {
            map.insert("total_before".to_string(), json!(total_before));
        }
        record
    }
}

/// A place where the totals of two consecutive entries do not line up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainBreak {
    pub previous_id: String,
    pub id: String,
    pub previous_total_after: u64,
    pub total_before: Option<u64>,
}

/// Replay `entries` in timestamp order and report every entry whose
/// `total_before` differs from the previous entry's `total_after`.
///
/// Entries without a `total_before` are reported too, since they cannot be
/// checked. Entries with an unparseable timestamp are ordered last; entries
/// with equal timestamps keep their input order.
pub fn verify_chain(entries: &[LogEntry]) -> Vec<ChainBreak> {
    let mut ordered: Vec<&LogEntry> = entries.iter().collect();
    ordered.sort_by_key(|entry| (parse_timestamp(&entry.ts).is_none(), parse_timestamp(&entry.ts)));

    ordered
        .windows(2)
        .filter_map(|pair| {
            let (previous, current) = (pair[0], pair[1]);
            (current.total_before != Some(previous.total_after)).then(|| ChainBreak {
                previous_id: previous.id.clone(),
                id: current.id.clone(),
                previous_total_after: previous.total_after,
                total_before: current.total_before,
            })
        })
        .collect()
}

/// Stored log record. `location` is the unique storage key derived from the
/// timestamp and kind; `document` is the full JSON record.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cash_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub location: String,
    pub wallet: String,
    pub ts: String,
    pub kind: String,
    pub document: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
