//! Normalization of raw records into well-formed engine values.
//!
//! Stored records are untyped JSON. The normalizer turns them into a
//! [`WalletState`] or a [`LogEntry`], or fails with a [`SchemaError`] naming
//! the field and the violated constraint.
//!
//! Wallet normalization deliberately repairs what it can:
//!
//! - invalid denominations are dropped, duplicates collapsed, lists sorted
//!   descending; an empty list falls back to the defaults;
//! - counts are read for exactly the normalized denominations; anything that
//!   is not a non-negative integer becomes 0, unknown keys are dropped;
//! - blank currency falls back to the configured default;
//! - plan and goal numbers that are not valid become 0.
//!
//! Only structural problems (wrong record tag, unsupported schema version,
//! a group that is not a list/object) are errors. Unknown fields are ignored.

use serde_json::{Map, Value};

use crate::{
    Counts, CurrencyCode, Delta, Denomination, DenominationSet, Group, LogEntry, OperationKind,
    SchemaError,
    ledger::LOG_RECORD_TAG,
    util::parse_timestamp,
    wallet::{DEFAULT_GOAL_DEADLINE, Goal, Plan, SCHEMA_VERSION, WALLET_RECORD_TAG, WalletState},
};

const WALLET: &str = "wallet";
const LOG: &str = "log";

/// Normalize a raw wallet record.
///
/// Normalizing the output of [`WalletState::to_record`] yields the same
/// state again.
pub fn parse_wallet(raw: &Value, default_currency: &CurrencyCode) -> Result<WalletState, SchemaError> {
    let record = as_record(raw, WALLET, "root")?;
    check_record_tag(record, WALLET, WALLET_RECORD_TAG)?;
    check_schema_version(record, WALLET)?;

    let currency = match record.get("currency") {
        Some(Value::String(code)) => CurrencyCode::or(code, default_currency),
        _ => default_currency.clone(),
    };

    let denoms_source = optional_record(record, WALLET, "denoms")?;
    let denoms = DenominationSet::new(
        denomination_list(denoms_source, Group::Banknotes)?,
        denomination_list(denoms_source, Group::Coins)?,
    );

    let counts_source = optional_record(record, WALLET, "counts")?;
    let mut counts = Counts::new();
    for group in Group::ALL {
        let path = format!("counts.{group}");
        let source = match counts_source {
            Some(source) => optional_record(source, WALLET, &path)?,
            None => None,
        };
        for denomination in denoms.group(group) {
            let count = source
                .and_then(|map| map.get(&denomination.to_string()))
                .and_then(non_negative_int)
                .unwrap_or(0);
            counts.group_mut(group).insert(*denomination, count);
        }
    }

    let plan = match optional_record(record, WALLET, "plan")? {
        Some(plan) => Plan {
            monthly: plan.get("monthly").and_then(non_negative_number).unwrap_or(0.0),
            months: plan.get("months").and_then(non_negative_int).unwrap_or(0),
        },
        None => Plan::default(),
    };

    let goal = optional_record(record, WALLET, "goal")?.map(|goal| Goal {
        target: goal.get("target").and_then(non_negative_number).unwrap_or(0.0),
        deadline: goal
            .get("deadline")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|deadline| !deadline.is_empty())
            .unwrap_or(DEFAULT_GOAL_DEADLINE)
            .to_string(),
    });

    Ok(WalletState {
        currency,
        denoms,
        counts,
        plan,
        goal,
    })
}

/// Validate and normalize a raw log record.
///
/// Log records are evidence, not state, so nothing is repaired here except
/// the missing `id` (derived from `ts` and `kind`) and a missing comment.
pub fn parse_log_record(raw: &Value) -> Result<LogEntry, SchemaError> {
    let record = as_record(raw, LOG, "root")?;
    check_record_tag(record, LOG, LOG_RECORD_TAG)?;
    check_schema_version(record, LOG)?;

    let wallet = required_text(record, "wallet")?;

    let ts = required_text(record, "ts")?;
    if parse_timestamp(&ts).is_none() {
        return Err(SchemaError::new(LOG, "ts", "expected a valid ISO date-time"));
    }

    let kind = match record.get("kind").and_then(Value::as_str) {
        Some(kind) => OperationKind::try_from(kind).map_err(|_| {
            SchemaError::new(LOG, "kind", "expected one of deposit, withdraw, set")
        })?,
        None => {
            return Err(SchemaError::new(
                LOG,
                "kind",
                "expected one of deposit, withdraw, set",
            ));
        }
    };

    let delta_source = optional_record(record, LOG, "delta")?;
    let mut delta = Delta::new();
    for group in Group::ALL {
        let path = format!("delta.{group}");
        let Some(source) = delta_source
            .map(|map| optional_record(map, LOG, &path))
            .transpose()?
            .flatten()
        else {
            continue;
        };
        for (key, value) in source {
            let denomination = key
                .trim()
                .parse::<Denomination>()
                .ok()
                .filter(|d| *d > 0)
                .ok_or_else(|| {
                    SchemaError::new(LOG, format!("{path}.{key}"), "expected a positive integer key")
                })?;
            let change = integer(value).ok_or_else(|| {
                SchemaError::new(LOG, format!("{path}.{key}"), "expected an integer")
            })?;
            delta.group_mut(group).insert(denomination, change);
        }
    }

    let total_before = match record.get("total_before") {
        None | Some(Value::Null) => None,
        Some(value) => Some(non_negative_int(value).ok_or_else(|| {
            SchemaError::new(LOG, "total_before", "expected a non-negative integer")
        })?),
    };
    let total_after = record
        .get("total_after")
        .and_then(non_negative_int)
        .ok_or_else(|| SchemaError::new(LOG, "total_after", "expected a non-negative integer"))?;

    let comment = match record.get("comment") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(comment)) => comment.clone(),
        Some(_) => return Err(SchemaError::new(LOG, "comment", "expected a string")),
    };

    let id = record
        .get("id")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ToString::to_string)
        .unwrap_or_else(|| format!("{ts}_{kind}"));

    Ok(LogEntry {
        id,
        wallet,
        ts,
        kind,
        delta,
        total_before,
        total_after,
        comment,
    })
}

fn as_record<'a>(
    value: &'a Value,
    entity: &'static str,
    path: &str,
) -> Result<&'a Map<String, Value>, SchemaError> {
    value
        .as_object()
        .ok_or_else(|| SchemaError::new(entity, path, "expected an object"))
}

/// A nested object that may be absent (or `null`), but not of another type.
fn optional_record<'a>(
    parent: &'a Map<String, Value>,
    entity: &'static str,
    path: &str,
) -> Result<Option<&'a Map<String, Value>>, SchemaError> {
    let key = path.rsplit('.').next().unwrap_or(path);
    match parent.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => as_record(value, entity, path).map(Some),
    }
}

fn check_record_tag(
    record: &Map<String, Value>,
    entity: &'static str,
    tag: &str,
) -> Result<(), SchemaError> {
    match record.get("type") {
        None | Some(Value::Null) => Ok(()),
        Some(Value::String(found)) if found == tag => Ok(()),
        Some(_) => Err(SchemaError::new(entity, "type", format!("expected \"{tag}\""))),
    }
}

/// Missing, null or blank versions are version 1, as are numbers below it.
fn check_schema_version(record: &Map<String, Value>, entity: &'static str) -> Result<(), SchemaError> {
    let version = match record.get("schema_version") {
        None | Some(Value::Null) => return Ok(()),
        Some(Value::String(text)) if text.trim().is_empty() => return Ok(()),
        Some(value) => number(value)
            .ok_or_else(|| SchemaError::new(entity, "schema_version", "expected a number"))?,
    };
    if version > SCHEMA_VERSION as f64 {
        return Err(SchemaError::new(
            entity,
            "schema_version",
            format!("unsupported schema version {version} (supported: {SCHEMA_VERSION})"),
        ));
    }
    Ok(())
}

fn denomination_list(
    source: Option<&Map<String, Value>>,
    group: Group,
) -> Result<Vec<Denomination>, SchemaError> {
    let Some(value) = source.and_then(|map| map.get(group.as_str())) else {
        return Ok(Vec::new());
    };
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items.iter().filter_map(non_negative_int).collect()),
        _ => Err(SchemaError::new(
            WALLET,
            format!("denoms.{group}"),
            "expected an array",
        )),
    }
}

fn required_text(record: &Map<String, Value>, key: &str) -> Result<String, SchemaError> {
    record
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| SchemaError::new(LOG, key, "expected a non-empty string"))
}

/// Numeric reading of a JSON number or a numeric string.
fn number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

fn non_negative_number(value: &Value) -> Option<f64> {
    number(value).filter(|n| *n >= 0.0)
}

fn non_negative_int(value: &Value) -> Option<u64> {
    if let Some(exact) = value.as_u64() {
        return Some(exact);
    }
    let parsed = non_negative_number(value)?;
    (parsed.fract() == 0.0 && parsed <= u64::MAX as f64).then_some(parsed as u64)
}

fn integer(value: &Value) -> Option<i64> {
    if let Some(exact) = value.as_i64() {
        return Some(exact);
    }
    let parsed = number(value)?;
    (parsed.fract() == 0.0 && parsed.abs() <= i64::MAX as f64).then_some(parsed as i64)
}
