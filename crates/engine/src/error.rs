//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`Schema`] thrown when a stored record cannot be normalized.
//! - [`NegativeCount`] thrown when an operation would leave a denomination
//!   with a negative count.
//! - [`MissingPayload`] thrown when a `set` operation has no absolute counts.
//!
//!  [`Schema`]: EngineError::Schema
//!  [`NegativeCount`]: EngineError::NegativeCount
//!  [`MissingPayload`]: EngineError::MissingPayload
use sea_orm::DbErr;
use thiserror::Error;

use crate::{Denomination, Group};

/// A record failed normalization.
///
/// `path` is the dot-joined field path (`root` for the record itself) and
/// `constraint` describes what the field violated.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("invalid {entity}: {path}: {constraint}")]
pub struct SchemaError {
    pub entity: &'static str,
    pub path: String,
    pub constraint: String,
}

impl SchemaError {
    pub fn new(
        entity: &'static str,
        path: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self {
            entity,
            path: path.into(),
            constraint: constraint.into(),
        }
    }
}

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("Negative count is not allowed for {group} {denomination}")]
    NegativeCount {
        group: Group,
        denomination: Denomination,
    },
    #[error("Set operation requires an absolute counts payload")]
    MissingPayload,
    #[error("Count overflow for {group} {denomination}")]
    CountOverflow {
        group: Group,
        denomination: Denomination,
    },
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("commit task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Schema(a), Self::Schema(b)) => a == b,
            (
                Self::NegativeCount {
                    group: ga,
                    denomination: da,
                },
                Self::NegativeCount {
                    group: gb,
                    denomination: db,
                },
            ) => ga == gb && da == db,
            (Self::MissingPayload, Self::MissingPayload) => true,
            (
                Self::CountOverflow {
                    group: ga,
                    denomination: da,
                },
                Self::CountOverflow {
                    group: gb,
                    denomination: db,
                },
            ) => ga == gb && da == db,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            (Self::Json(a), Self::Json(b)) => a.to_string() == b.to_string(),
            (Self::Task(a), Self::Task(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
