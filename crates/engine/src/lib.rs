//! Cash holdings ledger.
//!
//! A wallet holds counts of banknotes and coins per denomination. Every
//! change goes through the [`CommitQueue`], which applies one
//! [`OperationInput`] at a time, persists the new counts and appends a
//! [`LogEntry`] describing the change.
//!
//! Storage is abstracted by [`WalletStore`] and [`LedgerStore`];
//! [`SqliteStore`] implements both on top of sea-orm.

pub use counts::{Breakdown, Counts, Delta, PerGroup};
pub use currency::{CurrencyCode, DEFAULT_CURRENCY};
pub use denominations::{DEFAULT_BANKNOTES, DEFAULT_COINS, Denomination, DenominationSet, Group};
pub use error::{EngineError, SchemaError};
pub use ledger::{ChainBreak, LogEntry, verify_chain};
pub use operation::{Applied, OperationInput, OperationKind, apply};
pub use queue::{CommitQueue, Committed};
pub use store::{DEFAULT_WALLET_REF, Document, LedgerStore, SqliteStore, WalletStore};
pub use wallet::{Goal, Plan, WalletState};

pub mod calculator;
mod counts;
mod currency;
mod denominations;
mod error;
pub mod ledger;
mod operation;
pub mod projection;
mod queue;
pub mod schema;
mod store;
mod util;
pub mod wallet;

pub type ResultEngine<T> = Result<T, EngineError>;
