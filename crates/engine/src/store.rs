//! Storage collaborators and the sqlite-backed document store.
//!
//! The engine talks to storage only through [`WalletStore`] and
//! [`LedgerStore`]. [`SqliteStore`] implements both over a sea-orm
//! connection, keeping every record as a raw JSON document so fields the
//! engine does not know about survive a round trip.

use std::future::Future;

use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, DatabaseConnection, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
    sea_query::Expr,
};
use serde_json::{Map, Value};

use crate::{
    CurrencyCode, EngineError, LogEntry, ResultEngine, SchemaError, WalletState, ledger,
    schema::{parse_log_record, parse_wallet},
    util::{format_timestamp, log_stem, parse_timestamp},
    wallet,
};

/// Wallet reference used when none is configured.
pub const DEFAULT_WALLET_REF: &str = "main";

/// Raw wallet document handed to [`WalletStore::update_wallet`] mutations.
pub type Document = Map<String, Value>;

/// Read and partially update the current wallet.
pub trait WalletStore: Send + Sync {
    /// Reference of the wallet this store serves.
    fn wallet_ref(&self) -> &str;

    /// Load and normalize the current wallet.
    fn load_wallet(&self) -> impl Future<Output = ResultEngine<WalletState>> + Send;

    /// Apply `mutate` to the stored document and return the reloaded,
    /// normalized wallet.
    fn update_wallet<F>(&self, mutate: F) -> impl Future<Output = ResultEngine<WalletState>> + Send
    where
        F: FnOnce(&mut Document) + Send;

    /// Replace the document with the default wallet and return it.
    ///
    /// This is the recovery path for a document that no longer normalizes;
    /// unknown fields are dropped.
    fn reset_wallet(&self) -> impl Future<Output = ResultEngine<WalletState>> + Send;
}

/// Append-only storage of log entries.
pub trait LedgerStore: Send + Sync {
    /// Where an appended entry ended up.
    type Handle: Clone + core::fmt::Debug + Send;

    fn append_log(&self, entry: &LogEntry) -> impl Future<Output = ResultEngine<Self::Handle>> + Send;

    /// Entries of `wallet_ref`, newest first, at most `limit`.
    fn list_recent_logs(
        &self,
        limit: usize,
        wallet_ref: &str,
    ) -> impl Future<Output = ResultEngine<Vec<LogEntry>>> + Send;
}

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

#[derive(Debug, Clone)]
pub struct SqliteStore {
    database: DatabaseConnection,
    wallet_ref: String,
    default_currency: CurrencyCode,
}

impl SqliteStore {
    /// Return a builder for `SqliteStore`. Help to build the struct.
    pub fn builder() -> SqliteStoreBuilder {
        SqliteStoreBuilder::default()
    }

    /// Read the raw document, creating the default one if missing.
    async fn read_document<C: ConnectionTrait>(&self, db: &C) -> ResultEngine<Document> {
        let model = wallet::Entity::find_by_id(self.wallet_ref.clone())
            .one(db)
            .await?;
        let text = match model {
            Some(model) => model.document,
            None => {
                let document = WalletState::default_for(self.default_currency.clone())
                    .to_record()
                    .to_string();
                wallet::ActiveModel {
                    id: ActiveValue::Set(self.wallet_ref.clone()),
                    document: ActiveValue::Set(document.clone()),
                    updated_at: ActiveValue::Set(format_timestamp(Utc::now())),
                }
                .insert(db)
                .await?;
                tracing::info!(wallet = %self.wallet_ref, "created default wallet document");
                document
            }
        };
        match serde_json::from_str(&text)? {
            Value::Object(document) => Ok(document),
            _ => Err(SchemaError::new("wallet", "root", "expected an object").into()),
        }
    }

    async fn location_taken<C: ConnectionTrait>(&self, db: &C, location: &str) -> ResultEngine<bool> {
        Ok(ledger::Entity::find()
            .filter(ledger::Column::Location.eq(location))
            .one(db)
            .await?
            .is_some())
    }
}

impl WalletStore for SqliteStore {
    fn wallet_ref(&self) -> &str {
        &self.wallet_ref
    }

    async fn load_wallet(&self) -> ResultEngine<WalletState> {
        let document = self.read_document(&self.database).await?;
        Ok(parse_wallet(&Value::Object(document), &self.default_currency)?)
    }

    async fn update_wallet<F>(&self, mutate: F) -> ResultEngine<WalletState>
    where
        F: FnOnce(&mut Document) + Send,
    {
        let result: ResultEngine<()> = with_tx!(self, |db_tx| {
            let mut document = self.read_document(&db_tx).await?;
            mutate(&mut document);
            wallet::ActiveModel {
                id: ActiveValue::Set(self.wallet_ref.clone()),
                document: ActiveValue::Set(Value::Object(document).to_string()),
                updated_at: ActiveValue::Set(format_timestamp(Utc::now())),
            }
            .update(&db_tx)
            .await?;
            Ok(())
        });
        result?;
        self.load_wallet().await
    }

    async fn reset_wallet(&self) -> ResultEngine<WalletState> {
        let default = WalletState::default_for(self.default_currency.clone());
        let document = default.to_record().to_string();
        let result: ResultEngine<()> = with_tx!(self, |db_tx| {
            let exists = wallet::Entity::find_by_id(self.wallet_ref.clone())
                .one(&db_tx)
                .await?
                .is_some();
            let model = wallet::ActiveModel {
                id: ActiveValue::Set(self.wallet_ref.clone()),
                document: ActiveValue::Set(document),
                updated_at: ActiveValue::Set(format_timestamp(Utc::now())),
            };
            if exists {
                model.update(&db_tx).await?;
            } else {
                model.insert(&db_tx).await?;
            }
            Ok(())
        });
        result?;
        tracing::info!(wallet = %self.wallet_ref, "wallet reset to defaults");
        self.load_wallet().await
    }
}

impl LedgerStore for SqliteStore {
    /// The unique `location` key of the stored record.
    type Handle = String;

    async fn append_log(&self, entry: &LogEntry) -> ResultEngine<String> {
        let entry = parse_log_record(&entry.to_record())?;
        let stem = log_stem(&entry.ts, entry.kind.as_str());
        let ts = parse_timestamp(&entry.ts)
            .map(format_timestamp)
            .unwrap_or_else(|| entry.ts.clone());

        with_tx!(self, |db_tx| {
            let mut suffix = 0u32;
            let location = loop {
                let candidate = if suffix == 0 {
                    stem.clone()
                } else {
                    format!("{stem}-{suffix}")
                };
                if !self.location_taken(&db_tx, &candidate).await? {
                    break candidate;
                }
                suffix += 1;
            };

            ledger::ActiveModel {
                id: ActiveValue::Set(entry.id.clone()),
                location: ActiveValue::Set(location.clone()),
                wallet: ActiveValue::Set(entry.wallet.clone()),
                ts: ActiveValue::Set(ts),
                kind: ActiveValue::Set(entry.kind.as_str().to_string()),
                document: ActiveValue::Set(entry.to_record().to_string()),
            }
            .insert(&db_tx)
            .await?;
            Ok::<_, EngineError>(location)
        })
    }

    async fn list_recent_logs(&self, limit: usize, wallet_ref: &str) -> ResultEngine<Vec<LogEntry>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let models = ledger::Entity::find()
            .filter(ledger::Column::Wallet.eq(wallet_ref.trim()))
            .order_by_desc(ledger::Column::Ts)
            .order_by_desc(Expr::cust("rowid"))
            .all(&self.database)
            .await?;

        let mut entries = Vec::new();
        for model in models {
            let parsed = serde_json::from_str::<Value>(&model.document)
                .map_err(EngineError::from)
                .and_then(|raw| parse_log_record(&raw).map_err(EngineError::from));
            match parsed {
                Ok(entry) => entries.push(entry),
                Err(err) => {
                    tracing::warn!(location = %model.location, "skipping unreadable log record: {err}");
                    continue;
                }
            }
            if entries.len() >= limit {
                break;
            }
        }
        Ok(entries)
    }
}

/// The builder for `SqliteStore`
#[derive(Default)]
pub struct SqliteStoreBuilder {
    database: DatabaseConnection,
    wallet_ref: Option<String>,
    currency: Option<CurrencyCode>,
}

impl SqliteStoreBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> SqliteStoreBuilder {
        self.database = db;
        self
    }

    /// Wallet reference; blank falls back to [`DEFAULT_WALLET_REF`].
    pub fn wallet_ref(mut self, wallet_ref: &str) -> SqliteStoreBuilder {
        let trimmed = wallet_ref.trim();
        self.wallet_ref = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    /// Currency for wallets whose record has none.
    pub fn currency(mut self, currency: CurrencyCode) -> SqliteStoreBuilder {
        self.currency = Some(currency);
        self
    }

    /// Construct `SqliteStore`
    pub fn build(self) -> SqliteStore {
        SqliteStore {
            database: self.database,
            wallet_ref: self
                .wallet_ref
                .unwrap_or_else(|| DEFAULT_WALLET_REF.to_string()),
            default_currency: self.currency.unwrap_or_default(),
        }
    }
}
