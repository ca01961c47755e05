//! Handles settings for the application. Configuration is written in
//! `settings.toml` and can be overridden with `CASHBOX_*` environment
//! variables, using `__` between nested keys (`CASHBOX_WALLET__NAME`).
use config::{Config, Environment, File};
use engine::{CurrencyCode, DEFAULT_WALLET_REF};
use serde::Deserialize;

use crate::error::Result;

pub const DEFAULT_SETTINGS_PATH: &str = "settings.toml";
const DEFAULT_DATABASE_PATH: &str = "cashbox.db";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Default for Database {
    fn default() -> Self {
        Self::Sqlite(DEFAULT_DATABASE_PATH.to_string())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Wallet {
    pub name: String,
    pub currency: String,
}

impl Default for Wallet {
    fn default() -> Self {
        Self {
            name: DEFAULT_WALLET_REF.to_string(),
            currency: CurrencyCode::default().code().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub database: Database,
    pub wallet: Wallet,
}

impl Settings {
    /// Read `path` (optional file) and the environment.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(path.unwrap_or(DEFAULT_SETTINGS_PATH)).required(false))
            .add_source(
                Environment::with_prefix("CASHBOX")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;
        Self::from_config(settings)
    }

    fn from_config(config: Config) -> Result<Self> {
        let settings: Settings = config.try_deserialize()?;
        Ok(settings.normalized())
    }

    /// Blank values fall back to their defaults.
    fn normalized(mut self) -> Self {
        let defaults = Settings::default();

        let level = self.app.level.trim();
        self.app.level = if level.is_empty() {
            defaults.app.level
        } else {
            level.to_lowercase()
        };

        let name = self.wallet.name.trim();
        self.wallet.name = if name.is_empty() {
            defaults.wallet.name
        } else {
            name.to_string()
        };

        self.wallet.currency = CurrencyCode::or(&self.wallet.currency, &CurrencyCode::default())
            .code()
            .to_string();

        if let Database::Sqlite(path) = &self.database
            && path.trim().is_empty()
        {
            self.database = defaults.database;
        }

        self
    }

    pub fn currency(&self) -> CurrencyCode {
        CurrencyCode::or(&self.wallet.currency, &CurrencyCode::default())
    }
}
