use serde::{Deserialize, Serialize};

/// Currency used when neither the record nor the settings provide one.
pub const DEFAULT_CURRENCY: &str = "RUB";

/// ISO 4217-like currency code attached to a wallet.
///
/// The code is display-only: the engine never converts between currencies.
/// It is always trimmed and uppercased, and never empty.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Builds a code from raw input; `None` if nothing is left after trimming.
    #[must_use]
    pub fn new(raw: &str) -> Option<Self> {
        let code = raw.trim().to_uppercase();
        (!code.is_empty()).then_some(Self(code))
    }

    /// Builds a code from raw input, falling back to `fallback` when empty.
    #[must_use]
    pub fn or(raw: &str, fallback: &CurrencyCode) -> Self {
        Self::new(raw).unwrap_or_else(|| fallback.clone())
    }

    /// Canonical currency code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.0
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self(DEFAULT_CURRENCY.to_string())
    }
}

impl core::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}
