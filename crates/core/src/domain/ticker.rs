use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MAX_LEN: usize = 12;

/// Exchange symbol as understood by the market-data and news providers
/// (`SPY`, `BRK-B`, `^VIX`, `EURUSD=X`). Always upper-case once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TickerError {
    #[error("ticker must be non-empty")]
    Empty,

    #[error("ticker too long (max 12 chars): {0}")]
    TooLong(String),

    #[error("ticker {ticker:?} contains unsupported character {ch:?}")]
    InvalidChar { ticker: String, ch: char },
}

impl Ticker {
    pub fn parse(raw: &str) -> Result<Self, TickerError> {
        let symbol = raw.trim().to_ascii_uppercase();
        if symbol.is_empty() {
            return Err(TickerError::Empty);
        }
        if symbol.chars().count() > MAX_LEN {
            return Err(TickerError::TooLong(symbol));
        }
        if let Some(ch) = symbol.chars().find(|c| !is_symbol_char(*c)) {
            return Err(TickerError::InvalidChar { ticker: symbol, ch });
        }
        Ok(Self(symbol))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=')
}

impl FromStr for Ticker {
    type Err = TickerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Ticker {
    type Error = TickerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Ticker> for String {
    fn from(value: Ticker) -> Self {
        value.0
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
