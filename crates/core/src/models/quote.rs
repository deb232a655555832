use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A resolved live price for one ticker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub price: f64,

    /// Day change in percent (`LASTTOPREVPRICE`), when the board reports one.
    pub change_percent: Option<f64>,
}

/// Top-level ISS document for `iss.only=marketdata`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssResponse {
    #[serde(default)]
    pub marketdata: MarketDataBlock,
}

/// Column-oriented `marketdata` block: `columns` names the fields, each row
/// in `data` holds the values in the same order. Column sets differ between
/// board types, so fields are always looked up by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketDataBlock {
    #[serde(default)]
    pub columns: Vec<String>,

    #[serde(default)]
    pub data: Vec<Vec<Value>>,
}

impl MarketDataBlock {
    pub fn new(columns: &[&str], data: Vec<Vec<Value>>) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            data,
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Numeric value of `column` in the first data row.
    ///
    /// Accepts JSON numbers and numeric strings; `null`, missing cells and
    /// anything unparsable yield `None`.
    pub fn first_row_number(&self, column: &str) -> Option<f64> {
        let idx = self.column_index(column)?;
        let cell = self.data.first()?.get(idx)?;
        match cell {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Result of a single `fetch_price` call. Fetching never fails loudly:
/// the outcome is also recorded in the fetcher's cache/error maps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FetchOutcome {
    /// A board produced a usable row; the cache now holds this quote.
    Fetched(Quote),
    /// Another fetch for the same ticker was in flight; nothing was done.
    AlreadyLoading,
    /// Every board failed; `PRICE_NOT_FOUND` was recorded for the ticker.
    NotFound,
    /// Blank ticker.
    Skipped,
}

impl FetchOutcome {
    pub fn quote(&self) -> Option<Quote> {
        match self {
            FetchOutcome::Fetched(q) => Some(*q),
            _ => None,
        }
    }
}
