use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An instrument found through the broker's search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub uid: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub ticker: String,

    /// Trading board code (e.g. "TQBR").
    #[serde(default)]
    pub class_code: String,

    #[serde(default)]
    pub instrument_type: String,
}

/// Broker money value: whole `units` plus `nano` billionths.
/// `units` arrives as a JSON string in the broker's REST gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoneyValue {
    #[serde(default)]
    pub currency: String,

    #[serde(default)]
    pub units: serde_json::Value,

    #[serde(default)]
    pub nano: i64,
}

impl MoneyValue {
    pub fn to_f64(&self) -> f64 {
        let whole = match &self.units {
            serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
            serde_json::Value::String(s) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        };
        whole + self.nano as f64 / 1_000_000_000.0
    }
}

/// Raw dividend record as returned by the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DividendRecord {
    pub dividend_net: MoneyValue,

    /// RFC 3339 timestamp of the last day to buy and still receive the payout.
    #[serde(default)]
    pub last_buy_date: String,
}

/// A single upcoming payout, normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividendEntry {
    pub last_buy_date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividendSchedule {
    pub instrument_name: String,
    pub entries: Vec<DividendEntry>,
}
