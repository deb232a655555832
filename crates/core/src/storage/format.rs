use serde_json::Value;
use uuid::Uuid;

use crate::models::deposit::Deposit;
use crate::models::exchange_asset::ExchangeAsset;

/// Storage key for the deposits array.
pub const DEPOSITS_KEY: &str = "deposits-store:v1";

/// Storage key for the exchange assets array.
pub const ASSETS_KEY: &str = "assets-store:v1";

/// Rebuild a list of records from an untrusted JSON document.
///
/// A document that is not an array yields an empty list; non-object entries
/// are skipped; each remaining entry is coerced field by field.
pub fn coerce_list<T>(document: &Value, coerce: impl Fn(&Value) -> Option<T>) -> Vec<T> {
    match document {
        Value::Array(entries) => entries.iter().filter_map(coerce).collect(),
        _ => Vec::new(),
    }
}

/// Coerce one stored deposit. Missing or malformed fields fall back to an
/// empty string or zero instead of rejecting the record.
pub fn coerce_deposit(value: &Value) -> Option<Deposit> {
    let obj = value.as_object()?;
    Some(Deposit {
        id: coerce_id(obj.get("id")),
        name: coerce_string(obj.get("name")),
        end_date: coerce_string(obj.get("endDate")),
        amount: coerce_number(obj.get("amount")).max(0.0),
        rate_percent: coerce_number(obj.get("ratePercent")).max(0.0),
    })
}

/// Coerce one stored exchange asset; see [`coerce_deposit`].
pub fn coerce_exchange_asset(value: &Value) -> Option<ExchangeAsset> {
    let obj = value.as_object()?;
    Some(ExchangeAsset {
        id: coerce_id(obj.get("id")),
        name: coerce_string(obj.get("name")),
        ticker: coerce_opt_string(obj.get("ticker")),
        category: coerce_string(obj.get("category")),
        sector: coerce_string(obj.get("sector")),
        quantity: coerce_number(obj.get("quantity")).max(0.0),
        board_name: coerce_opt_string(obj.get("boardName")),
        price: coerce_opt_number(obj.get("price")),
        total_price: coerce_opt_number(obj.get("totalPrice")),
        change_percent: coerce_opt_number(obj.get("changePercent")),
        comment: coerce_string(obj.get("comment")),
        error_reason: coerce_opt_string(obj.get("errorReason")),
    })
}

fn coerce_id(value: Option<&Value>) -> String {
    coerce_opt_string(value).unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Strings pass through; numbers and booleans are stringified; anything
/// else becomes "".
pub fn coerce_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

pub fn coerce_opt_string(value: Option<&Value>) -> Option<String> {
    Some(coerce_string(value)).filter(|s| !s.trim().is_empty())
}

/// Numbers and numeric strings pass through when finite; anything else is 0.
pub fn coerce_number(value: Option<&Value>) -> f64 {
    coerce_opt_number(value).unwrap_or(0.0)
}

pub fn coerce_opt_number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}
