use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::errors::CoreError;
use crate::models::deposit::Deposit;
use crate::models::exchange_asset::ExchangeAsset;

use super::format::{self, ASSETS_KEY, DEPOSITS_KEY};

/// Key/value store of JSON arrays, one file per versioned key.
///
/// Reads are forgiving: a missing, unreadable or malformed file loads as an
/// empty list. Writes replace the whole array.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`. Separators that are not portable in file names
    /// (`:` in `deposits-store:v1`) become dots.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '.' })
            .collect();
        self.dir.join(format!("{file}.json"))
    }

    /// Raw JSON document stored under `key`, or `Value::Null` if absent or
    /// unparsable.
    pub fn load_document(&self, key: &str) -> Value {
        let path = self.path_for(key);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Value::Null,
            Err(e) => {
                warn!(key, error = %e, "failed to read local store");
                return Value::Null;
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(key, error = %e, "discarding malformed local store");
            Value::Null
        })
    }

    pub fn save<T: Serialize>(&self, key: &str, records: &[T]) -> Result<(), CoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(records)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize {key}: {e}")))?;
        std::fs::write(self.path_for(key), json)?;
        Ok(())
    }

    pub fn load_deposits(&self) -> Vec<Deposit> {
        format::coerce_list(&self.load_document(DEPOSITS_KEY), format::coerce_deposit)
    }

    pub fn save_deposits(&self, deposits: &[Deposit]) -> Result<(), CoreError> {
        self.save(DEPOSITS_KEY, deposits)
    }

    pub fn load_assets(&self) -> Vec<ExchangeAsset> {
        format::coerce_list(&self.load_document(ASSETS_KEY), format::coerce_exchange_asset)
    }

    pub fn save_assets(&self, assets: &[ExchangeAsset]) -> Result<(), CoreError> {
        self.save(ASSETS_KEY, assets)
    }
}
