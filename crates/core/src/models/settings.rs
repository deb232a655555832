use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::CoreError;

pub const DEFAULT_MOEX_BASE_URL: &str = "https://iss.moex.com/iss";
pub const DEFAULT_BROKER_BASE_URL: &str = "https://invest-public-api.tbank.ru/rest";

/// Boards tried for a ticker, in preference order. `CETS` is the currency
/// board and uses its own endpoint path.
pub const DEFAULT_BOARDS: &[&str] = &["TQBR", "TQTF", "TQIF", "TQPI", "CETS"];

const ENV_PREFIX: &str = "PORTFOLIO_";

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the backend REST API (paths are joined onto it).
    pub api_base_url: String,

    /// User whose ledgers are loaded.
    pub user_id: String,

    pub moex_base_url: String,

    /// Board preference order for price lookups.
    pub boards: Vec<String>,

    pub request_timeout_secs: u64,

    pub broker_base_url: String,

    /// Bearer token for the broker API; dividends are unavailable without it.
    pub broker_token: Option<String>,

    pub alert_auto_hide_ms: u64,

    /// Delay between hiding an alert and clearing its text.
    pub alert_clear_delay_ms: u64,

    /// When set, ledgers run against the local JSON store in this directory
    /// instead of the REST backend.
    pub storage_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000/".to_string(),
            user_id: String::new(),
            moex_base_url: DEFAULT_MOEX_BASE_URL.to_string(),
            boards: DEFAULT_BOARDS.iter().map(|b| b.to_string()).collect(),
            request_timeout_secs: 30,
            broker_base_url: DEFAULT_BROKER_BASE_URL.to_string(),
            broker_token: None,
            alert_auto_hide_ms: 6000,
            alert_clear_delay_ms: 2000,
            storage_dir: None,
        }
    }
}

impl Settings {
    /// Parse settings from a JSON document; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let settings: Settings = serde_json::from_str(json)
            .map_err(|e| CoreError::Config(format!("Invalid settings JSON: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Build settings from `PORTFOLIO_*` environment variables (a `.env`
    /// file is loaded first if present).
    pub fn from_env() -> Result<Self, CoreError> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Build settings from an explicit set of `(key, value)` pairs.
    pub fn from_vars<I>(vars: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut settings = Settings::default();

        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match name {
                "API_BASE_URL" => settings.api_base_url = value,
                "USER_ID" => settings.user_id = value,
                "MOEX_BASE_URL" => settings.moex_base_url = value,
                "BOARDS" => {
                    settings.boards = value
                        .split(',')
                        .map(|b| b.trim().to_uppercase())
                        .filter(|b| !b.is_empty())
                        .collect();
                }
                "REQUEST_TIMEOUT_SECS" => {
                    settings.request_timeout_secs = parse_number(name, &value)?;
                }
                "BROKER_BASE_URL" => settings.broker_base_url = value,
                "BROKER_TOKEN" => {
                    settings.broker_token = Some(value).filter(|v| !v.trim().is_empty());
                }
                "ALERT_AUTO_HIDE_MS" => settings.alert_auto_hide_ms = parse_number(name, &value)?,
                "ALERT_CLEAR_DELAY_MS" => {
                    settings.alert_clear_delay_ms = parse_number(name, &value)?;
                }
                "STORAGE_DIR" => {
                    settings.storage_dir = Some(PathBuf::from(value)).filter(|p| !p.as_os_str().is_empty());
                }
                _ => {}
            }
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.storage_dir.is_none() && self.api_base_url.trim().is_empty() {
            return Err(CoreError::Config("api_base_url must not be empty".into()));
        }
        if self.moex_base_url.trim().is_empty() {
            return Err(CoreError::Config("moex_base_url must not be empty".into()));
        }
        if self.boards.is_empty() {
            return Err(CoreError::Config("at least one board must be configured".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(CoreError::Config("request_timeout_secs must be positive".into()));
        }
        Ok(())
    }
}

fn parse_number(name: &str, value: &str) -> Result<u64, CoreError> {
    value
        .trim()
        .parse()
        .map_err(|_| CoreError::Config(format!("{ENV_PREFIX}{name} must be a non-negative integer, got '{value}'")))
}
