use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use urlencoding::encode;

use crate::errors::CoreError;
use crate::models::quote::{IssResponse, MarketDataBlock};
use crate::models::settings::DEFAULT_MOEX_BASE_URL;
use super::traits::MarketDataProvider;

/// The currency board lives under a different engine/market than shares.
pub const CURRENCY_BOARD: &str = "CETS";

const ISS_QUERY: &str = "iss.meta=off&iss.only=marketdata&lang=ru";

/// Moscow Exchange ISS provider.
///
/// - **Free**: No API key required.
/// - **Endpoint**: one security on one board, `marketdata` block only.
/// - **Format**: column-oriented JSON (`columns` + `data` rows).
pub struct MoexIssProvider {
    client: Client,
    base_url: String,
}

impl MoexIssProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

impl Default for MoexIssProvider {
    fn default() -> Self {
        Self::new(DEFAULT_MOEX_BASE_URL, Duration::from_secs(30))
    }
}

/// URL of the ISS security endpoint for `secid` on `board`.
pub fn board_url(base_url: &str, secid: &str, board: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let secid = encode(secid);
    if board == CURRENCY_BOARD {
        format!("{base}/engines/currency/markets/selt/boards/{CURRENCY_BOARD}/securities/{secid}.json?{ISS_QUERY}")
    } else {
        format!("{base}/engines/stock/markets/shares/boards/{board}/securities/{secid}.json?{ISS_QUERY}")
    }
}

#[async_trait]
impl MarketDataProvider for MoexIssProvider {
    fn name(&self) -> &str {
        "MOEX ISS"
    }

    async fn fetch_board(&self, secid: &str, board: &str) -> Result<MarketDataBlock, CoreError> {
        let url = board_url(&self.base_url, secid, board);
        let resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::Api {
                provider: self.name().into(),
                message: format!("HTTP {} for {secid} on {board}", status.as_u16()),
            });
        }

        let body: IssResponse = resp.json().await.map_err(|e| CoreError::Api {
            provider: self.name().into(),
            message: format!("Failed to parse marketdata for {secid} on {board}: {e}"),
        })?;

        Ok(body.marketdata)
    }
}

