use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::dividend::{DividendRecord, Instrument};
use super::traits::BrokerProvider;

pub const FIND_INSTRUMENT: &str = "tinkoff.public.invest.api.contract.v1.InstrumentsService/FindInstrument";
pub const GET_DIVIDENDS: &str = "tinkoff.public.invest.api.contract.v1.InstrumentsService/GetDividends";

/// T-Investments public REST gateway (instrument search, dividends).
///
/// - **Auth**: bearer token, read-only scope is sufficient.
/// - **Transport**: every method is a JSON POST.
pub struct TInvestProvider {
    client: Client,
    base_url: String,
    token: String,
}

impl TInvestProvider {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<T, CoreError> {
        let url = method_url(&self.base_url, method);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::Api {
                provider: self.name().into(),
                message: format!("{method} returned HTTP {}", status.as_u16()),
            });
        }

        resp.json().await.map_err(|e| CoreError::Api {
            provider: self.name().into(),
            message: format!("Failed to parse {method} response: {e}"),
        })
    }
}

/// Full URL of a gateway method (`{base}/{package}.{Service}/{Method}`).
pub fn method_url(base_url: &str, method: &str) -> String {
    format!("{}/{method}", base_url.trim_end_matches('/'))
}

// ── Broker API response types ───────────────────────────────────────

#[derive(Deserialize)]
struct FindInstrumentResponse {
    #[serde(default)]
    instruments: Vec<Instrument>,
}

#[derive(Deserialize)]
struct DividendsResponse {
    #[serde(default)]
    dividends: Vec<DividendRecord>,
}

#[async_trait]
impl BrokerProvider for TInvestProvider {
    fn name(&self) -> &str {
        "T-Investments"
    }

    async fn find_instrument(&self, query: &str) -> Result<Vec<Instrument>, CoreError> {
        let body = json!({
            "query": query,
            "instrumentKind": "INSTRUMENT_TYPE_UNSPECIFIED",
            "apiTradeAvailableFlag": false,
        });
        let resp: FindInstrumentResponse = self.post(FIND_INSTRUMENT, body).await?;
        Ok(resp.instruments)
    }

    async fn dividends(
        &self,
        instrument_uid: &str,
        from: DateTime<Utc>,
    ) -> Result<Vec<DividendRecord>, CoreError> {
        let body = json!({
            "from": from.to_rfc3339_opts(SecondsFormat::Millis, true),
            "instrumentId": instrument_uid,
        });
        let resp: DividendsResponse = self.post(GET_DIVIDENDS, body).await?;
        Ok(resp.dividends)
    }
}
