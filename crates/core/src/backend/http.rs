use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::errors::CoreError;
use crate::models::deposit::{Deposit, DepositChanges, NewDeposit};
use crate::models::exchange_asset::{
    AcceptedAsset, ExchangeAsset, ExchangeAssetChanges, ExchangeAssetRecord, NewExchangeAsset,
};
use crate::services::alert_service::AlertChannel;
use super::interceptor::ResponseInterceptor;
use super::paths::{self, user_assets, user_deposits};
use super::traits::{ApiResponse, BackendApi};

/// REST client for the portfolio backend.
pub struct HttpBackend {
    client: Client,
    base_url: String,
    interceptor: ResponseInterceptor,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration, alerts: Option<AlertChannel>) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.into(),
            interceptor: ResponseInterceptor::new(alerts),
        }
    }

    fn url(&self, path: &str) -> String {
        paths::join(&self.base_url, path)
    }

    /// Send a request and return its status and raw body, after the
    /// interceptor has seen it.
    async fn send(&self, operation: &str, request: RequestBuilder) -> Result<(u16, String), CoreError> {
        let resp = match request.send().await {
            Ok(resp) => resp,
            Err(e) => {
                let err = CoreError::from(e);
                self.interceptor.on_transport_error(operation, &err);
                return Err(err);
            }
        };

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| {
            let err = CoreError::from(e);
            self.interceptor.on_transport_error(operation, &err);
            err
        })?;

        debug!(operation, status, "backend response");
        self.interceptor.on_response(operation, status, &body);
        Ok((status, body))
    }

    /// Send and decode a JSON body for successful answers.
    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<ApiResponse<T>, CoreError> {
        let (status, body) = self.send(operation, request).await?;
        if status != 200 || body.trim().is_empty() {
            return Ok(ApiResponse::empty(status));
        }
        let decoded = serde_json::from_str(&body).map_err(|e| {
            CoreError::Deserialization(format!("{operation}: {e}"))
        })?;
        Ok(ApiResponse::new(status, Some(decoded)))
    }

    async fn send_empty(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<ApiResponse<()>, CoreError> {
        let (status, _) = self.send(operation, request).await?;
        Ok(ApiResponse::empty(status))
    }
}

// ── Backend response envelopes ──────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserAssetsEnvelope {
    user_assets: Option<Vec<ExchangeAsset>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDepositsEnvelope {
    user_deposits: Option<Vec<Deposit>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AcceptedAssetsEnvelope {
    Bare(Vec<AcceptedAsset>),
    #[serde(rename_all = "camelCase")]
    Wrapped { accepted_assets: Vec<AcceptedAsset> },
}

#[async_trait]
impl BackendApi for HttpBackend {
    async fn list_exchange_assets(
        &self,
        user_id: &str,
    ) -> Result<ApiResponse<Vec<ExchangeAsset>>, CoreError> {
        let request = self
            .client
            .get(self.url(user_assets::GET))
            .query(&[("userId", user_id)]);
        let resp: ApiResponse<UserAssetsEnvelope> = self.send_json(user_assets::GET, request).await?;
        Ok(ApiResponse::new(resp.status, resp.body.and_then(|b| b.user_assets)))
    }

    async fn add_exchange_asset(
        &self,
        user_id: &str,
        asset: &NewExchangeAsset,
    ) -> Result<ApiResponse<()>, CoreError> {
        let mut body = serde_json::to_value(asset)
            .map_err(|e| CoreError::Serialization(e.to_string()))?;
        body["userId"] = json!(user_id);
        let request = self.client.post(self.url(user_assets::ADD)).json(&body);
        self.send_empty(user_assets::ADD, request).await
    }

    async fn edit_asset_quantity(
        &self,
        asset_id: &str,
        quantity: f64,
    ) -> Result<ApiResponse<ExchangeAssetRecord>, CoreError> {
        let request = self
            .client
            .patch(self.url(user_assets::EDIT_QUANTITY))
            .json(&json!({ "assetId": asset_id, "quantity": quantity }));
        self.send_json(user_assets::EDIT_QUANTITY, request).await
    }

    async fn edit_asset(
        &self,
        asset_id: &str,
        changes: &ExchangeAssetChanges,
    ) -> Result<ApiResponse<ExchangeAssetRecord>, CoreError> {
        let request = self.client.patch(self.url(user_assets::EDIT_ASSET)).json(&json!({
            "assetId": asset_id,
            "category": changes.category,
            "sector": changes.sector,
            "comment": changes.comment,
        }));
        self.send_json(user_assets::EDIT_ASSET, request).await
    }

    async fn delete_asset(&self, asset_id: &str) -> Result<ApiResponse<()>, CoreError> {
        let request = self
            .client
            .delete(self.url(user_assets::DELETE))
            .query(&[("assetId", asset_id)]);
        self.send_empty(user_assets::DELETE, request).await
    }

    async fn list_deposits(&self, user_id: &str) -> Result<ApiResponse<Vec<Deposit>>, CoreError> {
        let request = self
            .client
            .get(self.url(user_deposits::GET))
            .query(&[("userId", user_id)]);
        let resp: ApiResponse<UserDepositsEnvelope> =
            self.send_json(user_deposits::GET, request).await?;
        Ok(ApiResponse::new(resp.status, resp.body.and_then(|b| b.user_deposits)))
    }

    async fn add_deposit(
        &self,
        user_id: &str,
        deposit: &NewDeposit,
    ) -> Result<ApiResponse<()>, CoreError> {
        let mut body = serde_json::to_value(deposit)
            .map_err(|e| CoreError::Serialization(e.to_string()))?;
        body["userId"] = json!(user_id);
        let request = self.client.post(self.url(user_deposits::ADD)).json(&body);
        self.send_empty(user_deposits::ADD, request).await
    }

    async fn edit_deposit_amount(
        &self,
        deposit_id: &str,
        amount: f64,
    ) -> Result<ApiResponse<Deposit>, CoreError> {
        let request = self
            .client
            .patch(self.url(user_deposits::EDIT_AMOUNT))
            .json(&json!({ "depositId": deposit_id, "amount": amount }));
        self.send_json(user_deposits::EDIT_AMOUNT, request).await
    }

    async fn edit_deposit(
        &self,
        deposit_id: &str,
        changes: &DepositChanges,
    ) -> Result<ApiResponse<Deposit>, CoreError> {
        let request = self.client.patch(self.url(user_deposits::EDIT_DEPOSIT)).json(&json!({
            "depositId": deposit_id,
            "name": changes.name,
            "endDate": changes.end_date,
            "ratePercent": changes.rate_percent,
        }));
        self.send_json(user_deposits::EDIT_DEPOSIT, request).await
    }

    async fn delete_deposit(&self, deposit_id: &str) -> Result<ApiResponse<()>, CoreError> {
        let request = self
            .client
            .delete(self.url(user_deposits::DELETE))
            .query(&[("depositId", deposit_id)]);
        self.send_empty(user_deposits::DELETE, request).await
    }

    async fn search_accepted_assets(
        &self,
        query: &str,
    ) -> Result<ApiResponse<Vec<AcceptedAsset>>, CoreError> {
        let request = self
            .client
            .get(self.url(paths::ACCEPTED_ASSETS))
            .query(&[("search", query)]);
        let resp: ApiResponse<AcceptedAssetsEnvelope> =
            self.send_json(paths::ACCEPTED_ASSETS, request).await?;
        let assets = resp.body.map(|envelope| match envelope {
            AcceptedAssetsEnvelope::Bare(list) => list,
            AcceptedAssetsEnvelope::Wrapped { accepted_assets } => accepted_assets,
        });
        Ok(ApiResponse::new(resp.status, assets))
    }
}
