use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::deposit::{Deposit, DepositChanges, NewDeposit};
use crate::models::exchange_asset::{
    AcceptedAsset, ExchangeAsset, ExchangeAssetChanges, ExchangeAssetRecord, NewExchangeAsset,
};

/// A backend answer: HTTP status plus the decoded body, if there was one.
///
/// Only status 200 counts as success. Any other status is a rejection even
/// when a body is present.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub body: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn new(status: u16, body: Option<T>) -> Self {
        Self { status, body }
    }

    pub fn ok(body: T) -> Self {
        Self::new(200, Some(body))
    }

    pub fn empty(status: u16) -> Self {
        Self::new(status, None)
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    /// Turn a non-200 answer into `CoreError::Rejected` and hand back the
    /// body of a successful one.
    pub fn into_success(self, operation: &str) -> Result<Option<T>, CoreError> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(CoreError::Rejected {
                operation: operation.to_string(),
                status: self.status,
            })
        }
    }
}

/// The CRUD surface of the portfolio backend.
///
/// `Err` means the request never produced a usable HTTP answer (network,
/// decoding). Any HTTP answer, successful or not, is an `Ok(ApiResponse)`.
#[async_trait]
pub trait BackendApi: Send + Sync {
    // ── Exchange assets ─────────────────────────────────────────────

    async fn list_exchange_assets(
        &self,
        user_id: &str,
    ) -> Result<ApiResponse<Vec<ExchangeAsset>>, CoreError>;

    async fn add_exchange_asset(
        &self,
        user_id: &str,
        asset: &NewExchangeAsset,
    ) -> Result<ApiResponse<()>, CoreError>;

    async fn edit_asset_quantity(
        &self,
        asset_id: &str,
        quantity: f64,
    ) -> Result<ApiResponse<ExchangeAssetRecord>, CoreError>;

    async fn edit_asset(
        &self,
        asset_id: &str,
        changes: &ExchangeAssetChanges,
    ) -> Result<ApiResponse<ExchangeAssetRecord>, CoreError>;

    async fn delete_asset(&self, asset_id: &str) -> Result<ApiResponse<()>, CoreError>;

    // ── Deposits ────────────────────────────────────────────────────

    async fn list_deposits(&self, user_id: &str) -> Result<ApiResponse<Vec<Deposit>>, CoreError>;

    async fn add_deposit(
        &self,
        user_id: &str,
        deposit: &NewDeposit,
    ) -> Result<ApiResponse<()>, CoreError>;

    async fn edit_deposit_amount(
        &self,
        deposit_id: &str,
        amount: f64,
    ) -> Result<ApiResponse<Deposit>, CoreError>;

    async fn edit_deposit(
        &self,
        deposit_id: &str,
        changes: &DepositChanges,
    ) -> Result<ApiResponse<Deposit>, CoreError>;

    async fn delete_deposit(&self, deposit_id: &str) -> Result<ApiResponse<()>, CoreError>;

    // ── Catalogue ───────────────────────────────────────────────────

    async fn search_accepted_assets(
        &self,
        query: &str,
    ) -> Result<ApiResponse<Vec<AcceptedAsset>>, CoreError>;
}
