use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::deposit::{Deposit, DepositChanges, NewDeposit};
use crate::models::exchange_asset::{
    AcceptedAsset, ExchangeAsset, ExchangeAssetChanges, ExchangeAssetRecord, NewExchangeAsset,
};
use crate::storage::manager::LocalStore;
use super::traits::{ApiResponse, BackendApi};

const NOT_FOUND: u16 = 404;

/// Self-contained backend that keeps both ledgers in a [`LocalStore`].
///
/// Single-user: `user_id` arguments are accepted and ignored. Ids are UUID v4.
/// Mirrors the REST backend's answers, including edit endpoints returning
/// records without live pricing.
pub struct LocalBackend {
    store: LocalStore,
    /// Serializes access to the store files.
    file_lock: Mutex<()>,
}

impl LocalBackend {
    pub fn new(store: LocalStore) -> Self {
        Self {
            store,
            file_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.file_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn with_asset<T>(
        &self,
        asset_id: &str,
        edit: impl FnOnce(&mut ExchangeAsset) -> T,
    ) -> Result<ApiResponse<T>, CoreError> {
        let _guard = self.lock();
        let mut assets = self.store.load_assets();
        let Some(asset) = assets.iter_mut().find(|a| a.id == asset_id) else {
            return Ok(ApiResponse::empty(NOT_FOUND));
        };
        let out = edit(asset);
        self.store.save_assets(&assets)?;
        Ok(ApiResponse::ok(out))
    }

    fn with_deposit<T>(
        &self,
        deposit_id: &str,
        edit: impl FnOnce(&mut Deposit) -> T,
    ) -> Result<ApiResponse<T>, CoreError> {
        let _guard = self.lock();
        let mut deposits = self.store.load_deposits();
        let Some(deposit) = deposits.iter_mut().find(|d| d.id == deposit_id) else {
            return Ok(ApiResponse::empty(NOT_FOUND));
        };
        let out = edit(deposit);
        self.store.save_deposits(&deposits)?;
        Ok(ApiResponse::ok(out))
    }
}

#[async_trait]
impl BackendApi for LocalBackend {
    async fn list_exchange_assets(
        &self,
        _user_id: &str,
    ) -> Result<ApiResponse<Vec<ExchangeAsset>>, CoreError> {
        let _guard = self.lock();
        Ok(ApiResponse::ok(self.store.load_assets()))
    }

    async fn add_exchange_asset(
        &self,
        _user_id: &str,
        asset: &NewExchangeAsset,
    ) -> Result<ApiResponse<()>, CoreError> {
        let _guard = self.lock();
        let mut assets = self.store.load_assets();
        let id = Uuid::new_v4().to_string();
        debug!(%id, name = %asset.name, "storing exchange asset locally");
        assets.push(ExchangeAsset::from(ExchangeAssetRecord {
            id,
            name: asset.name.clone(),
            ticker: asset.ticker.clone(),
            category: asset.category.clone(),
            sector: asset.sector.clone(),
            quantity: asset.quantity,
            board_name: asset.board_name.clone(),
            comment: asset.comment.clone(),
        }));
        self.store.save_assets(&assets)?;
        Ok(ApiResponse::new(200, Some(())))
    }

    async fn edit_asset_quantity(
        &self,
        asset_id: &str,
        quantity: f64,
    ) -> Result<ApiResponse<ExchangeAssetRecord>, CoreError> {
        self.with_asset(asset_id, |asset| {
            asset.set_quantity(quantity);
            ExchangeAssetRecord::from(&*asset)
        })
    }

    async fn edit_asset(
        &self,
        asset_id: &str,
        changes: &ExchangeAssetChanges,
    ) -> Result<ApiResponse<ExchangeAssetRecord>, CoreError> {
        self.with_asset(asset_id, |asset| {
            asset.category = changes.category.clone();
            asset.sector = changes.sector.clone();
            asset.comment = changes.comment.clone();
            ExchangeAssetRecord::from(&*asset)
        })
    }

    async fn delete_asset(&self, asset_id: &str) -> Result<ApiResponse<()>, CoreError> {
        let _guard = self.lock();
        let mut assets = self.store.load_assets();
        let before = assets.len();
        assets.retain(|a| a.id != asset_id);
        if assets.len() == before {
            return Ok(ApiResponse::empty(NOT_FOUND));
        }
        self.store.save_assets(&assets)?;
        Ok(ApiResponse::new(200, Some(())))
    }

    async fn list_deposits(&self, _user_id: &str) -> Result<ApiResponse<Vec<Deposit>>, CoreError> {
        let _guard = self.lock();
        Ok(ApiResponse::ok(self.store.load_deposits()))
    }

    async fn add_deposit(
        &self,
        _user_id: &str,
        deposit: &NewDeposit,
    ) -> Result<ApiResponse<()>, CoreError> {
        let _guard = self.lock();
        let mut deposits = self.store.load_deposits();
        deposits.push(Deposit {
            id: Uuid::new_v4().to_string(),
            name: deposit.name.clone(),
            end_date: deposit.end_date.clone(),
            amount: deposit.amount,
            rate_percent: deposit.rate_percent,
        });
        self.store.save_deposits(&deposits)?;
        Ok(ApiResponse::new(200, Some(())))
    }

    async fn edit_deposit_amount(
        &self,
        deposit_id: &str,
        amount: f64,
    ) -> Result<ApiResponse<Deposit>, CoreError> {
        self.with_deposit(deposit_id, |deposit| {
            deposit.amount = amount;
            deposit.clone()
        })
    }

    async fn edit_deposit(
        &self,
        deposit_id: &str,
        changes: &DepositChanges,
    ) -> Result<ApiResponse<Deposit>, CoreError> {
        self.with_deposit(deposit_id, |deposit| {
            deposit.apply_changes(changes);
            deposit.clone()
        })
    }

    async fn delete_deposit(&self, deposit_id: &str) -> Result<ApiResponse<()>, CoreError> {
        let _guard = self.lock();
        let mut deposits = self.store.load_deposits();
        let before = deposits.len();
        deposits.retain(|d| d.id != deposit_id);
        if deposits.len() == before {
            return Ok(ApiResponse::empty(NOT_FOUND));
        }
        self.store.save_deposits(&deposits)?;
        Ok(ApiResponse::new(200, Some(())))
    }

    /// Without a catalogue, suggest tickers the user already holds.
    async fn search_accepted_assets(
        &self,
        query: &str,
    ) -> Result<ApiResponse<Vec<AcceptedAsset>>, CoreError> {
        let needle = query.trim().to_lowercase();
        let _guard = self.lock();
        let mut matches: Vec<AcceptedAsset> = self
            .store
            .load_assets()
            .into_iter()
            .filter_map(|asset| {
                let ticker = asset.normalized_ticker()?;
                let hit = ticker.to_lowercase().contains(&needle)
                    || asset.name.to_lowercase().contains(&needle);
                hit.then(|| AcceptedAsset {
                    name: asset.name,
                    ticker,
                    board_name: asset.board_name,
                })
            })
            .collect();
        matches.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        matches.dedup_by(|a, b| a.ticker == b.ticker);
        Ok(ApiResponse::ok(matches))
    }
}
