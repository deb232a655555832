use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::backend::traits::BackendApi;
use crate::errors::CoreError;
use crate::models::exchange_asset::{
    total_price, AcceptedAsset, ExchangeAsset, ExchangeAssetChanges, NewExchangeAsset,
};
use crate::models::quote::{FetchOutcome, Quote};
use crate::services::in_flight::{LoadingFlag, UpdatingSet};
use crate::services::market_data_service::MarketDataService;
use crate::utils::validation;

/// Owns the user's exchange holdings and keeps them in sync with the backend.
///
/// Every mutation goes to the backend first; the local list only changes
/// after a 200 answer. A rejected or failed call returns `Err` and leaves
/// `items` exactly as it was. Live pricing (`price`, `change_percent`,
/// `total_price`) is carried over across edits because the edit endpoints
/// answer without it.
pub struct ExchangeLedger {
    api: Arc<dyn BackendApi>,
    market_data: Arc<MarketDataService>,
    user_id: String,
    items: Mutex<Vec<ExchangeAsset>>,
    updating: UpdatingSet,
    loading: LoadingFlag,
}

impl ExchangeLedger {
    pub fn new(
        api: Arc<dyn BackendApi>,
        market_data: Arc<MarketDataService>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            api,
            market_data,
            user_id: user_id.into(),
            items: Mutex::new(Vec::new()),
            updating: UpdatingSet::new(),
            loading: LoadingFlag::default(),
        }
    }

    fn lock_items(&self) -> MutexGuard<'_, Vec<ExchangeAsset>> {
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ── Reads ───────────────────────────────────────────────────────

    pub fn items(&self) -> Vec<ExchangeAsset> {
        self.lock_items().clone()
    }

    pub fn get(&self, id: &str) -> Option<ExchangeAsset> {
        self.lock_items().iter().find(|a| a.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock_items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_items().is_empty()
    }

    pub fn is_updating(&self, id: &str) -> bool {
        self.updating.contains(id)
    }

    pub fn updating_ids(&self) -> Vec<String> {
        self.updating.ids()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_set()
    }

    pub fn market_data(&self) -> &Arc<MarketDataService> {
        &self.market_data
    }

    fn require(&self, id: &str) -> Result<ExchangeAsset, CoreError> {
        self.get(id)
            .ok_or_else(|| CoreError::AssetNotFound(id.to_string()))
    }

    // ── Mutations ───────────────────────────────────────────────────

    /// Create a holding on the backend, then reload the whole list.
    /// Nothing is inserted locally before the server has assigned an id.
    pub async fn add(&self, asset: NewExchangeAsset) -> Result<(), CoreError> {
        validation::require_name(&asset.name)?;
        validation::require_positive("quantity", asset.quantity)?;

        {
            let _loading = self.loading.begin();
            self.api
                .add_exchange_asset(&self.user_id, &asset)
                .await?
                .into_success("add-asset")?;
        }
        info!(name = %asset.name, ticker = ?asset.ticker, "exchange asset added");

        self.load_all().await
    }

    /// Set the held quantity.
    ///
    /// The edit endpoint answers without pricing, so the stored record keeps
    /// the last known `price`/`change_percent` and `total_price` is
    /// recomputed from them and the new quantity.
    pub async fn update_quantity(&self, id: &str, quantity: f64) -> Result<ExchangeAsset, CoreError> {
        validation::require_non_negative("quantity", quantity)?;
        let previous = self.require(id)?;

        let _updating = self.updating.mark(id);
        let record = self
            .api
            .edit_asset_quantity(id, quantity)
            .await?
            .into_success("edit-asset-quantity")?;

        let mut items = self.lock_items();
        let slot = items.iter_mut().find(|a| a.id == id);
        let known = slot.as_deref().cloned().unwrap_or(previous);
        let updated = match record {
            Some(record) => {
                let mut updated = ExchangeAsset::from_record(record, &known);
                updated.set_quantity(updated.quantity);
                updated
            }
            None => {
                let mut updated = known;
                updated.set_quantity(quantity);
                updated
            }
        };
        match slot {
            Some(slot) => *slot = updated.clone(),
            None => debug!(%id, "asset vanished during quantity edit"),
        }
        debug!(%id, quantity = updated.quantity, total = ?updated.total_price, "quantity updated");
        Ok(updated)
    }

    /// Buy (`delta > 0`) or sell (`delta < 0`) part of a holding. The backend
    /// receives the resulting absolute quantity.
    pub async fn adjust_quantity(&self, id: &str, delta: f64) -> Result<ExchangeAsset, CoreError> {
        if !delta.is_finite() {
            return Err(CoreError::ValidationError("quantity change must be a finite number".into()));
        }
        let current = self.require(id)?;
        let quantity = current.quantity + delta;
        validation::require_non_negative("quantity", quantity)?;
        self.update_quantity(id, quantity).await
    }

    /// Edit category, sector and comment. Pricing fields are kept verbatim.
    pub async fn update_fields(
        &self,
        id: &str,
        changes: ExchangeAssetChanges,
    ) -> Result<ExchangeAsset, CoreError> {
        let previous = self.require(id)?;

        let _updating = self.updating.mark(id);
        let record = self
            .api
            .edit_asset(id, &changes)
            .await?
            .into_success("edit-asset")?;

        let mut items = self.lock_items();
        let slot = items.iter_mut().find(|a| a.id == id);
        let known = slot.as_deref().cloned().unwrap_or(previous);
        let updated = match record {
            Some(record) => {
                let mut updated = ExchangeAsset::from_record(record, &known);
                updated.total_price = known.total_price;
                updated
            }
            None => ExchangeAsset {
                category: changes.category,
                sector: changes.sector,
                comment: changes.comment,
                ..known
            },
        };
        match slot {
            Some(slot) => *slot = updated.clone(),
            None => debug!(%id, "asset vanished during field edit"),
        }
        Ok(updated)
    }

    /// Delete a holding. It leaves the local list only once the backend has
    /// confirmed the deletion.
    pub async fn remove(&self, id: &str) -> Result<(), CoreError> {
        self.require(id)?;

        let _updating = self.updating.mark(id);
        self.api
            .delete_asset(id)
            .await?
            .into_success("delete-asset")?;

        self.lock_items().retain(|a| a.id != id);
        info!(%id, "exchange asset removed");
        Ok(())
    }

    // ── Loading and pricing ─────────────────────────────────────────

    /// Replace the list with the backend's.
    ///
    /// If any record carries an `error_reason` (the backend could not price
    /// it), every record is re-priced through the market data fetcher before
    /// the list is swapped in. Records that still arrive without a price keep
    /// the fetcher's cached quote, or failing that the pricing of the entry
    /// they replace. On failure the previous list stays in place.
    pub async fn load_all(&self) -> Result<(), CoreError> {
        let _loading = self.loading.begin();

        let body = self
            .api
            .list_exchange_assets(&self.user_id)
            .await?
            .into_success("list-assets")?;
        let Some(mut assets) = body else {
            debug!("asset list response without userAssets, keeping current list");
            return Ok(());
        };

        if assets.iter().any(ExchangeAsset::has_error) {
            warn!(count = assets.len(), "backend could not price some assets, enriching locally");
            self.enrich(&mut assets).await;
        }

        let mut items = self.lock_items();
        for asset in assets.iter_mut().filter(|a| a.price.is_none()) {
            self.carry_pricing(asset, &items);
        }
        debug!(count = assets.len(), "exchange assets loaded");
        *items = assets;
        Ok(())
    }

    fn carry_pricing(&self, asset: &mut ExchangeAsset, previous: &[ExchangeAsset]) {
        if let Some(quote) = asset.normalized_ticker().and_then(|t| self.market_data.quote(&t)) {
            asset.apply_quote(&quote);
            return;
        }
        let Some(known) = previous.iter().find(|p| p.id == asset.id && p.price.is_some()) else {
            return;
        };
        asset.price = known.price;
        asset.change_percent = known.change_percent;
        asset.total_price = total_price(asset.price, asset.quantity);
    }

    async fn enrich(&self, assets: &mut [ExchangeAsset]) {
        let _markers: Vec<_> = assets.iter().map(|a| self.updating.mark(&a.id)).collect();

        let tickers: Vec<String> = assets
            .iter()
            .filter_map(ExchangeAsset::normalized_ticker)
            .collect();
        self.market_data.fetch_many(&tickers).await;

        for asset in assets.iter_mut() {
            let quote = asset
                .normalized_ticker()
                .and_then(|t| self.market_data.quote(&t));
            if let Some(quote) = quote {
                asset.apply_quote(&quote);
                asset.error_reason = None;
            }
        }
    }

    /// Fetch every distinct ticker and overlay the fetcher's cache onto the
    /// list. Returns the per-ticker fetch outcomes.
    pub async fn refresh_prices(&self) -> HashMap<String, FetchOutcome> {
        let tickers: Vec<String> = self
            .lock_items()
            .iter()
            .filter_map(ExchangeAsset::normalized_ticker)
            .collect();
        let outcomes = self.market_data.fetch_many(&tickers).await;

        let mut items = self.lock_items();
        for asset in items.iter_mut() {
            if let Some(quote) = asset.normalized_ticker().and_then(|t| self.market_data.quote(&t)) {
                asset.apply_quote(&quote);
            }
        }
        outcomes
    }

    /// Re-price a single holding. `Ok(None)` when it has no ticker or a
    /// fetch for it is already running; `PriceNotFound` when every board
    /// failed and no earlier quote is cached.
    pub async fn refresh_price(&self, id: &str) -> Result<Option<Quote>, CoreError> {
        let asset = self.require(id)?;
        let Some(ticker) = asset.normalized_ticker() else {
            return Ok(None);
        };

        let _updating = self.updating.mark(id);
        let outcome = self.market_data.fetch_price(&ticker).await;

        let Some(quote) = self.market_data.quote(&ticker) else {
            if outcome == FetchOutcome::NotFound {
                return Err(CoreError::PriceNotFound(ticker));
            }
            return Ok(None);
        };
        if let Some(slot) = self.lock_items().iter_mut().find(|a| a.id == id) {
            slot.apply_quote(&quote);
        }
        Ok(Some(quote))
    }

    /// Ticker autocomplete against the backend's accepted-assets catalogue.
    pub async fn search_accepted(&self, query: &str) -> Result<Vec<AcceptedAsset>, CoreError> {
        let found = self
            .api
            .search_accepted_assets(query)
            .await?
            .into_success("accepted-assets")?;
        Ok(found.unwrap_or_default())
    }
}

impl std::fmt::Debug for ExchangeLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeLedger")
            .field("user_id", &self.user_id)
            .field("items", &self.len())
            .field("updating", &self.updating.ids())
            .field("loading", &self.is_loading())
            .finish()
    }
}
