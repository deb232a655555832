use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

use portfolio_tracker_core::backend::local::LocalBackend;
use portfolio_tracker_core::backend::traits::{ApiResponse, BackendApi};
use portfolio_tracker_core::errors::CoreError;
use portfolio_tracker_core::models::analytics::{AllocationKey, MoverKind};
use portfolio_tracker_core::models::deposit::{Deposit, DepositChanges, NewDeposit};
use portfolio_tracker_core::models::exchange_asset::{
    AcceptedAsset, ExchangeAsset, ExchangeAssetChanges, ExchangeAssetRecord, NewExchangeAsset,
};
use portfolio_tracker_core::models::quote::{FetchOutcome, MarketDataBlock};
use portfolio_tracker_core::models::settings::Settings;
use portfolio_tracker_core::models::unified::{AssetKind, SortDirection, SortField, SortState};
use portfolio_tracker_core::providers::traits::MarketDataProvider;
use portfolio_tracker_core::services::alert_service::AlertChannel;
use portfolio_tracker_core::services::market_data_service::MarketDataService;
use portfolio_tracker_core::storage::manager::LocalStore;
use portfolio_tracker_core::{init_logging, PortfolioTracker};

// ═══════════════════════════════════════════════════════════════════
// Mock MOEX (fixed quotes, no network)
// ═══════════════════════════════════════════════════════════════════

struct FixedQuotes {
    quotes: HashMap<String, (f64, f64)>,
}

impl FixedQuotes {
    fn new(quotes: &[(&str, f64, f64)]) -> Self {
        Self {
            quotes: quotes
                .iter()
                .map(|(t, price, change)| (t.to_string(), (*price, *change)))
                .collect(),
        }
    }
}

#[async_trait]
impl MarketDataProvider for FixedQuotes {
    fn name(&self) -> &str {
        "FixedQuotes"
    }

    async fn fetch_board(&self, secid: &str, board: &str) -> Result<MarketDataBlock, CoreError> {
        match self.quotes.get(secid) {
            Some((price, change)) if board == "TQBR" => Ok(MarketDataBlock::new(
                &["SECID", "LAST", "MARKETPRICE", "LASTTOPREVPRICE"],
                vec![vec![json!(secid), json!(price), json!(price), json!(change)]],
            )),
            _ => Err(CoreError::Api {
                provider: "FixedQuotes".into(),
                message: format!("no {secid} on {board}"),
            }),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Backend that refuses to list deposits
// ═══════════════════════════════════════════════════════════════════

/// Local storage everywhere except the deposit list, which answers 503.
struct DepositsDown {
    inner: LocalBackend,
}

#[async_trait]
impl BackendApi for DepositsDown {
    async fn list_exchange_assets(
        &self,
        user_id: &str,
    ) -> Result<ApiResponse<Vec<ExchangeAsset>>, CoreError> {
        self.inner.list_exchange_assets(user_id).await
    }

    async fn add_exchange_asset(
        &self,
        user_id: &str,
        asset: &NewExchangeAsset,
    ) -> Result<ApiResponse<()>, CoreError> {
        self.inner.add_exchange_asset(user_id, asset).await
    }

    async fn edit_asset_quantity(
        &self,
        asset_id: &str,
        quantity: f64,
    ) -> Result<ApiResponse<ExchangeAssetRecord>, CoreError> {
        self.inner.edit_asset_quantity(asset_id, quantity).await
    }

    async fn edit_asset(
        &self,
        asset_id: &str,
        changes: &ExchangeAssetChanges,
    ) -> Result<ApiResponse<ExchangeAssetRecord>, CoreError> {
        self.inner.edit_asset(asset_id, changes).await
    }

    async fn delete_asset(&self, asset_id: &str) -> Result<ApiResponse<()>, CoreError> {
        self.inner.delete_asset(asset_id).await
    }

    async fn list_deposits(&self, _user_id: &str) -> Result<ApiResponse<Vec<Deposit>>, CoreError> {
        Ok(ApiResponse::empty(503))
    }

    async fn add_deposit(
        &self,
        user_id: &str,
        deposit: &NewDeposit,
    ) -> Result<ApiResponse<()>, CoreError> {
        self.inner.add_deposit(user_id, deposit).await
    }

    async fn edit_deposit_amount(
        &self,
        deposit_id: &str,
        amount: f64,
    ) -> Result<ApiResponse<Deposit>, CoreError> {
        self.inner.edit_deposit_amount(deposit_id, amount).await
    }

    async fn edit_deposit(
        &self,
        deposit_id: &str,
        changes: &DepositChanges,
    ) -> Result<ApiResponse<Deposit>, CoreError> {
        self.inner.edit_deposit(deposit_id, changes).await
    }

    async fn delete_deposit(&self, deposit_id: &str) -> Result<ApiResponse<()>, CoreError> {
        self.inner.delete_deposit(deposit_id).await
    }

    async fn search_accepted_assets(
        &self,
        query: &str,
    ) -> Result<ApiResponse<Vec<AcceptedAsset>>, CoreError> {
        self.inner.search_accepted_assets(query).await
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn local_settings(dir: &TempDir) -> Settings {
    Settings {
        user_id: "user-1".into(),
        storage_dir: Some(dir.path().to_path_buf()),
        ..Settings::default()
    }
}

fn tracker_with_quotes(dir: &TempDir, quotes: &[(&str, f64, f64)]) -> PortfolioTracker {
    let settings = local_settings(dir);
    let api: Arc<dyn BackendApi> = Arc::new(LocalBackend::new(LocalStore::new(dir.path())));
    let market_data = Arc::new(MarketDataService::new(
        Arc::new(FixedQuotes::new(quotes)),
        settings.boards.clone(),
    ));
    PortfolioTracker::with_components(settings, api, market_data, None, AlertChannel::default())
}

fn share(name: &str, ticker: &str, category: &str, quantity: f64) -> NewExchangeAsset {
    NewExchangeAsset {
        name: name.into(),
        ticker: Some(ticker.into()),
        category: category.into(),
        sector: String::new(),
        quantity,
        board_name: Some("TQBR".into()),
        comment: String::new(),
    }
}

fn savings(amount: f64) -> NewDeposit {
    NewDeposit {
        name: "Savings".into(),
        end_date: "2026-12-31".into(),
        amount,
        rate_percent: 16.0,
    }
}

// ═══════════════════════════════════════════════════════════════════
// Construction
// ═══════════════════════════════════════════════════════════════════

#[test]
fn new_rejects_invalid_settings() {
    let settings = Settings {
        boards: Vec::new(),
        ..Settings::default()
    };
    assert!(matches!(PortfolioTracker::new(settings), Err(CoreError::Config(_))));
}

#[test]
fn init_logging_is_idempotent() {
    init_logging("portfolio_tracker_core=debug");
    init_logging("warn");
}

#[tokio::test]
async fn empty_local_store_loads_empty_portfolio() {
    let dir = TempDir::new().unwrap();
    let tracker = PortfolioTracker::new(local_settings(&dir)).unwrap();

    tracker.load().await.unwrap();

    assert!(tracker.all_assets().is_empty());
    assert_eq!(tracker.summary().total_value, 0.0);
    assert!(tracker.unified().composition().is_empty());
}

#[tokio::test]
async fn dividends_need_broker_token() {
    let dir = TempDir::new().unwrap();
    let tracker = PortfolioTracker::new(local_settings(&dir)).unwrap();

    let err = tracker.dividends_for_ticker("SBER").await.unwrap_err();

    assert!(matches!(err, CoreError::Config(_)));
}

// ═══════════════════════════════════════════════════════════════════
// End-to-end over local storage
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn portfolio_lifecycle() {
    let dir = TempDir::new().unwrap();
    let tracker = tracker_with_quotes(&dir, &[("SBER", 250.0, 1.2), ("GAZP", 170.0, -6.5)]);
    tracker.load().await.unwrap();

    tracker.unified().add_deposit(savings(100000.0)).await.unwrap();
    tracker
        .unified()
        .add_exchange(share("Sberbank", "SBER", "Shares", 10.0))
        .await
        .unwrap();
    tracker
        .unified()
        .add_exchange(share("Gazprom", "GAZP", "", 5.0))
        .await
        .unwrap();

    // Local records carry no pricing until the fetcher has run.
    assert_eq!(tracker.summary().exchange_value, 0.0);

    let outcomes = tracker.refresh_prices().await;
    assert!(matches!(outcomes["SBER"], FetchOutcome::Fetched(_)));

    let summary = tracker.summary();
    assert_eq!(summary.deposit_value, 100000.0);
    assert_eq!(summary.exchange_value, 2500.0 + 850.0);
    assert_eq!(summary.total_value, 103350.0);
    assert_eq!(summary.deposit_count, 1);
    assert_eq!(summary.exchange_count, 2);

    let by_value = tracker.sorted_assets(&SortState::default());
    assert_eq!(by_value[0].kind(), AssetKind::Deposit);
    assert_eq!(by_value[1].name(), "Sberbank");

    let by_name = tracker.sorted_assets(&SortState::new(SortField::Name, SortDirection::Asc));
    assert_eq!(by_name[0].name(), "Gazprom");

    let fallen = tracker.top_movers(MoverKind::Fallen, 5.0, 5);
    assert_eq!(fallen.len(), 1);
    assert_eq!(fallen[0].ticker, "GAZP");

    let allocation = tracker.allocation(AllocationKey::Category);
    assert_eq!(allocation[0].label, "Shares");
    assert_eq!(allocation[1].label, "Other");
}

#[tokio::test]
async fn adding_a_holding_keeps_prices_already_fetched() {
    let dir = TempDir::new().unwrap();
    let tracker = tracker_with_quotes(&dir, &[("SBER", 250.0, 1.2), ("GAZP", 100.0, 0.0)]);
    tracker
        .unified()
        .add_exchange(share("Sberbank", "SBER", "Shares", 10.0))
        .await
        .unwrap();
    tracker.refresh_prices().await;
    assert_eq!(tracker.summary().exchange_value, 2500.0);

    tracker
        .unified()
        .add_exchange(share("Gazprom", "GAZP", "Shares", 1.0))
        .await
        .unwrap();

    let sber = tracker
        .exchange()
        .items()
        .into_iter()
        .find(|a| a.name == "Sberbank")
        .unwrap();
    assert_eq!(sber.price, Some(250.0));
    assert_eq!(sber.total_price, Some(2500.0));
    assert_eq!(tracker.summary().exchange_value, 2500.0);

    tracker.refresh_prices().await;
    assert_eq!(tracker.summary().exchange_value, 2600.0);
}

#[tokio::test]
async fn edits_survive_restart() {
    let dir = TempDir::new().unwrap();
    {
        let tracker = tracker_with_quotes(&dir, &[("LKOH", 7000.0, 0.5)]);
        tracker.load().await.unwrap();
        tracker.unified().add_deposit(savings(5000.0)).await.unwrap();
        tracker
            .unified()
            .add_exchange(share("Lukoil", "LKOH", "Shares", 1.0))
            .await
            .unwrap();
        tracker.refresh_prices().await;

        let deposit_id = tracker.deposits().items()[0].id.clone();
        let asset_id = tracker.exchange().items()[0].id.clone();
        tracker.unified().adjust_deposit_amount(&deposit_id, 2500.0).await.unwrap();
        let updated = tracker
            .unified()
            .update_exchange_quantity(&asset_id, 3.0)
            .await
            .unwrap();
        assert_eq!(updated.total_price, Some(21000.0));
    }

    let reopened = PortfolioTracker::new(local_settings(&dir)).unwrap();
    reopened.load().await.unwrap();

    assert_eq!(reopened.deposits().items()[0].amount, 7500.0);
    assert_eq!(reopened.exchange().items()[0].quantity, 3.0);
}

#[tokio::test]
async fn removal_is_scoped_to_kind() {
    let dir = TempDir::new().unwrap();
    let tracker = tracker_with_quotes(&dir, &[]);
    tracker.unified().add_deposit(savings(1000.0)).await.unwrap();
    tracker
        .unified()
        .add_exchange(share("Tatneft", "TATN", "Shares", 2.0))
        .await
        .unwrap();

    let asset_id = tracker.exchange().items()[0].id.clone();
    tracker
        .unified()
        .remove_asset(&asset_id, AssetKind::Exchange)
        .await
        .unwrap();

    assert!(tracker.exchange().is_empty());
    assert_eq!(tracker.deposits().len(), 1);
    assert!(matches!(
        tracker.unified().remove_asset(&asset_id, AssetKind::Exchange).await,
        Err(CoreError::AssetNotFound(_))
    ));
}

#[tokio::test]
async fn load_reports_failure_but_loads_the_other_ledger() {
    let dir = TempDir::new().unwrap();
    let local = LocalBackend::new(LocalStore::new(dir.path()));
    local
        .add_exchange_asset("user-1", &share("Sberbank", "SBER", "Shares", 1.0))
        .await
        .unwrap();

    let settings = local_settings(&dir);
    let market_data = Arc::new(MarketDataService::new(
        Arc::new(FixedQuotes::new(&[])),
        settings.boards.clone(),
    ));
    let api: Arc<dyn BackendApi> = Arc::new(DepositsDown { inner: local });
    let tracker =
        PortfolioTracker::with_components(settings, api, market_data, None, AlertChannel::default());

    let err = tracker.load().await.unwrap_err();

    assert_eq!(err.status(), Some(503));
    assert_eq!(tracker.exchange().len(), 1);
    assert!(tracker.deposits().is_empty());
}
